// Expose modules
pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod payment_client;
pub mod sled_store;
pub mod state;
pub mod storage;

// Re-export common types
pub use app::create_app;
pub use config::ServiceConfig;
pub use error::AppError;
pub use payment_client::CheckoutClient;
pub use sled_store::SledSnapshotStore;
pub use state::MarketplaceState;
pub use storage::{InMemoryStore, MarketplaceStore};
