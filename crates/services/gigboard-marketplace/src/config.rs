use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the marketplace service, built from the environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP API binds to.
    pub listen_addr: SocketAddr,

    /// Directory for the persisted state snapshot (Sled DB). When absent the
    /// service runs against the in-memory store and loses state on restart.
    pub data_dir: Option<PathBuf>,

    /// Base URL of the payment processor API.
    pub processor_api_base: String,

    /// Secret API key for the payment processor. Checkout session creation
    /// fails with a configuration error when this is missing.
    pub processor_secret_key: Option<String>,

    /// Public origin of the frontend, used to build the success/cancel
    /// redirect URLs handed to the processor.
    pub public_origin: String,

    /// ISO currency code for checkout line items.
    pub currency: String,

    /// Development mode: error responses include a debug representation.
    pub development: bool,

    /// Optional log level string (e.g. "info", "gigboard_marketplace=debug").
    pub log_level: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let listen_addr = env::var("LISTEN_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        Self {
            listen_addr,
            data_dir: env::var("DATA_DIR").ok().map(PathBuf::from),
            processor_api_base: env::var("PROCESSOR_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            processor_secret_key: env::var("PROCESSOR_SECRET_KEY").ok(),
            public_origin: env::var("PUBLIC_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            currency: env::var("CHECKOUT_CURRENCY").unwrap_or_else(|_| "inr".to_string()),
            development: env::var("DEV_MODE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            log_level: env::var("LOG_LEVEL").ok(),
        }
    }
}
