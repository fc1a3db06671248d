use gigboard_marketplace::{
    create_app, error, InMemoryStore, MarketplaceStore, ServiceConfig, SledSnapshotStore,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Arc::new(ServiceConfig::from_env());

    let default_filter = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
    error::set_dev_mode(config.development);

    let store: Arc<dyn MarketplaceStore> = match &config.data_dir {
        Some(dir) => Arc::new(SledSnapshotStore::open(dir)?),
        None => {
            tracing::warn!("DATA_DIR not set; state is in-memory and lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let app = create_app(store, config.clone());

    tracing::info!(
        "Gigboard marketplace service listening on {}",
        config.listen_addr
    );
    axum::Server::bind(&config.listen_addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
