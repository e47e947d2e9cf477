pub mod adapters;
pub mod app;
pub mod config;
pub mod ports;
pub mod push;
pub mod state;
pub mod store;
pub mod types;

pub use app::app;
pub use push::generate_vapid_credentials;

use ports::StoreError;
use store::{FileSubscriptionStore, MemorySubscriptionStore};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to open subscription store: {0}")]
    Store(#[from] StoreError),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn serve(config: config::AppConfig) -> Result<(), ServeError> {
    let addr = config.bind;
    info!(app = %config.app_name, "starting");
    let sender = push::maybe_sender(&config);
    let router = match config.store_path.clone() {
        Some(path) => {
            let store = FileSubscriptionStore::open(path).await?;
            info!(path = %store.path().display(), "using durable subscription store");
            app(config, store, sender)
        }
        None => {
            info!("using in-memory subscription store");
            app(config, MemorySubscriptionStore::default(), sender)
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
