mod config;
mod dedup;
mod discord;
mod map;
mod models;
mod poller;
mod store;

use anyhow::Result;
use livemap::georss::Client;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::discord::Notifier;
use crate::map::SnapshotClient;
use crate::poller::Watcher;
use crate::store::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    info!(bbox = ?config.bbox, env = %config.waze_env, "starting police alert watcher");

    let snapshots = SnapshotClient::new(config.mapbox_token.clone(), config.image_dir.clone());
    let watcher = Watcher::new(
        Client::new(config.waze_env),
        config.bbox,
        snapshots.clone(),
        Notifier::new(config.webhook_url.clone()),
        JsonFileStore::new(config.state_file.clone()),
    );

    tokio::select! {
        () = watcher.run() => {}
        () = shutdown_signal() => {
            info!("interrupt received, clearing snapshot cache");
            snapshots.clear_cache().await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
