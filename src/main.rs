use std::sync::Arc;

use espanhol_backend::clock::SystemClock;
use espanhol_backend::config::Config;
use espanhol_backend::logging::{init_tracing, LogConfig};
use espanhol_backend::services::evaluator::SessionEvaluator;
use espanhol_backend::services::push::WebPushProvider;
use espanhol_backend::store::Store;
use espanhol_backend::workers::WorkerManager;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });
    tracing::info!("Starting espanhol-backend");

    // Both providers refuse misconfigured real modes at startup.
    WebPushProvider::validate_config(&config.push);
    SessionEvaluator::validate_config(&config.eval);

    let store = Arc::new(Store::open(&config.sled_path).expect("Failed to open sled database"));
    let push = Arc::new(WebPushProvider::new(&config.push));
    let clock = Arc::new(SystemClock);

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let worker_manager = WorkerManager::new(
        store.clone(),
        push,
        clock,
        shutdown_tx.subscribe(),
        &config,
    );
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker_manager.start().await {
            tracing::error!(error = %e, "Worker manager failed");
        }
    });

    shutdown_signal(shutdown_tx).await;

    if let Err(e) = tokio::time::timeout(std::time::Duration::from_secs(35), worker_handle).await {
        tracing::warn!(error = %e, "Worker manager did not drain in time");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
