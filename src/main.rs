use std::error::Error;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use kittentts_web::cleanup::CleanupTask;
use kittentts_web::engines;
use kittentts_web::history::HistoryStore;
use kittentts_web::registry::EngineRegistry;
use kittentts_web::server::{self, AppState};
use kittentts_web::settings::SETTINGS;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let (addr, storage_root, max_files, cleanup_days, preview_chars, default_engine) = {
        let settings = SETTINGS.read().expect("Settings poisoned");
        (
            format!("{}:{}", settings.host, settings.port),
            settings.storage_root(),
            settings.max_history_files,
            settings.cleanup_days,
            settings.preview_chars,
            settings.default_engine.clone(),
        )
    };

    let registry = Arc::new(EngineRegistry::register_all(
        engines::default_candidates(),
        &default_engine,
    ));
    if registry.is_empty() {
        // Should not happen: the placeholder engines have no dependencies.
        return Err("No TTS engine could be registered".into());
    }

    let history = Arc::new(HistoryStore::open(
        storage_root,
        max_files,
        cleanup_days,
        preview_chars,
    )?);

    let cleanup = if cleanup_days > 0 {
        Some(CleanupTask::spawn(history.clone()))
    } else {
        info!("Timed history eviction disabled (cleanup_days <= 0)");
        None
    };

    let app = server::router(AppState { registry, history });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("kittentts-web listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    if let Some(cleanup) = cleanup {
        cleanup.shutdown().await;
    }

    Ok(())
}
