use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::history::HistoryStore;

const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Background sweep of the history store: sleep 24 hours, evict expired
/// entries, repeat. Nothing short of shutdown stops the loop; a failed
/// sweep is logged and the next one still runs.
pub struct CleanupTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CleanupTask {
    pub fn spawn(store: Arc<HistoryStore>) -> Self {
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!("Started automatic history cleanup (every 24h)");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
                    _ = stopped.changed() => {
                        info!("History cleanup task stopping");
                        return;
                    }
                }

                let store = store.clone();
                match tokio::task::spawn_blocking(move || store.evict_expired(Utc::now())).await {
                    Ok(removed) => info!("Cleanup sweep evicted {} entries", removed),
                    Err(e) => error!("Cleanup sweep panicked: {}", e),
                }
            }
        });

        Self { stop, handle }
    }

    /// Graceful stop: wakes the task out of its sleep and waits for it.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }
}
