use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use kittentts_web::cleanup::CleanupTask;
use kittentts_web::history::HistoryStore;

#[tokio::test]
async fn shutdown_stops_the_sweep_before_its_first_sleep_completes() {
    let dir = tempdir().unwrap();
    let store = Arc::new(HistoryStore::open(dir.path(), 10, 7, 200).unwrap());

    let task = CleanupTask::spawn(store);
    // The loop sleeps 24h between sweeps; a graceful shutdown must not wait
    // for that sleep to finish.
    tokio::time::timeout(Duration::from_secs(5), task.shutdown())
        .await
        .expect("cleanup task did not stop promptly");
}
