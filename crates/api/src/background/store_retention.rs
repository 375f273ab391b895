//! Periodic eviction of expired job and batch records.
//!
//! Reads treat expired entries as absent already; this task reclaims the
//! memory behind them. Runs on a fixed interval using
//! `tokio::time::interval` until the cancellation token is triggered.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use quill_store::MemoryStore;

/// Run the store retention sweep loop.
pub async fn run(store: Arc<MemoryStore>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Store retention sweep started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Store retention sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::info!(purged, "Store retention: evicted expired records");
                } else {
                    tracing::debug!("Store retention: nothing to evict");
                }
            }
        }
    }
}
