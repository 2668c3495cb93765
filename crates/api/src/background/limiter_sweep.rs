//! Periodic removal of elapsed rate-limit buckets.
//!
//! Counters reset lazily on the next hit, so this only bounds memory for
//! subjects that never come back.

use std::time::Duration;

use guildhall_core::rate_limit::AdmissionController;
use tokio_util::sync::CancellationToken;

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(limiter: AdmissionController, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Limiter sweep started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Limiter sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let purged = limiter.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(purged, "Limiter sweep: dropped elapsed buckets");
                }
            }
        }
    }
}
