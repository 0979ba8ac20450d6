use crate::services::staging::StagingStore;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Periodically removes staged uploads older than `max_age`
pub struct RetentionWorker {
    staging: Arc<dyn StagingStore>,
    max_age: Duration,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl RetentionWorker {
    pub fn new(
        staging: Arc<dyn StagingStore>,
        max_age: Duration,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            staging,
            max_age,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            "🚀 Retention worker started (max age {:?}, every {:?})",
            self.max_age,
            self.interval
        );

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Retention worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.sweep().await;
                }
            }
        }
    }

    /// One pass over the staging directory; returns the number of files removed
    pub async fn sweep(&self) -> usize {
        tracing::debug!("🧹 Sweeping {}", self.staging.root().display());

        match self.staging.purge_older_than(self.max_age).await {
            Ok(0) => 0,
            Ok(removed) => {
                tracing::info!("✅ Removed {} expired staged files", removed);
                removed
            }
            Err(e) => {
                tracing::error!("Failed to sweep staging directory: {}", e);
                0
            }
        }
    }
}
