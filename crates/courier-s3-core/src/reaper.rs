//! Background removal of abandoned multipart uploads.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{S3ServiceError, S3ServiceResult};
use crate::provider::CourierS3;

impl CourierS3 {
    /// Discard uploads started more than the configured TTL ago.
    ///
    /// Returns how many uploads were removed.
    pub async fn purge_stale_uploads(&self) -> S3ServiceResult<usize> {
        let ttl = chrono::Duration::from_std(self.config.upload_ttl())
            .map_err(|e| S3ServiceError::Internal(e.into()))?;
        let cutoff = Utc::now() - ttl;

        let mut purged = 0;
        for stale in self.store.stale_uploads(cutoff).await? {
            let Some(upload_id) = stale.upload_id.as_deref() else {
                continue;
            };
            // The upload may have completed since it was listed.
            if let Some(removed) = self
                .store
                .remove_upload(&stale.bucket, &stale.key, upload_id)
                .await?
            {
                self.discard_blobs(removed.blobs()).await;
                purged += 1;
            }
        }
        if purged > 0 {
            info!(purged, "Purged stale multipart uploads");
        }
        Ok(purged)
    }
}

/// Run [`CourierS3::purge_stale_uploads`] every sweep interval until the task is aborted.
pub fn spawn_upload_reaper(provider: Arc<CourierS3>) -> JoinHandle<()> {
    let period = provider.config().upload_sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = provider.purge_stale_uploads().await {
                error!(error = %e, "Stale upload sweep failed");
            }
        }
    })
}
