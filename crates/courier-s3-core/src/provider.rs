//! The S3 provider.
//!
//! [`CourierS3`] owns the metadata store, the blob session manager and the
//! configuration. Individual operations live in the [`crate::ops`] submodules
//! as `handle_*` methods; the server binary bridges them to the HTTP layer.

use std::collections::BTreeSet;
use std::sync::Arc;

use courier_s3_model::types::Owner;
use courier_transport::{
    BlobRef, BlobTransport, MemoryTransport, SessionConfig, SessionManager,
};
use tracing::{info, warn};

use crate::auth::StoreCredentialProvider;
use crate::config::CourierConfig;
use crate::error::{S3ServiceError, S3ServiceResult};
use crate::state::{Bucket, MemoryMetadataStore, MetadataStore, ObjectRecord, User};

/// The gateway's S3 provider.
///
/// # Examples
///
/// ```
/// use courier_s3_core::{CourierConfig, CourierS3};
///
/// let provider = CourierS3::in_memory(CourierConfig::default());
/// assert_eq!(provider.config().location_constraint, "us-east-1");
/// ```
pub struct CourierS3 {
    pub(crate) store: Arc<dyn MetadataStore>,
    pub(crate) sessions: Arc<SessionManager>,
    pub(crate) config: Arc<CourierConfig>,
}

impl std::fmt::Debug for CourierS3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierS3")
            .field("sessions", &self.sessions)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CourierS3 {
    /// Create a provider over existing backends.
    pub fn new(
        config: CourierConfig,
        store: Arc<dyn MetadataStore>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            store,
            sessions,
            config: Arc::new(config),
        }
    }

    /// Create a provider with an in-memory metadata store and an in-memory
    /// transport spanning the configured datacenters.
    #[must_use]
    pub fn in_memory(config: CourierConfig) -> Self {
        let transport = MemoryTransport::new(config.home_datacenter, config.datacenter_ids());
        let session_config = SessionConfig::builder()
            .chunk_timeout(config.chunk_fetch_timeout())
            .build();
        let sessions = SessionManager::new(Arc::new(transport), session_config);
        Self::new(
            config,
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(sessions),
        )
    }

    /// The metadata store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    /// The blob session manager.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// The provider configuration.
    #[must_use]
    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// A SigV4 credential provider backed by this provider's users.
    #[must_use]
    pub fn credential_provider(&self) -> StoreCredentialProvider {
        StoreCredentialProvider::new(Arc::clone(&self.store))
    }

    /// Insert or replace the user the gateway starts with.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier_s3_core::state::MetadataStore;
    /// use courier_s3_core::{CourierConfig, CourierS3};
    ///
    /// # tokio_test::block_on(async {
    /// let provider = CourierS3::in_memory(CourierConfig::default());
    /// provider.seed_user("admin", "secret", None).await.unwrap();
    /// assert!(provider.store().find_user("admin").await.unwrap().is_some());
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Fails when the metadata store rejects the write.
    pub async fn seed_user(
        &self,
        id: impl Into<String>,
        secret_key: impl Into<String>,
        name: Option<String>,
    ) -> S3ServiceResult<()> {
        let user = User {
            id: id.into(),
            name,
            secret_key: secret_key.into(),
        };
        info!(user = %user.id, "Seeding user");
        self.store.put_user(user).await?;
        Ok(())
    }

    pub(crate) fn transport(&self) -> &Arc<dyn BlobTransport> {
        self.sessions.transport()
    }

    /// Resolve a bucket the caller owns. Buckets owned by someone else are
    /// reported as missing.
    pub(crate) async fn owned_bucket(&self, name: &str, caller: &Owner) -> S3ServiceResult<Bucket> {
        match self.store.find_bucket(name).await? {
            Some(bucket) if bucket.is_owned_by(&caller.id) => Ok(bucket),
            _ => Err(S3ServiceError::NoSuchBucket {
                bucket: name.to_owned(),
            }),
        }
    }

    /// Resolve a complete object the caller may read.
    pub(crate) async fn readable_object(
        &self,
        bucket_name: &str,
        key: &str,
        caller: Option<&Owner>,
    ) -> S3ServiceResult<ObjectRecord> {
        let bucket = self
            .store
            .find_bucket(bucket_name)
            .await?
            .ok_or_else(|| S3ServiceError::NoSuchBucket {
                bucket: bucket_name.to_owned(),
            })?;

        let is_owner = caller.is_some_and(|c| bucket.is_owned_by(&c.id));
        if !bucket.public && !is_owner {
            return Err(S3ServiceError::Forbidden {
                bucket: bucket_name.to_owned(),
            });
        }

        self.store
            .find_object(bucket_name, key)
            .await?
            .ok_or_else(|| S3ServiceError::NoSuchKey {
                key: key.to_owned(),
            })
    }

    /// Establish sessions for every datacenter holding part of `object`.
    pub(crate) async fn prepare_sessions(&self, object: &ObjectRecord) -> S3ServiceResult<()> {
        let datacenters: BTreeSet<_> = object.parts.iter().map(|p| p.blob.datacenter()).collect();
        for datacenter in datacenters {
            self.sessions.session(datacenter).await?;
        }
        Ok(())
    }

    /// Delete blobs that no record references any more. Failures are logged.
    pub(crate) async fn discard_blobs(&self, blobs: Vec<BlobRef>) {
        if blobs.is_empty() {
            return;
        }
        if let Err(e) = self.transport().delete_blobs(&blobs).await {
            warn!(count = blobs.len(), error = %e, "Failed to delete unreferenced blobs");
        }
    }
}

/// Require an authenticated caller.
pub(crate) fn require_caller(caller: Option<&Owner>) -> S3ServiceResult<&Owner> {
    caller.ok_or(S3ServiceError::AccessDenied)
}
