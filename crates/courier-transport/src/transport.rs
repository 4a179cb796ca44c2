//! The operations the gateway needs from a blob transport.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::types::{BlobRef, DatacenterId, ExportedAuthorization};

/// A remote blob store partitioned into datacenters.
#[async_trait]
pub trait BlobTransport: Send + Sync + 'static {
    /// The datacenter the gateway's own account lives in.
    fn home_datacenter(&self) -> DatacenterId;

    /// Store `data` and return a reference to it.
    async fn send_blob(&self, data: Bytes) -> Result<BlobRef, TransportError>;

    /// Delete stored blobs. Unknown references are ignored.
    async fn delete_blobs(&self, blobs: &[BlobRef]) -> Result<(), TransportError>;

    /// Open a session with the home datacenter, authorized with the account's own key.
    async fn connect_home(&self) -> Result<Arc<dyn TransportSession>, TransportError>;

    /// Open a fresh, unauthorized session with `datacenter`.
    async fn connect(
        &self,
        datacenter: DatacenterId,
    ) -> Result<Arc<dyn TransportSession>, TransportError>;

    /// Export the home authorization for use with `datacenter`.
    async fn export_authorization(
        &self,
        datacenter: DatacenterId,
    ) -> Result<ExportedAuthorization, TransportError>;
}

/// A session with one datacenter.
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// The datacenter this session talks to.
    fn datacenter(&self) -> DatacenterId;

    /// Import an authorization exported from the home datacenter.
    ///
    /// Returns [`TransportError::AuthBytesInvalid`] when the bytes are rejected.
    async fn import_authorization(
        &self,
        authorization: ExportedAuthorization,
    ) -> Result<(), TransportError>;

    /// Fetch up to `limit` bytes of `blob` starting at `offset`.
    async fn get_chunk(
        &self,
        blob: &BlobRef,
        offset: u64,
        limit: usize,
    ) -> Result<Bytes, TransportError>;

    /// Close the session.
    async fn stop(&self);
}
