//! In-process, multi-datacenter blob transport.
//!
//! Blobs are spread round-robin across the configured datacenters, so a local
//! gateway exercises the same cross-datacenter handshake a real backend needs.
//! The transport can also be told to reject authorization imports or to fail
//! and stall chunk fetches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{BlobTransport, TransportSession};
use crate::types::{BlobRef, DatacenterId, ExportedAuthorization};

/// Snapshot of how often the transport was asked to do things.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Sessions opened, home included.
    pub connects: usize,
    /// Authorizations exported.
    pub exports: usize,
    /// Authorization imports attempted.
    pub imports: usize,
    /// Chunk requests served or failed.
    pub chunk_fetches: usize,
    /// Sessions stopped.
    pub stopped_sessions: usize,
}

/// Shared-state in-memory transport. Clones observe the same blobs.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use courier_transport::{BlobTransport, MemoryTransport};
///
/// # tokio_test::block_on(async {
/// let transport = MemoryTransport::new(1, [1, 2]);
/// let blob = transport.send_blob(Bytes::from("hello")).await.unwrap();
/// assert!(transport.contains(&blob));
///
/// transport.delete_blobs(&[blob.clone()]).await.unwrap();
/// assert!(!transport.contains(&blob));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    home: DatacenterId,
    datacenters: Vec<DatacenterId>,
    blobs: DashMap<String, (DatacenterId, Bytes)>,
    exports: DashMap<i64, DatacenterId>,
    next_export_id: AtomicI64,
    next_placement: AtomicUsize,
    rejected_imports: DashMap<DatacenterId, usize>,
    fail_next_chunk: AtomicBool,
    chunk_delay: Mutex<Duration>,
    connects: AtomicUsize,
    exports_issued: AtomicUsize,
    imports: AtomicUsize,
    chunk_fetches: AtomicUsize,
    stopped_sessions: AtomicUsize,
}

impl MemoryTransport {
    /// Create a transport whose account lives in `home`, spanning `datacenters`.
    /// The home datacenter is always part of the set.
    pub fn new(home: DatacenterId, datacenters: impl IntoIterator<Item = DatacenterId>) -> Self {
        let mut datacenters: Vec<_> = datacenters.into_iter().collect();
        if !datacenters.contains(&home) {
            datacenters.push(home);
        }
        datacenters.sort_unstable();
        datacenters.dedup();

        Self {
            inner: Arc::new(Inner {
                home,
                datacenters,
                blobs: DashMap::new(),
                exports: DashMap::new(),
                next_export_id: AtomicI64::new(1),
                next_placement: AtomicUsize::new(0),
                rejected_imports: DashMap::new(),
                fail_next_chunk: AtomicBool::new(false),
                chunk_delay: Mutex::new(Duration::ZERO),
                connects: AtomicUsize::new(0),
                exports_issued: AtomicUsize::new(0),
                imports: AtomicUsize::new(0),
                chunk_fetches: AtomicUsize::new(0),
                stopped_sessions: AtomicUsize::new(0),
            }),
        }
    }

    /// The datacenters this transport spans, in ascending order.
    #[must_use]
    pub fn datacenters(&self) -> &[DatacenterId] {
        &self.inner.datacenters
    }

    /// Store `data` in a specific datacenter.
    pub fn send_blob_to(&self, datacenter: DatacenterId, data: Bytes) -> BlobRef {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.inner.blobs.insert(id.clone(), (datacenter, data));
        BlobRef::new(datacenter, id)
    }

    /// Whether `blob` is still stored.
    #[must_use]
    pub fn contains(&self, blob: &BlobRef) -> bool {
        self.inner.blobs.contains_key(blob.id())
    }

    /// Number of blobs stored.
    #[must_use]
    pub fn blob_count(&self) -> usize {
        self.inner.blobs.len()
    }

    /// Reject the next `count` authorization imports into `datacenter`.
    pub fn reject_imports(&self, datacenter: DatacenterId, count: usize) {
        self.inner.rejected_imports.insert(datacenter, count);
    }

    /// Fail the next chunk request with a backend error.
    pub fn fail_next_chunk(&self) {
        self.inner.fail_next_chunk.store(true, Ordering::SeqCst);
    }

    /// Delay every chunk request by `delay`.
    pub fn set_chunk_delay(&self, delay: Duration) {
        *self.inner.chunk_delay.lock() = delay;
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        let inner = &self.inner;
        TransportStats {
            connects: inner.connects.load(Ordering::SeqCst),
            exports: inner.exports_issued.load(Ordering::SeqCst),
            imports: inner.imports.load(Ordering::SeqCst),
            chunk_fetches: inner.chunk_fetches.load(Ordering::SeqCst),
            stopped_sessions: inner.stopped_sessions.load(Ordering::SeqCst),
        }
    }

    fn check_datacenter(&self, datacenter: DatacenterId) -> Result<(), TransportError> {
        if self.inner.datacenters.contains(&datacenter) {
            Ok(())
        } else {
            Err(TransportError::UnknownDatacenter(datacenter))
        }
    }

    fn open_session(&self, datacenter: DatacenterId, authorized: bool) -> Arc<dyn TransportSession> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Arc::new(MemorySession {
            datacenter,
            authorized: AtomicBool::new(authorized),
            stopped: AtomicBool::new(false),
            inner: Arc::clone(&self.inner),
        })
    }
}

#[async_trait]
impl BlobTransport for MemoryTransport {
    fn home_datacenter(&self) -> DatacenterId {
        self.inner.home
    }

    async fn send_blob(&self, data: Bytes) -> Result<BlobRef, TransportError> {
        let slot = self.inner.next_placement.fetch_add(1, Ordering::SeqCst);
        let datacenter = self.inner.datacenters[slot % self.inner.datacenters.len()];
        let blob = self.send_blob_to(datacenter, data);
        debug!(blob = %blob, "Stored blob");
        Ok(blob)
    }

    async fn delete_blobs(&self, blobs: &[BlobRef]) -> Result<(), TransportError> {
        for blob in blobs {
            self.inner.blobs.remove(blob.id());
        }
        Ok(())
    }

    async fn connect_home(&self) -> Result<Arc<dyn TransportSession>, TransportError> {
        Ok(self.open_session(self.inner.home, true))
    }

    async fn connect(
        &self,
        datacenter: DatacenterId,
    ) -> Result<Arc<dyn TransportSession>, TransportError> {
        self.check_datacenter(datacenter)?;
        Ok(self.open_session(datacenter, datacenter == self.inner.home))
    }

    async fn export_authorization(
        &self,
        datacenter: DatacenterId,
    ) -> Result<ExportedAuthorization, TransportError> {
        self.check_datacenter(datacenter)?;
        self.inner.exports_issued.fetch_add(1, Ordering::SeqCst);

        let id = self.inner.next_export_id.fetch_add(1, Ordering::SeqCst);
        self.inner.exports.insert(id, datacenter);
        Ok(ExportedAuthorization {
            id,
            bytes: Bytes::from(format!("auth:{}:{datacenter}:{id}", self.inner.home)),
        })
    }
}

#[derive(Debug)]
struct MemorySession {
    datacenter: DatacenterId,
    authorized: AtomicBool,
    stopped: AtomicBool,
    inner: Arc<Inner>,
}

impl MemorySession {
    fn take_rejection(&self) -> bool {
        match self.inner.rejected_imports.get_mut(&self.datacenter) {
            Some(mut remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl TransportSession for MemorySession {
    fn datacenter(&self) -> DatacenterId {
        self.datacenter
    }

    async fn import_authorization(
        &self,
        authorization: ExportedAuthorization,
    ) -> Result<(), TransportError> {
        self.inner.imports.fetch_add(1, Ordering::SeqCst);

        let exported_for = self
            .inner
            .exports
            .remove(&authorization.id)
            .map(|(_, datacenter)| datacenter);
        if self.take_rejection() || exported_for != Some(self.datacenter) {
            return Err(TransportError::AuthBytesInvalid);
        }

        self.authorized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_chunk(
        &self,
        blob: &BlobRef,
        offset: u64,
        limit: usize,
    ) -> Result<Bytes, TransportError> {
        self.inner.chunk_fetches.fetch_add(1, Ordering::SeqCst);

        if self.stopped.load(Ordering::SeqCst) {
            return Err(TransportError::Backend(format!(
                "session for datacenter {} is stopped",
                self.datacenter
            )));
        }
        if !self.authorized.load(Ordering::SeqCst) {
            return Err(TransportError::Unauthorized(self.datacenter));
        }

        let delay = *self.inner.chunk_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.inner.fail_next_chunk.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Backend("chunk request failed".to_owned()));
        }

        let data = match self.inner.blobs.get(blob.id()) {
            Some(entry) if entry.0 == self.datacenter => entry.1.clone(),
            _ => return Err(TransportError::BlobNotFound(blob.to_string())),
        };

        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let end = start.saturating_add(limit).min(data.len());
        Ok(data.slice(start..end))
    }

    async fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.inner.stopped_sessions.fetch_add(1, Ordering::SeqCst);
        }
    }
}
