//! Lazy chunked reads of blobs and multi-part objects.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::session::SessionManager;
use crate::transport::TransportSession;
use crate::types::{BlobRef, CHUNK_SIZE, PartRef};

/// A stream of blob bytes, delivered in chunks of at most [`CHUNK_SIZE`].
pub type BlobStream = BoxStream<'static, Result<Bytes, TransportError>>;

enum ReadState {
    Connect,
    Reading {
        session: Arc<dyn TransportSession>,
        offset: u64,
    },
    Done,
}

impl SessionManager {
    /// Stream the bytes of `blob`.
    ///
    /// Nothing is fetched until the stream is polled. The session for the
    /// blob's datacenter is obtained on the first poll, then chunks are
    /// requested at increasing offsets until an empty or short chunk arrives.
    pub fn read_blob(self: &Arc<Self>, blob: BlobRef) -> BlobStream {
        let manager = Arc::clone(self);
        let blob = Arc::new(blob);

        stream::try_unfold(ReadState::Connect, move |state| {
            let manager = Arc::clone(&manager);
            let blob = Arc::clone(&blob);
            async move {
                let (session, offset) = match state {
                    ReadState::Connect => (manager.session(blob.datacenter()).await?, 0),
                    ReadState::Reading { session, offset } => (session, offset),
                    ReadState::Done => return Ok(None),
                };

                let timeout = manager.config().chunk_timeout;
                let chunk = fetch_chunk(session.as_ref(), &blob, offset, timeout).await?;
                if chunk.is_empty() {
                    return Ok(None);
                }

                let next = if chunk.len() < CHUNK_SIZE {
                    ReadState::Done
                } else {
                    ReadState::Reading {
                        session,
                        offset: offset + chunk.len() as u64,
                    }
                };
                Ok(Some((chunk, next)))
            }
        })
        .boxed()
    }

    /// Stream a multi-part object: every part in ascending part-number order,
    /// one after another.
    pub fn read_parts(self: &Arc<Self>, mut parts: Vec<PartRef>) -> BlobStream {
        parts.sort_by_key(|part| part.part_number);
        let manager = Arc::clone(self);

        stream::iter(parts)
            .map(move |part| manager.read_blob(part.blob))
            .flatten()
            .boxed()
    }
}

async fn fetch_chunk(
    session: &dyn TransportSession,
    blob: &BlobRef,
    offset: u64,
    timeout: Duration,
) -> Result<Bytes, TransportError> {
    debug!(blob = %blob, offset, "Fetching chunk");
    match tokio::time::timeout(timeout, session.get_chunk(blob, offset, CHUNK_SIZE)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(blob = %blob, offset, "Chunk fetch timed out");
            Err(TransportError::Timeout {
                datacenter: blob.datacenter(),
                offset,
            })
        }
    }
}
