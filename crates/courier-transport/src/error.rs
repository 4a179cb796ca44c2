//! Transport error types.

use crate::types::DatacenterId;

/// Errors raised by the blob transport and the session manager.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The target datacenter rejected imported authorization bytes.
    #[error("authorization bytes rejected")]
    AuthBytesInvalid,

    /// Every authorization import attempt was rejected.
    #[error("authorization handshake with datacenter {datacenter} failed after {attempts} attempts")]
    HandshakeExhausted {
        /// The datacenter being authorized.
        datacenter: DatacenterId,
        /// How many imports were attempted.
        attempts: usize,
    },

    /// The session is not authorized for the requested operation.
    #[error("session for datacenter {0} is not authorized")]
    Unauthorized(DatacenterId),

    /// The datacenter is not known to the transport.
    #[error("unknown datacenter {0}")]
    UnknownDatacenter(DatacenterId),

    /// The blob reference could not be parsed.
    #[error("invalid blob reference: {0}")]
    InvalidBlobRef(String),

    /// The blob does not exist.
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    /// A chunk fetch did not complete in time.
    #[error("chunk fetch at offset {offset} from datacenter {datacenter} timed out")]
    Timeout {
        /// Datacenter the chunk was requested from.
        datacenter: DatacenterId,
        /// Offset of the requested chunk.
        offset: u64,
    },

    /// Any other backend failure.
    #[error("transport failure: {0}")]
    Backend(String),
}

impl TransportError {
    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AuthBytesInvalid | Self::Timeout { .. } | Self::Backend(_)
        )
    }
}

impl From<TransportError> for std::io::Error {
    fn from(err: TransportError) -> Self {
        let kind = match err {
            TransportError::Timeout { .. } => std::io::ErrorKind::TimedOut,
            TransportError::BlobNotFound(_) => std::io::ErrorKind::NotFound,
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}
