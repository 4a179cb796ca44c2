//! Identifiers exchanged with the blob transport.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::TransportError;

/// Size of every chunk request. A shorter chunk marks the end of a blob.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Identifier of a backend partition.
pub type DatacenterId = u32;

/// Reference to a stored blob: the owning datacenter and the backend's blob id.
///
/// The textual form `"<datacenter>:<id>"` is what the metadata store persists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef {
    datacenter: DatacenterId,
    id: String,
}

impl BlobRef {
    /// Create a reference to blob `id` stored in `datacenter`.
    pub fn new(datacenter: DatacenterId, id: impl Into<String>) -> Self {
        Self {
            datacenter,
            id: id.into(),
        }
    }

    /// The datacenter that owns this blob.
    #[must_use]
    pub fn datacenter(&self) -> DatacenterId {
        self.datacenter
    }

    /// The backend's blob id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.datacenter, self.id)
    }
}

impl FromStr for BlobRef {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dc, id) = s
            .split_once(':')
            .ok_or_else(|| TransportError::InvalidBlobRef(s.to_owned()))?;
        let datacenter = dc
            .parse()
            .map_err(|_| TransportError::InvalidBlobRef(s.to_owned()))?;
        if id.is_empty() {
            return Err(TransportError::InvalidBlobRef(s.to_owned()));
        }
        Ok(Self::new(datacenter, id))
    }
}

/// A blob that forms one part of a multi-part object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRef {
    /// Part number; parts are read in ascending order.
    pub part_number: u32,
    /// Where the part's bytes live.
    pub blob: BlobRef,
}

/// Authorization exported from the home datacenter for another datacenter.
#[derive(Clone)]
pub struct ExportedAuthorization {
    /// Backend identifier of the exported authorization.
    pub id: i64,
    /// Opaque authorization bytes.
    pub bytes: Bytes,
}

impl fmt::Debug for ExportedAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedAuthorization")
            .field("id", &self.id)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}
