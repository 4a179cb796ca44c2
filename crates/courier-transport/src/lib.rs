//! Blob transport sessions and chunked streaming for the Courier gateway.
//!
//! Object bytes live in a remote transport that is partitioned into
//! datacenters. Reading a blob requires an authorized session with the
//! datacenter that owns it:
//!
//! - the home datacenter is authorized directly;
//! - any other datacenter receives an authorization exported from home,
//!   with the import retried while the exported bytes are rejected.
//!
//! [`SessionManager`] owns the datacenter to session map and performs at most
//! one handshake per datacenter. Blobs are read as lazy streams of 1 MiB chunks;
//! multi-part objects concatenate their parts in part-number order.
//!
//! [`MemoryTransport`] is an in-process multi-datacenter backend used for local
//! runs and tests.

pub mod error;
pub mod memory;
pub mod session;
pub mod stream;
pub mod transport;
pub mod types;

pub use error::TransportError;
pub use memory::{MemoryTransport, TransportStats};
pub use session::{SessionConfig, SessionManager};
pub use stream::BlobStream;
pub use transport::{BlobTransport, TransportSession};
pub use types::{BlobRef, CHUNK_SIZE, DatacenterId, ExportedAuthorization, PartRef};
