//! Metadata records and the store that holds them.
//!
//! Object bytes never live here: records carry [`courier_transport::BlobRef`]s
//! pointing into the blob transport.

pub mod memory;
pub mod records;
pub mod store;

pub use memory::MemoryMetadataStore;
pub use records::{Bucket, ObjectRecord, Part, User};
pub use store::{CompletedUpload, DeclaredPart, ListQuery, MetadataStore, ObjectPage};
