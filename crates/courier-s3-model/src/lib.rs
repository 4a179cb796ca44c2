//! S3 error codes, operations and typed result records for the Courier gateway.
//!
//! The records in [`output`] are rendered to the wire by `courier-s3-xml` and
//! turned into HTTP responses by `courier-s3-http`.

pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use error::{S3Error, S3ErrorCode};
pub use operations::S3Operation;
