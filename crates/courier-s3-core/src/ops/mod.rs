//! S3 operation handlers.
//!
//! Each submodule exposes `handle_*` methods on [`crate::CourierS3`]. A handler
//! receives the authenticated caller, or `None` for an anonymous request, and
//! the typed input extracted by the HTTP layer.
//!
//! The server binary bridges these handlers to the HTTP layer by implementing
//! the `S3Handler` trait from `courier-s3-http`.

pub mod bucket;
pub mod list;
pub mod multipart;
pub mod object;

