//! S3 service implementation for the Courier gateway.
//!
//! Courier speaks enough of the S3 protocol for common SDKs and CLIs while
//! keeping object bytes in a datacenter-partitioned blob transport. This crate
//! holds the S3 semantics: bucket ownership and visibility, object writes and
//! reads, multipart uploads with S3-compatible ETags, and the metadata store
//! that records them.
//!
//! # Architecture
//!
//! ```text
//! courier-s3-http (routing, XML, SigV4)
//!        |
//!        v
//!   CourierS3 (handle_* operations)
//!      |                  |
//!      v                  v
//! MetadataStore     SessionManager (courier-transport)
//! ```

pub mod auth;
pub mod checksums;
pub mod config;
pub mod error;
mod ops;
pub mod provider;
pub mod reaper;
pub mod sniff;
pub mod state;
pub mod utils;
pub mod validation;

pub use config::CourierConfig;
pub use error::{S3ServiceError, S3ServiceResult};
pub use provider::CourierS3;
pub use reaper::spawn_upload_reaper;
