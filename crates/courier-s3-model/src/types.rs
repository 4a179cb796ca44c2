//! Shared records used by inputs and outputs.

use chrono::{DateTime, Utc};

/// Owner of a bucket or object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    /// The owner's access key identifier.
    pub id: String,
    /// The owner's display name.
    pub display_name: Option<String>,
}

/// A bucket entry in `ListAllMyBucketsResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketEntry {
    /// Bucket name.
    pub name: String,
    /// When the bucket was created.
    pub creation_date: DateTime<Utc>,
}

/// An object entry in `ListBucketResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Object key, already encoded when the listing asked for URL encoding.
    pub key: String,
    /// When the object was last written.
    pub last_modified: DateTime<Utc>,
    /// Unquoted entity tag.
    pub etag: String,
    /// Size in bytes.
    pub size: u64,
    /// Object owner.
    pub owner: Owner,
}

/// One `<Part>` of a `CompleteMultipartUpload` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedPart {
    /// Declared part number.
    pub part_number: Option<u32>,
    /// Declared entity tag, quotes included when the client sent them.
    pub etag: Option<String>,
}

/// The `CompleteMultipartUpload` request document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedMultipartUpload {
    /// Parts in the order the client declared them.
    pub parts: Vec<CompletedPart>,
}

/// The `PublicAccessBlockConfiguration` request document.
///
/// Only `BlockPublicAcls` drives the bucket's public flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicAccessBlockConfiguration {
    /// Value of `BlockPublicAcls`, when present.
    pub block_public_acls: Option<bool>,
    /// Value of `IgnorePublicAcls`, when present.
    pub ignore_public_acls: Option<bool>,
    /// Value of `BlockPublicPolicy`, when present.
    pub block_public_policy: Option<bool>,
    /// Value of `RestrictPublicBuckets`, when present.
    pub restrict_public_buckets: Option<bool>,
}
