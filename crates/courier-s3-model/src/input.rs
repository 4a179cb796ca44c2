//! Typed inputs of S3 operations, extracted from HTTP requests by `courier-s3-http`.

use bytes::Bytes;

use crate::types::{CompletedMultipartUpload, PublicAccessBlockConfiguration};

/// Input for `CreateBucket`.
#[derive(Debug, Clone, Default)]
pub struct CreateBucketInput {
    /// Bucket name, already lowercased by the router.
    pub bucket: String,
}

/// Input for `PutPublicAccessBlock`.
#[derive(Debug, Clone, Default)]
pub struct PutPublicAccessBlockInput {
    /// Bucket name.
    pub bucket: String,
    /// The parsed configuration document.
    pub configuration: PublicAccessBlockConfiguration,
}

/// Input for `DeleteBucket`.
#[derive(Debug, Clone, Default)]
pub struct DeleteBucketInput {
    /// Bucket name.
    pub bucket: String,
}

/// Input for `GetBucketLocation`.
#[derive(Debug, Clone, Default)]
pub struct GetBucketLocationInput {
    /// Bucket name.
    pub bucket: String,
}

/// Input for `GetBucketVersioning`.
#[derive(Debug, Clone, Default)]
pub struct GetBucketVersioningInput {
    /// Bucket name.
    pub bucket: String,
}

/// Input for `ListObjects`.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsInput {
    /// Bucket name.
    pub bucket: String,
    /// Only keys starting with this prefix are listed.
    pub prefix: Option<String>,
    /// Listing starts after this key.
    pub marker: Option<String>,
    /// Maximum number of keys to return.
    pub max_keys: Option<u32>,
    /// `url` to percent-encode keys in the response.
    pub encoding_type: Option<String>,
}

/// Input for `PutObject`.
#[derive(Debug, Clone, Default)]
pub struct PutObjectInput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object bytes.
    pub body: Bytes,
    /// Base64 `Content-MD5` header.
    pub content_md5: Option<String>,
    /// Client `Content-Type` header.
    pub content_type: Option<String>,
}

/// Input for `UploadPart`.
#[derive(Debug, Clone, Default)]
pub struct UploadPartInput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload the part belongs to.
    pub upload_id: String,
    /// Part number, at least 1.
    pub part_number: u32,
    /// Part bytes.
    pub body: Bytes,
    /// Base64 `Content-MD5` header.
    pub content_md5: Option<String>,
    /// Client `Content-Type` header.
    pub content_type: Option<String>,
}

/// Input for `CreateMultipartUpload`.
#[derive(Debug, Clone, Default)]
pub struct CreateMultipartUploadInput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}

/// Input for `CompleteMultipartUpload`.
#[derive(Debug, Clone, Default)]
pub struct CompleteMultipartUploadInput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload being completed.
    pub upload_id: String,
    /// Parts declared by the client, in request order.
    pub multipart_upload: CompletedMultipartUpload,
}

/// Input for `AbortMultipartUpload`.
#[derive(Debug, Clone, Default)]
pub struct AbortMultipartUploadInput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload being aborted.
    pub upload_id: String,
}

/// Input for `DeleteObject`.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectInput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}

/// Input for `GetObject` and `HeadObject`.
#[derive(Debug, Clone, Default)]
pub struct GetObjectInput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}
