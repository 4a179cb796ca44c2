//! Typed results of S3 operations.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::types::{BucketEntry, ObjectEntry, Owner};

/// Lazily produced object content. An `Err` item aborts the response.
pub type ObjectBody = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Result of `ListBuckets`, rendered as `ListAllMyBucketsResult`.
#[derive(Debug, Clone, Default)]
pub struct ListBucketsOutput {
    /// The caller.
    pub owner: Owner,
    /// Buckets owned by the caller.
    pub buckets: Vec<BucketEntry>,
}

/// Result of `ListObjects`, rendered as `ListBucketResult`.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsOutput {
    /// Bucket name.
    pub name: String,
    /// Requested prefix, empty when absent.
    pub prefix: String,
    /// Requested marker, empty when absent.
    pub marker: String,
    /// Effective page size.
    pub max_keys: u32,
    /// Whether more keys follow this page.
    pub is_truncated: bool,
    /// `url` when keys were percent-encoded.
    pub encoding_type: Option<String>,
    /// Objects on this page, ordered by key.
    pub contents: Vec<ObjectEntry>,
}

/// Result of `GetBucketLocation`.
#[derive(Debug, Clone, Default)]
pub struct GetBucketLocationOutput {
    /// The location constraint text.
    pub location_constraint: String,
}

/// Result of `GetBucketVersioning`. Versioning is never enabled.
#[derive(Debug, Clone, Default)]
pub struct GetBucketVersioningOutput {
    /// Always `Disabled`.
    pub status: String,
}

/// Result of `PutObject`.
#[derive(Debug, Clone, Default)]
pub struct PutObjectOutput {
    /// Unquoted MD5 hex of the stored bytes.
    pub etag: String,
}

/// Result of `UploadPart`.
#[derive(Debug, Clone, Default)]
pub struct UploadPartOutput {
    /// Unquoted MD5 hex of the part.
    pub etag: String,
}

/// Result of `CreateMultipartUpload`.
#[derive(Debug, Clone, Default)]
pub struct CreateMultipartUploadOutput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// The new upload identifier.
    pub upload_id: String,
}

/// Result of `CompleteMultipartUpload`.
#[derive(Debug, Clone, Default)]
pub struct CompleteMultipartUploadOutput {
    /// `/{bucket}/{key}`.
    pub location: String,
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Unquoted composite ETag (`<hex>-<count>`).
    pub etag: String,
}

/// Metadata shared by `GetObject` and `HeadObject`.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    /// Object key.
    pub key: String,
    /// Size in bytes.
    pub content_length: u64,
    /// Stored or default MIME type.
    pub content_type: String,
    /// Unquoted entity tag.
    pub etag: String,
    /// When the object was last written.
    pub last_modified: DateTime<Utc>,
}

impl ObjectMetadata {
    /// The `Content-Disposition` value, or `None` for inline types (`image/*`, `text/*`).
    #[must_use]
    pub fn content_disposition(&self) -> Option<String> {
        let inline = self.content_type.starts_with("image/") || self.content_type.starts_with("text/");
        if inline {
            return None;
        }
        let filename = self.key.rsplit('/').next().unwrap_or(&self.key);
        Some(format!("attachment; filename={filename}"))
    }
}

/// Result of `HeadObject`.
#[derive(Debug, Clone)]
pub struct HeadObjectOutput {
    /// The object's metadata.
    pub metadata: ObjectMetadata,
}

/// Result of `GetObject`.
pub struct GetObjectOutput {
    /// Object metadata for the response headers.
    pub metadata: ObjectMetadata,
    /// The object content.
    pub body: ObjectBody,
}

impl std::fmt::Debug for GetObjectOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetObjectOutput")
            .field("metadata", &self.metadata)
            .field("body", &"<stream>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(key: &str, content_type: &str) -> ObjectMetadata {
        ObjectMetadata {
            key: key.to_owned(),
            content_length: 3,
            content_type: content_type.to_owned(),
            etag: "acbd18db4cc2f85cedef654fccc4a4d8".to_owned(),
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn test_should_attach_binary_content_with_last_segment_filename() {
        let meta = metadata("docs/2024/report.pdf", "application/pdf");
        assert_eq!(
            meta.content_disposition().as_deref(),
            Some("attachment; filename=report.pdf")
        );
    }

    #[test]
    fn test_should_serve_images_and_text_inline() {
        assert!(metadata("cat.png", "image/png").content_disposition().is_none());
        assert!(metadata("notes.txt", "text/plain").content_disposition().is_none());
    }
}
