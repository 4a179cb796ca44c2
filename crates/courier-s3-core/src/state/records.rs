//! Persisted records: users, buckets, objects and their parts.

use chrono::{DateTime, Utc};
use courier_transport::{BlobRef, PartRef};

/// An account allowed to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Access key id used in SigV4 credentials.
    pub id: String,
    /// Optional display name.
    pub name: Option<String>,
    /// SigV4 secret.
    pub secret_key: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// A bucket. Names are unique across all owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
    /// Id of the owning user.
    pub owner: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether anonymous callers and other users may read objects.
    pub public: bool,
}

impl Bucket {
    /// Create a public bucket owned by `owner`.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            created_at: Utc::now(),
            public: true,
        }
    }

    /// Whether `user_id` owns this bucket.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner == user_id
    }
}

/// One stored piece of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part number; single-part objects use 1.
    pub part_number: u32,
    /// Where the bytes live.
    pub blob: BlobRef,
    /// Length in bytes.
    pub size: u64,
    /// Unquoted MD5 hex of the part's bytes.
    pub etag: String,
}

/// An object, or an in-flight multipart upload when `upload_id` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Owning bucket.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Id of the user that wrote the object.
    pub owner: String,
    /// Creation time; for uploads, the time the upload was initiated.
    pub created_at: DateTime<Utc>,
    /// Total size of all parts.
    pub size: u64,
    /// Detected MIME type.
    pub mime_type: Option<String>,
    /// ETag material: an MD5 hex, or `<hex>-<count>` for multipart objects.
    pub hash: Option<String>,
    /// Stored parts, ascending by part number.
    pub parts: Vec<Part>,
    /// Set while the record is an unfinished multipart upload.
    pub upload_id: Option<String>,
}

impl ObjectRecord {
    /// A fresh, empty multipart upload.
    pub fn new_upload(
        bucket: impl Into<String>,
        key: impl Into<String>,
        owner: impl Into<String>,
        upload_id: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            owner: owner.into(),
            created_at: Utc::now(),
            size: 0,
            mime_type: None,
            hash: None,
            parts: Vec::new(),
            upload_id: Some(upload_id.into()),
        }
    }

    /// Whether this record is an unfinished multipart upload.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.upload_id.is_some()
    }

    /// Blob references of every part.
    #[must_use]
    pub fn blobs(&self) -> Vec<BlobRef> {
        self.parts.iter().map(|p| p.blob.clone()).collect()
    }

    /// Part references for streaming the object's content.
    #[must_use]
    pub fn part_refs(&self) -> Vec<PartRef> {
        self.parts
            .iter()
            .map(|p| PartRef {
                part_number: p.part_number,
                blob: p.blob.clone(),
            })
            .collect()
    }
}
