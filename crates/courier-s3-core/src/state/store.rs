//! The metadata store interface used by the handlers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::records::{Bucket, ObjectRecord, Part, User};
use crate::error::StoreError;

/// Window of a key listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only keys starting with this prefix.
    pub prefix: String,
    /// Only keys sorting after this one.
    pub marker: String,
    /// Maximum number of records to return.
    pub max_keys: usize,
}

/// One page of a key listing, in lexicographic key order.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Complete objects in the window.
    pub objects: Vec<ObjectRecord>,
    /// Whether more keys follow the page.
    pub is_truncated: bool,
}

/// A part the client named when completing an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredPart {
    /// Part number.
    pub part_number: u32,
    /// Unquoted MD5 hex the client expects the stored part to have.
    pub etag: String,
}

/// Outcome of committing a multipart upload.
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    /// The now-complete object.
    pub object: ObjectRecord,
    /// The complete object it replaced, if any.
    pub superseded: Option<ObjectRecord>,
    /// Uploaded parts the client did not declare.
    pub dropped_parts: Vec<Part>,
}

/// Record storage for users, buckets and objects.
///
/// Every method is a single atomic step: implementations must not expose
/// intermediate states such as an identity with no object or two objects.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    /// Look up a user by access key id.
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Insert or replace a user.
    async fn put_user(&self, user: User) -> Result<(), StoreError>;

    /// Insert a bucket unless the name is taken by any owner.
    async fn create_bucket(&self, bucket: Bucket) -> Result<(), StoreError>;

    /// Look up a bucket by name.
    async fn find_bucket(&self, name: &str) -> Result<Option<Bucket>, StoreError>;

    /// Buckets owned by `owner`, sorted by name.
    async fn list_buckets(&self, owner: &str) -> Result<Vec<Bucket>, StoreError>;

    /// Set a bucket's public flag.
    async fn set_bucket_public(&self, name: &str, public: bool) -> Result<(), StoreError>;

    /// Delete an empty bucket. Returns `false` if it did not exist.
    ///
    /// Objects and in-flight uploads both make a bucket non-empty.
    async fn delete_bucket(&self, name: &str) -> Result<bool, StoreError>;

    /// Look up a complete object.
    async fn find_object(&self, bucket: &str, key: &str)
    -> Result<Option<ObjectRecord>, StoreError>;

    /// List complete objects of a bucket.
    async fn list_objects(&self, bucket: &str, query: &ListQuery)
    -> Result<ObjectPage, StoreError>;

    /// Store a complete object, replacing any object with the same identity.
    /// Returns the replaced object.
    async fn replace_object(
        &self,
        object: ObjectRecord,
    ) -> Result<Option<ObjectRecord>, StoreError>;

    /// Delete a complete object. Returns the deleted record.
    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectRecord>, StoreError>;

    /// Register a new upload, superseding older uploads of the same identity.
    /// Returns the superseded uploads.
    async fn create_upload(&self, upload: ObjectRecord) -> Result<Vec<ObjectRecord>, StoreError>;

    /// Look up an in-flight upload.
    async fn find_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Option<ObjectRecord>, StoreError>;

    /// Add a part to an upload, growing its size. A part with the same number
    /// is replaced and returned. Part 1 also sets the upload's MIME type.
    async fn append_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part: Part,
        mime_type: Option<String>,
    ) -> Result<Option<Part>, StoreError>;

    /// Turn an upload into a complete object made of the declared parts.
    ///
    /// Fails with [`StoreError::PartMismatch`] when a declared part was never
    /// uploaded or its ETag differs from the stored one.
    async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        declared: &[DeclaredPart],
        hash: String,
    ) -> Result<CompletedUpload, StoreError>;

    /// Remove an upload. Returns the removed record.
    async fn remove_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Option<ObjectRecord>, StoreError>;

    /// Uploads initiated before `cutoff`.
    async fn stale_uploads(&self, cutoff: DateTime<Utc>) -> Result<Vec<ObjectRecord>, StoreError>;
}
