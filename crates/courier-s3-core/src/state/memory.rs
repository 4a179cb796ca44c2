//! In-memory [`MetadataStore`].
//!
//! Each bucket owns its objects and uploads, so every store operation locks
//! exactly one `DashMap` shard entry and is atomic with respect to the others.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::records::{Bucket, ObjectRecord, Part, User};
use super::store::{CompletedUpload, DeclaredPart, ListQuery, MetadataStore, ObjectPage};
use crate::error::StoreError;

#[derive(Debug)]
struct BucketState {
    bucket: Bucket,
    objects: BTreeMap<String, ObjectRecord>,
    uploads: HashMap<String, ObjectRecord>,
}

impl BucketState {
    fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.uploads.is_empty()
    }
}

/// Metadata store kept in process memory.
#[derive(Default)]
pub struct MemoryMetadataStore {
    users: DashMap<String, User>,
    buckets: DashMap<String, BucketState>,
}

impl std::fmt::Debug for MemoryMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMetadataStore")
            .field("user_count", &self.users.len())
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl MemoryMetadataStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn put_user(&self, user: User) -> Result<(), StoreError> {
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn create_bucket(&self, bucket: Bucket) -> Result<(), StoreError> {
        match self.buckets.entry(bucket.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::BucketExists(bucket.name)),
            Entry::Vacant(entry) => {
                debug!(bucket = %bucket.name, owner = %bucket.owner, "Bucket inserted");
                entry.insert(BucketState {
                    bucket,
                    objects: BTreeMap::new(),
                    uploads: HashMap::new(),
                });
                Ok(())
            }
        }
    }

    async fn find_bucket(&self, name: &str) -> Result<Option<Bucket>, StoreError> {
        Ok(self.buckets.get(name).map(|s| s.bucket.clone()))
    }

    async fn list_buckets(&self, owner: &str) -> Result<Vec<Bucket>, StoreError> {
        let mut buckets: Vec<Bucket> = self
            .buckets
            .iter()
            .filter(|s| s.bucket.is_owned_by(owner))
            .map(|s| s.bucket.clone())
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    async fn set_bucket_public(&self, name: &str, public: bool) -> Result<(), StoreError> {
        let mut state = self
            .buckets
            .get_mut(name)
            .ok_or_else(|| StoreError::BucketNotFound(name.to_owned()))?;
        state.bucket.public = public;
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, StoreError> {
        if self.buckets.remove_if(name, |_, s| s.is_empty()).is_some() {
            return Ok(true);
        }
        if self.buckets.contains_key(name) {
            return Err(StoreError::BucketNotEmpty(name.to_owned()));
        }
        Ok(false)
    }

    async fn find_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectRecord>, StoreError> {
        Ok(self
            .buckets
            .get(bucket)
            .and_then(|s| s.objects.get(key).cloned()))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        query: &ListQuery,
    ) -> Result<ObjectPage, StoreError> {
        let state = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_owned()))?;

        let lower = if query.marker.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(query.marker.clone())
        };
        let mut matching = state
            .objects
            .range((lower, Bound::Unbounded))
            .map(|(_, record)| record)
            .filter(|record| record.key.starts_with(&query.prefix));

        let objects: Vec<ObjectRecord> = matching.by_ref().take(query.max_keys).cloned().collect();
        let is_truncated = matching.next().is_some();
        Ok(ObjectPage {
            objects,
            is_truncated,
        })
    }

    async fn replace_object(
        &self,
        object: ObjectRecord,
    ) -> Result<Option<ObjectRecord>, StoreError> {
        let mut state = self
            .buckets
            .get_mut(&object.bucket)
            .ok_or_else(|| StoreError::BucketNotFound(object.bucket.clone()))?;
        Ok(state.objects.insert(object.key.clone(), object))
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectRecord>, StoreError> {
        Ok(self
            .buckets
            .get_mut(bucket)
            .and_then(|mut s| s.objects.remove(key)))
    }

    async fn create_upload(&self, upload: ObjectRecord) -> Result<Vec<ObjectRecord>, StoreError> {
        let Some(upload_id) = upload.upload_id.clone() else {
            return Err(StoreError::Backend(format!(
                "record for {}/{} is not an upload",
                upload.bucket, upload.key
            )));
        };
        let mut state = self
            .buckets
            .get_mut(&upload.bucket)
            .ok_or_else(|| StoreError::BucketNotFound(upload.bucket.clone()))?;

        let stale: Vec<String> = state
            .uploads
            .iter()
            .filter(|(_, existing)| existing.key == upload.key)
            .map(|(id, _)| id.clone())
            .collect();
        let superseded = stale
            .iter()
            .filter_map(|id| state.uploads.remove(id))
            .collect();

        state.uploads.insert(upload_id, upload);
        Ok(superseded)
    }

    async fn find_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Option<ObjectRecord>, StoreError> {
        Ok(self.buckets.get(bucket).and_then(|s| {
            s.uploads
                .get(upload_id)
                .filter(|upload| upload.key == key)
                .cloned()
        }))
    }

    async fn append_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part: Part,
        mime_type: Option<String>,
    ) -> Result<Option<Part>, StoreError> {
        let mut state = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::UploadNotFound(upload_id.to_owned()))?;
        let upload = state
            .uploads
            .get_mut(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| StoreError::UploadNotFound(upload_id.to_owned()))?;

        let replaced = match upload
            .parts
            .binary_search_by_key(&part.part_number, |p| p.part_number)
        {
            Ok(index) => {
                let old = std::mem::replace(&mut upload.parts[index], part.clone());
                upload.size = upload.size - old.size + part.size;
                Some(old)
            }
            Err(index) => {
                upload.size += part.size;
                upload.parts.insert(index, part.clone());
                None
            }
        };
        if part.part_number == 1 {
            upload.mime_type = mime_type;
        }
        Ok(replaced)
    }

    async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        declared: &[DeclaredPart],
        hash: String,
    ) -> Result<CompletedUpload, StoreError> {
        let mut guard = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::UploadNotFound(upload_id.to_owned()))?;
        let state = &mut *guard;

        let upload = state
            .uploads
            .get(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| StoreError::UploadNotFound(upload_id.to_owned()))?;
        for wanted in declared {
            let matches = upload
                .parts
                .iter()
                .any(|p| p.part_number == wanted.part_number && p.etag.eq_ignore_ascii_case(&wanted.etag));
            if !matches {
                return Err(StoreError::PartMismatch(wanted.part_number));
            }
        }

        let Some(mut object) = state.uploads.remove(upload_id) else {
            return Err(StoreError::UploadNotFound(upload_id.to_owned()));
        };
        let keep: HashSet<u32> = declared.iter().map(|d| d.part_number).collect();
        let (kept, dropped_parts): (Vec<Part>, Vec<Part>) = std::mem::take(&mut object.parts)
            .into_iter()
            .partition(|p| keep.contains(&p.part_number));

        // The sniffed type belongs to part 1.
        if !keep.contains(&1) {
            object.mime_type = None;
        }
        object.size = kept.iter().map(|p| p.size).sum();
        object.parts = kept;
        object.hash = Some(hash);
        object.upload_id = None;
        object.created_at = Utc::now();

        let superseded = state.objects.insert(key.to_owned(), object.clone());
        Ok(CompletedUpload {
            object,
            superseded,
            dropped_parts,
        })
    }

    async fn remove_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Option<ObjectRecord>, StoreError> {
        let Some(mut state) = self.buckets.get_mut(bucket) else {
            return Ok(None);
        };
        if state.uploads.get(upload_id).is_some_and(|u| u.key == key) {
            return Ok(state.uploads.remove(upload_id));
        }
        Ok(None)
    }

    async fn stale_uploads(&self, cutoff: DateTime<Utc>) -> Result<Vec<ObjectRecord>, StoreError> {
        Ok(self
            .buckets
            .iter()
            .flat_map(|s| {
                s.uploads
                    .values()
                    .filter(|u| u.created_at < cutoff)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}
