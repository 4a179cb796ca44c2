//! Object operation handlers: put, get, head and delete.

use chrono::Utc;
use courier_s3_model::input::{DeleteObjectInput, GetObjectInput, PutObjectInput};
use courier_s3_model::output::{
    GetObjectOutput, HeadObjectOutput, ObjectMetadata, PutObjectOutput,
};
use courier_s3_model::types::Owner;
use futures::{StreamExt, TryStreamExt};
use tracing::debug;

use crate::checksums::{compute_md5, decode_content_md5};
use crate::error::{S3ServiceError, S3ServiceResult};
use crate::provider::{CourierS3, require_caller};
use crate::sniff::detect_content_type;
use crate::state::{ObjectRecord, Part};
use crate::validation::validate_object_key;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Compare a `Content-MD5` header against the digest of the received bytes.
pub(crate) fn verify_content_md5(header: Option<&str>, computed: &str) -> S3ServiceResult<()> {
    let Some(header) = header else {
        return Ok(());
    };
    if decode_content_md5(header)? != computed {
        return Err(S3ServiceError::BadDigest);
    }
    Ok(())
}

fn metadata_of(record: &ObjectRecord) -> ObjectMetadata {
    ObjectMetadata {
        key: record.key.clone(),
        content_length: record.size,
        content_type: record
            .mime_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
        etag: record.hash.clone().unwrap_or_default(),
        last_modified: record.created_at,
    }
}

impl CourierS3 {
    /// Store an object in one piece, replacing any existing object with the same key.
    pub async fn handle_put_object(
        &self,
        caller: Option<&Owner>,
        input: PutObjectInput,
    ) -> S3ServiceResult<PutObjectOutput> {
        let caller = require_caller(caller)?;
        let bucket = self.owned_bucket(&input.bucket, caller).await?;
        validate_object_key(&input.key)?;

        let etag = compute_md5(&input.body);
        verify_content_md5(input.content_md5.as_deref(), &etag)?;

        let mime_type = detect_content_type(&input.body, input.content_type.as_deref());
        let size = input.body.len() as u64;
        let blob = self.transport().send_blob(input.body).await?;

        let record = ObjectRecord {
            bucket: bucket.name,
            key: input.key,
            owner: caller.id.clone(),
            created_at: Utc::now(),
            size,
            mime_type: Some(mime_type),
            hash: Some(etag.clone()),
            parts: vec![Part {
                part_number: 1,
                blob: blob.clone(),
                size,
                etag: etag.clone(),
            }],
            upload_id: None,
        };

        debug!(bucket = %record.bucket, key = %record.key, size, "Storing object");
        match self.store.replace_object(record).await {
            Ok(Some(superseded)) => self.discard_blobs(superseded.blobs()).await,
            Ok(None) => {}
            Err(e) => {
                self.discard_blobs(vec![blob]).await;
                return Err(e.into());
            }
        }

        Ok(PutObjectOutput { etag })
    }

    /// Stream a complete object.
    ///
    /// Sessions for every datacenter holding the object are established
    /// before returning, so handshake failures surface as errors instead of
    /// aborted bodies. Chunks are fetched only as the body is polled.
    pub async fn handle_get_object(
        &self,
        caller: Option<&Owner>,
        input: GetObjectInput,
    ) -> S3ServiceResult<GetObjectOutput> {
        let record = self
            .readable_object(&input.bucket, &input.key, caller)
            .await?;
        self.prepare_sessions(&record).await?;

        let body = self
            .sessions
            .read_parts(record.part_refs())
            .map_err(std::io::Error::from)
            .boxed();

        Ok(GetObjectOutput {
            metadata: metadata_of(&record),
            body,
        })
    }

    /// Report a complete object's metadata.
    pub async fn handle_head_object(
        &self,
        caller: Option<&Owner>,
        input: GetObjectInput,
    ) -> S3ServiceResult<HeadObjectOutput> {
        let record = self
            .readable_object(&input.bucket, &input.key, caller)
            .await?;
        Ok(HeadObjectOutput {
            metadata: metadata_of(&record),
        })
    }

    /// Delete an object. Deleting a missing key succeeds.
    pub async fn handle_delete_object(
        &self,
        caller: Option<&Owner>,
        input: DeleteObjectInput,
    ) -> S3ServiceResult<()> {
        let caller = require_caller(caller)?;
        let bucket = self.owned_bucket(&input.bucket, caller).await?;

        let owned = self
            .store
            .find_object(&bucket.name, &input.key)
            .await?
            .is_some_and(|o| o.owner == caller.id);
        if !owned {
            return Ok(());
        }

        if let Some(deleted) = self.store.delete_object(&bucket.name, &input.key).await? {
            debug!(bucket = %bucket.name, key = %input.key, "Deleted object");
            self.discard_blobs(deleted.blobs()).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use courier_s3_model::input::{CreateBucketInput, PutPublicAccessBlockInput};
    use courier_s3_model::types::PublicAccessBlockConfiguration;
    use courier_transport::TransportError;

    use super::*;
    use crate::provider::test_support::{alice, bob, provider};

    async fn with_bucket(name: &str) -> CourierS3 {
        let provider = provider();
        provider
            .handle_create_bucket(
                Some(&alice()),
                CreateBucketInput {
                    bucket: name.to_owned(),
                },
            )
            .await
            .unwrap();
        provider
    }

    fn put(bucket: &str, key: &str, body: &'static [u8]) -> PutObjectInput {
        PutObjectInput {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            body: Bytes::from_static(body),
            ..Default::default()
        }
    }

    fn get(bucket: &str, key: &str) -> GetObjectInput {
        GetObjectInput {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        }
    }

    async fn collect(output: GetObjectOutput) -> Vec<u8> {
        output
            .body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_should_round_trip_object_with_md5_etag() {
        let provider = with_bucket("data").await;
        let put_output = provider
            .handle_put_object(Some(&alice()), put("data", "hello.txt", b"hello"))
            .await
            .unwrap();
        assert_eq!(put_output.etag, "5d41402abc4b2a76b9719d911017c592");

        let output = provider
            .handle_get_object(Some(&alice()), get("data", "hello.txt"))
            .await
            .unwrap();
        assert_eq!(output.metadata.etag, put_output.etag);
        assert_eq!(output.metadata.content_length, 5);
        assert_eq!(output.metadata.content_type, "text/plain");
        assert_eq!(collect(output).await, b"hello");
    }

    #[tokio::test]
    async fn test_should_fall_back_to_declared_content_type() {
        let provider = with_bucket("data").await;
        let mut input = put("data", "blob", b"\x00\x01\x02");
        input.content_type = Some("application/x-custom".to_owned());
        provider
            .handle_put_object(Some(&alice()), input)
            .await
            .unwrap();

        let head = provider
            .handle_head_object(Some(&alice()), get("data", "blob"))
            .await
            .unwrap();
        assert_eq!(head.metadata.content_type, "application/x-custom");
    }

    #[tokio::test]
    async fn test_should_verify_content_md5() {
        let provider = with_bucket("data").await;

        let mut good = put("data", "k", b"hello");
        good.content_md5 = Some(STANDARD.encode(md5_raw(b"hello")));
        provider
            .handle_put_object(Some(&alice()), good)
            .await
            .unwrap();

        let mut bad = put("data", "k", b"hello");
        bad.content_md5 = Some(STANDARD.encode(md5_raw(b"other")));
        let err = provider
            .handle_put_object(Some(&alice()), bad)
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::BadDigest));

        let mut malformed = put("data", "k", b"hello");
        malformed.content_md5 = Some("not-md5".to_owned());
        let err = provider
            .handle_put_object(Some(&alice()), malformed)
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::InvalidDigest));
    }

    fn md5_raw(data: &[u8]) -> Vec<u8> {
        hex::decode(compute_md5(data)).unwrap()
    }

    #[tokio::test]
    async fn test_should_replace_object_and_drop_old_blob() {
        let provider = with_bucket("data").await;
        provider
            .handle_put_object(Some(&alice()), put("data", "k", b"first"))
            .await
            .unwrap();
        provider
            .handle_put_object(Some(&alice()), put("data", "k", b"second"))
            .await
            .unwrap();

        let output = provider
            .handle_get_object(Some(&alice()), get("data", "k"))
            .await
            .unwrap();
        assert_eq!(collect(output).await, b"second");

        let record = provider
            .store()
            .find_object("data", "k")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.parts.len(), 1);
    }

    #[tokio::test]
    async fn test_should_allow_anonymous_reads_of_public_buckets_only() {
        let provider = with_bucket("open").await;
        provider
            .handle_put_object(Some(&alice()), put("open", "k", b"data"))
            .await
            .unwrap();

        assert!(provider.handle_head_object(None, get("open", "k")).await.is_ok());
        assert!(
            provider
                .handle_head_object(Some(&bob()), get("open", "k"))
                .await
                .is_ok()
        );

        provider
            .handle_put_public_access_block(
                Some(&alice()),
                PutPublicAccessBlockInput {
                    bucket: "open".to_owned(),
                    configuration: PublicAccessBlockConfiguration {
                        block_public_acls: Some(true),
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        let err = provider
            .handle_get_object(None, get("open", "k"))
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::Forbidden { .. }));
        let err = provider
            .handle_get_object(Some(&bob()), get("open", "k"))
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::Forbidden { .. }));
        assert!(
            provider
                .handle_get_object(Some(&alice()), get("open", "k"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_should_report_missing_bucket_and_key() {
        let provider = with_bucket("data").await;
        let err = provider
            .handle_head_object(None, get("nope", "k"))
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::NoSuchBucket { .. }));

        let err = provider
            .handle_head_object(None, get("data", "missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::NoSuchKey { .. }));
    }

    #[tokio::test]
    async fn test_should_delete_idempotently() {
        let provider = with_bucket("data").await;
        provider
            .handle_put_object(Some(&alice()), put("data", "k", b"data"))
            .await
            .unwrap();

        let delete = || DeleteObjectInput {
            bucket: "data".to_owned(),
            key: "k".to_owned(),
        };
        provider
            .handle_delete_object(Some(&alice()), delete())
            .await
            .unwrap();
        provider
            .handle_delete_object(Some(&alice()), delete())
            .await
            .unwrap();

        let err = provider
            .handle_get_object(Some(&alice()), get("data", "k"))
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::NoSuchKey { .. }));
    }

    #[tokio::test]
    async fn test_should_reject_writes_to_foreign_bucket() {
        let provider = with_bucket("data").await;
        let err = provider
            .handle_put_object(Some(&bob()), put("data", "k", b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::NoSuchBucket { .. }));
    }

    #[test]
    fn test_should_skip_digest_check_without_header() {
        assert!(verify_content_md5(None, "anything").is_ok());
    }

    #[test]
    fn test_should_map_transport_errors_to_service_errors() {
        let err: S3ServiceError = TransportError::Backend("down".into()).into();
        assert!(matches!(err, S3ServiceError::Transport(_)));
    }
}
