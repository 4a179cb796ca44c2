//! Multipart upload handlers.
//!
//! An upload is an incomplete object record: it is invisible to reads and
//! listings until completion turns it into a complete object in one store
//! step. The object's ETag is the MD5 of the concatenated binary part digests
//! followed by `-<count>`.

use courier_s3_model::input::{
    AbortMultipartUploadInput, CompleteMultipartUploadInput, CreateMultipartUploadInput,
    UploadPartInput,
};
use courier_s3_model::output::{
    CompleteMultipartUploadOutput, CreateMultipartUploadOutput, UploadPartOutput,
};
use courier_s3_model::types::Owner;
use tracing::{debug, info};

use super::object::verify_content_md5;
use crate::checksums::{compute_md5, compute_multipart_etag};
use crate::error::{S3ServiceError, S3ServiceResult};
use crate::provider::{CourierS3, require_caller};
use crate::sniff::detect_content_type;
use crate::state::{DeclaredPart, ObjectRecord, Part};
use crate::utils::generate_upload_id;
use crate::validation::{validate_object_key, validate_part_number};

impl CourierS3 {
    /// Start a multipart upload. Older in-flight uploads of the same key are discarded.
    pub async fn handle_create_multipart_upload(
        &self,
        caller: Option<&Owner>,
        input: CreateMultipartUploadInput,
    ) -> S3ServiceResult<CreateMultipartUploadOutput> {
        let caller = require_caller(caller)?;
        let bucket = self.owned_bucket(&input.bucket, caller).await?;
        validate_object_key(&input.key)?;

        let upload_id = generate_upload_id();
        let upload = ObjectRecord::new_upload(
            bucket.name.clone(),
            input.key.clone(),
            caller.id.clone(),
            upload_id.clone(),
        );

        let superseded = self.store.create_upload(upload).await?;
        for old in superseded {
            debug!(upload_id = ?old.upload_id, "Discarding superseded upload");
            self.discard_blobs(old.blobs()).await;
        }

        info!(bucket = %bucket.name, key = %input.key, %upload_id, "Created multipart upload");
        Ok(CreateMultipartUploadOutput {
            bucket: bucket.name,
            key: input.key,
            upload_id,
        })
    }

    /// Store one part. Re-sending a part number replaces the earlier part.
    pub async fn handle_upload_part(
        &self,
        caller: Option<&Owner>,
        input: UploadPartInput,
    ) -> S3ServiceResult<UploadPartOutput> {
        let caller = require_caller(caller)?;
        let bucket = self.owned_bucket(&input.bucket, caller).await?;
        validate_part_number(input.part_number)?;

        if self
            .store
            .find_upload(&bucket.name, &input.key, &input.upload_id)
            .await?
            .is_none()
        {
            return Err(S3ServiceError::NoSuchUpload {
                upload_id: input.upload_id,
            });
        }

        let etag = compute_md5(&input.body);
        verify_content_md5(input.content_md5.as_deref(), &etag)?;

        let mime_type = (input.part_number == 1)
            .then(|| detect_content_type(&input.body, input.content_type.as_deref()));
        let size = input.body.len() as u64;
        let blob = self.transport().send_blob(input.body).await?;

        let part = Part {
            part_number: input.part_number,
            blob: blob.clone(),
            size,
            etag: etag.clone(),
        };
        match self
            .store
            .append_part(&bucket.name, &input.key, &input.upload_id, part, mime_type)
            .await
        {
            Ok(Some(replaced)) => self.discard_blobs(vec![replaced.blob]).await,
            Ok(None) => {}
            Err(e) => {
                self.discard_blobs(vec![blob]).await;
                return Err(e.into());
            }
        }

        debug!(
            upload_id = %input.upload_id,
            part_number = input.part_number,
            size,
            "Stored part"
        );
        Ok(UploadPartOutput { etag })
    }

    /// Complete an upload from the parts the client declares.
    ///
    /// Declarations are ordered by part number; every declared part must have
    /// been uploaded with the declared ETag. Uploaded parts that are not
    /// declared are discarded.
    pub async fn handle_complete_multipart_upload(
        &self,
        caller: Option<&Owner>,
        input: CompleteMultipartUploadInput,
    ) -> S3ServiceResult<CompleteMultipartUploadOutput> {
        let caller = require_caller(caller)?;
        let bucket = self.owned_bucket(&input.bucket, caller).await?;

        let mut declared = input
            .multipart_upload
            .parts
            .into_iter()
            .map(|p| match (p.part_number, p.etag) {
                (Some(part_number), Some(etag)) => Ok(DeclaredPart {
                    part_number,
                    etag: etag.trim_matches('"').to_owned(),
                }),
                _ => Err(S3ServiceError::MalformedXml {
                    detail: "each Part needs a PartNumber and an ETag".to_owned(),
                }),
            })
            .collect::<S3ServiceResult<Vec<_>>>()?;
        if declared.is_empty() {
            return Err(S3ServiceError::MalformedXml {
                detail: "no parts declared".to_owned(),
            });
        }
        declared.sort_by_key(|p| p.part_number);

        let digests: Vec<(u32, String)> = declared
            .iter()
            .map(|p| (p.part_number, p.etag.clone()))
            .collect();
        let etag = compute_multipart_etag(&digests)?;

        let completed = self
            .store
            .complete_upload(
                &bucket.name,
                &input.key,
                &input.upload_id,
                &declared,
                etag.clone(),
            )
            .await?;

        let mut unreferenced: Vec<_> = completed
            .dropped_parts
            .into_iter()
            .map(|p| p.blob)
            .collect();
        if let Some(old) = completed.superseded {
            unreferenced.extend(old.blobs());
        }
        self.discard_blobs(unreferenced).await;

        info!(
            bucket = %bucket.name,
            key = %input.key,
            parts = declared.len(),
            size = completed.object.size,
            "Completed multipart upload"
        );
        Ok(CompleteMultipartUploadOutput {
            location: format!("/{}/{}", bucket.name, input.key),
            bucket: bucket.name,
            key: input.key,
            etag,
        })
    }

    /// Abort an upload and discard its parts.
    pub async fn handle_abort_multipart_upload(
        &self,
        caller: Option<&Owner>,
        input: AbortMultipartUploadInput,
    ) -> S3ServiceResult<()> {
        let caller = require_caller(caller)?;
        let bucket = self.owned_bucket(&input.bucket, caller).await?;

        let removed = self
            .store
            .remove_upload(&bucket.name, &input.key, &input.upload_id)
            .await?
            .ok_or_else(|| S3ServiceError::NoSuchUpload {
                upload_id: input.upload_id.clone(),
            })?;
        self.discard_blobs(removed.blobs()).await;

        info!(upload_id = %input.upload_id, "Aborted multipart upload");
        Ok(())
    }
}
