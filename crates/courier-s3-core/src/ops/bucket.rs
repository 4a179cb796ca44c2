//! Bucket operation handlers.
//!
//! Bucket names form one global namespace. Any operation on a bucket the
//! caller does not own reports `NoSuchBucket`, so the existence of other
//! users' buckets is only revealed by `CreateBucket`.

use courier_s3_model::input::{
    CreateBucketInput, DeleteBucketInput, GetBucketLocationInput, GetBucketVersioningInput,
    PutPublicAccessBlockInput,
};
use courier_s3_model::output::{
    GetBucketLocationOutput, GetBucketVersioningOutput, ListBucketsOutput,
};
use courier_s3_model::types::{BucketEntry, Owner};
use tracing::{debug, info};

use crate::error::{S3ServiceError, S3ServiceResult};
use crate::provider::{CourierS3, require_caller};
use crate::state::Bucket;
use crate::validation::validate_bucket_name;

const VERSIONING_DISABLED: &str = "Disabled";

impl CourierS3 {
    /// List the caller's buckets.
    pub async fn handle_list_buckets(
        &self,
        caller: Option<&Owner>,
    ) -> S3ServiceResult<ListBucketsOutput> {
        let caller = require_caller(caller)?;
        let buckets = self
            .store
            .list_buckets(&caller.id)
            .await?
            .into_iter()
            .map(|b| BucketEntry {
                name: b.name,
                creation_date: b.created_at,
            })
            .collect();

        Ok(ListBucketsOutput {
            owner: caller.clone(),
            buckets,
        })
    }

    /// Create a public bucket owned by the caller.
    pub async fn handle_create_bucket(
        &self,
        caller: Option<&Owner>,
        input: CreateBucketInput,
    ) -> S3ServiceResult<()> {
        let caller = require_caller(caller)?;
        validate_bucket_name(&input.bucket)?;

        self.store
            .create_bucket(Bucket::new(input.bucket.clone(), caller.id.clone()))
            .await?;

        info!(bucket = %input.bucket, owner = %caller.id, "Created bucket");
        Ok(())
    }

    /// Apply a public access block: `BlockPublicAcls` makes the bucket private.
    pub async fn handle_put_public_access_block(
        &self,
        caller: Option<&Owner>,
        input: PutPublicAccessBlockInput,
    ) -> S3ServiceResult<()> {
        let caller = require_caller(caller)?;
        let bucket = self.owned_bucket(&input.bucket, caller).await?;

        if let Some(block) = input.configuration.block_public_acls {
            self.store.set_bucket_public(&bucket.name, !block).await?;
            debug!(bucket = %bucket.name, public = !block, "Updated bucket visibility");
        }
        Ok(())
    }

    /// Delete an empty bucket.
    pub async fn handle_delete_bucket(
        &self,
        caller: Option<&Owner>,
        input: DeleteBucketInput,
    ) -> S3ServiceResult<()> {
        let caller = require_caller(caller)?;
        let bucket = self.owned_bucket(&input.bucket, caller).await?;

        if !self.store.delete_bucket(&bucket.name).await? {
            return Err(S3ServiceError::NoSuchBucket {
                bucket: bucket.name,
            });
        }

        info!(bucket = %bucket.name, "Deleted bucket");
        Ok(())
    }

    /// Report the configured location constraint.
    pub async fn handle_get_bucket_location(
        &self,
        caller: Option<&Owner>,
        input: GetBucketLocationInput,
    ) -> S3ServiceResult<GetBucketLocationOutput> {
        let caller = require_caller(caller)?;
        self.owned_bucket(&input.bucket, caller).await?;

        Ok(GetBucketLocationOutput {
            location_constraint: self.config.location_constraint.clone(),
        })
    }

    /// Report versioning status. Versioning is never enabled.
    pub async fn handle_get_bucket_versioning(
        &self,
        caller: Option<&Owner>,
        input: GetBucketVersioningInput,
    ) -> S3ServiceResult<GetBucketVersioningOutput> {
        let caller = require_caller(caller)?;
        self.owned_bucket(&input.bucket, caller).await?;

        Ok(GetBucketVersioningOutput {
            status: VERSIONING_DISABLED.to_owned(),
        })
    }
}
