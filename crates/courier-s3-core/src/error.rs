//! Service error types.
//!
//! [`S3ServiceError`] is what the handlers produce; converting it into an
//! [`S3Error`] attaches the S3 error code, canonical message and status code
//! used on the wire.
//!
//! ```
//! use courier_s3_core::error::S3ServiceError;
//! use courier_s3_model::error::{S3Error, S3ErrorCode};
//!
//! let err = S3ServiceError::NoSuchBucket {
//!     bucket: "my-bucket".to_owned(),
//! };
//! let s3_err: S3Error = err.into();
//! assert_eq!(s3_err.code, S3ErrorCode::NoSuchBucket);
//! ```

use courier_s3_model::error::{S3Error, S3ErrorCode};
use courier_transport::TransportError;

/// Failures reported by a [`MetadataStore`](crate::state::MetadataStore).
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A bucket with this name exists, under any owner.
    #[error("bucket already exists: {0}")]
    BucketExists(String),

    /// The bucket does not exist.
    #[error("bucket does not exist: {0}")]
    BucketNotFound(String),

    /// The bucket still holds objects or uploads.
    #[error("bucket is not empty: {0}")]
    BucketNotEmpty(String),

    /// The upload does not exist for the addressed object.
    #[error("upload does not exist: {0}")]
    UploadNotFound(String),

    /// A declared part was never uploaded or has a different ETag.
    #[error("part {0} does not match an uploaded part")]
    PartMismatch(u32),

    /// The store itself failed.
    #[error("metadata store failure: {0}")]
    Backend(String),
}

/// Errors produced by the S3 handlers.
#[derive(Debug, thiserror::Error)]
pub enum S3ServiceError {
    /// The bucket does not exist or is not owned by the caller.
    #[error("The specified bucket does not exist: {bucket}")]
    NoSuchBucket {
        /// The bucket name.
        bucket: String,
    },

    /// The bucket name is taken.
    #[error("Bucket name is already in use: {bucket}")]
    BucketAlreadyExists {
        /// The bucket name.
        bucket: String,
    },

    /// The bucket still holds objects or uploads.
    #[error("The bucket you tried to delete is not empty: {bucket}")]
    BucketNotEmpty {
        /// The bucket name.
        bucket: String,
    },

    /// The object does not exist.
    #[error("The specified key does not exist: {key}")]
    NoSuchKey {
        /// The object key.
        key: String,
    },

    /// The multipart upload does not exist.
    #[error("The specified upload does not exist: {upload_id}")]
    NoSuchUpload {
        /// The upload id.
        upload_id: String,
    },

    /// A declared part does not match an uploaded part.
    #[error("Part {part_number} could not be found")]
    InvalidPart {
        /// The offending part number.
        part_number: u32,
    },

    /// The bucket name does not match the naming rules.
    #[error("Invalid bucket name: {name}")]
    InvalidBucketName {
        /// The rejected name.
        name: String,
    },

    /// A request parameter is invalid.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong.
        message: String,
    },

    /// The request document is malformed.
    #[error("The XML you provided was not well-formed: {detail}")]
    MalformedXml {
        /// Parser detail.
        detail: String,
    },

    /// The `Content-MD5` header is not a base64 MD5 digest.
    #[error("The Content-MD5 you specified is not valid")]
    InvalidDigest,

    /// The `Content-MD5` header disagrees with the body.
    #[error("The Content-MD5 you specified did not match what we received")]
    BadDigest,

    /// The caller may not read from the bucket.
    #[error("Access to bucket {bucket} is forbidden")]
    Forbidden {
        /// The bucket name.
        bucket: String,
    },

    /// The operation needs an authenticated caller.
    #[error("Access Denied")]
    AccessDenied,

    /// The blob transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl S3ServiceError {
    /// Convert this error into an [`S3Error`].
    #[must_use]
    pub fn into_s3_error(self) -> S3Error {
        S3Error::from(self)
    }
}

impl From<StoreError> for S3ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BucketExists(bucket) => Self::BucketAlreadyExists { bucket },
            StoreError::BucketNotFound(bucket) => Self::NoSuchBucket { bucket },
            StoreError::BucketNotEmpty(bucket) => Self::BucketNotEmpty { bucket },
            StoreError::UploadNotFound(upload_id) => Self::NoSuchUpload { upload_id },
            StoreError::PartMismatch(part_number) => Self::InvalidPart { part_number },
            StoreError::Backend(_) => Self::Internal(anyhow::Error::new(err)),
        }
    }
}

impl From<S3ServiceError> for S3Error {
    fn from(err: S3ServiceError) -> Self {
        match err {
            S3ServiceError::NoSuchBucket { bucket } => S3Error::no_such_bucket(bucket),
            S3ServiceError::BucketAlreadyExists { bucket } => S3Error::bucket_already_exists(bucket),
            S3ServiceError::BucketNotEmpty { bucket } => S3Error::bucket_not_empty(bucket),
            S3ServiceError::NoSuchKey { key } => S3Error::no_such_key(key),
            S3ServiceError::NoSuchUpload { upload_id } => S3Error::no_such_upload(upload_id),
            S3ServiceError::InvalidPart { part_number } => {
                S3Error::invalid_part(part_number.to_string())
            }
            S3ServiceError::InvalidBucketName { name } => S3Error::invalid_bucket_name(name),
            S3ServiceError::InvalidArgument { message } => S3Error::invalid_argument(message),
            S3ServiceError::MalformedXml { detail } => S3Error::malformed_xml(detail),
            S3ServiceError::InvalidDigest => S3Error::new(S3ErrorCode::InvalidDigest),
            S3ServiceError::BadDigest => S3Error::new(S3ErrorCode::BadDigest),
            S3ServiceError::Forbidden { bucket } => S3Error::forbidden(bucket),
            S3ServiceError::AccessDenied => S3Error::new(S3ErrorCode::AccessDenied),
            S3ServiceError::Transport(source) => {
                S3Error::service_unavailable(source.to_string()).with_source(source)
            }
            S3ServiceError::Internal(source) => {
                S3Error::internal_error(source.to_string())
            }
        }
    }
}

/// Convenience result type for S3 service operations.
pub type S3ServiceResult<T> = Result<T, S3ServiceError>;
