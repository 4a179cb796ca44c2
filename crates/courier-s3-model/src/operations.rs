//! S3 operations served by the gateway.

/// All supported S3 operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3Operation {
    /// `GET /`
    ListBuckets,
    /// `PUT /{bucket}`
    CreateBucket,
    /// `PUT /{bucket}?publicAccessBlock`
    PutPublicAccessBlock,
    /// `DELETE /{bucket}`
    DeleteBucket,
    /// `GET /{bucket}?location`
    GetBucketLocation,
    /// `GET /{bucket}?versioning`
    GetBucketVersioning,
    /// `GET /{bucket}`
    ListObjects,
    /// `PUT /{bucket}/{key}`
    PutObject,
    /// `PUT /{bucket}/{key}?uploadId&partNumber`
    UploadPart,
    /// `POST /{bucket}/{key}?uploads`
    CreateMultipartUpload,
    /// `POST /{bucket}/{key}?uploadId`
    CompleteMultipartUpload,
    /// `DELETE /{bucket}/{key}?uploadId`
    AbortMultipartUpload,
    /// `DELETE /{bucket}/{key}`
    DeleteObject,
    /// `GET /{bucket}/{key}`
    GetObject,
    /// `HEAD /{bucket}/{key}`
    HeadObject,
}

impl S3Operation {
    /// Returns the operation name as used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListBuckets => "ListBuckets",
            Self::CreateBucket => "CreateBucket",
            Self::PutPublicAccessBlock => "PutPublicAccessBlock",
            Self::DeleteBucket => "DeleteBucket",
            Self::GetBucketLocation => "GetBucketLocation",
            Self::GetBucketVersioning => "GetBucketVersioning",
            Self::ListObjects => "ListObjects",
            Self::PutObject => "PutObject",
            Self::UploadPart => "UploadPart",
            Self::CreateMultipartUpload => "CreateMultipartUpload",
            Self::CompleteMultipartUpload => "CompleteMultipartUpload",
            Self::AbortMultipartUpload => "AbortMultipartUpload",
            Self::DeleteObject => "DeleteObject",
            Self::GetObject => "GetObject",
            Self::HeadObject => "HeadObject",
        }
    }

    /// Whether an unauthenticated caller may attempt this operation.
    ///
    /// Only object reads qualify; the handler still checks that the bucket is public.
    #[must_use]
    pub fn allows_anonymous(&self) -> bool {
        matches!(self, Self::GetObject | Self::HeadObject)
    }
}

impl std::fmt::Display for S3Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
