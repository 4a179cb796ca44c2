//! HTTP request to S3 input struct deserialization.
//!
//! This module provides the [`FromS3Request`] trait and implementations for converting
//! raw HTTP request parts (headers, query parameters, routed bucket and key, body) into
//! typed S3 input structs defined in `courier-s3-model`.

use std::str::FromStr;

use bytes::Bytes;
use courier_s3_model::error::{S3Error, S3ErrorCode};
use courier_s3_model::input::{
    AbortMultipartUploadInput, CompleteMultipartUploadInput, CreateBucketInput,
    CreateMultipartUploadInput, DeleteBucketInput, DeleteObjectInput, GetBucketLocationInput,
    GetBucketVersioningInput, GetObjectInput, ListObjectsInput, PutObjectInput,
    PutPublicAccessBlockInput, UploadPartInput,
};
use courier_s3_xml::from_xml;

/// Trait for extracting an S3 input struct from HTTP request components.
pub trait FromS3Request: Sized {
    /// Extract the input from HTTP request parts.
    ///
    /// # Arguments
    /// - `parts` - The HTTP request head (method, URI, headers).
    /// - `bucket` - The resolved bucket name, if any.
    /// - `key` - The resolved object key, if any.
    /// - `query_params` - Parsed query parameters from the URI.
    /// - `body` - The raw request body bytes.
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` if required fields are missing or field values
    /// cannot be parsed.
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error>;
}

// ---------------------------------------------------------------------------
// Helper functions for extracting typed values from HTTP request parts
// ---------------------------------------------------------------------------

/// Extract a header value as a string.
pub fn header_str(parts: &http::request::Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Get a query parameter value by name.
#[must_use]
pub fn query_param(params: &[(String, String)], name: &str) -> Option<String> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

/// Get a query parameter and parse it, failing with `InvalidArgument` on bad input.
fn query_param_parse<T: FromStr>(
    params: &[(String, String)],
    name: &str,
) -> Result<Option<T>, S3Error> {
    query_param(params, name)
        .map(|v| {
            v.parse().map_err(|_| {
                S3Error::invalid_argument(format!("Invalid value for {name}: {v}"))
            })
        })
        .transpose()
}

/// Require a bucket name from the routing context, returning an error if absent.
fn require_bucket(bucket: Option<&str>) -> Result<String, S3Error> {
    bucket.map(ToOwned::to_owned).ok_or_else(|| {
        S3Error::with_message(S3ErrorCode::InvalidRequest, "Bucket name is required")
    })
}

/// Require an object key from the routing context, returning an error if absent.
fn require_key(key: Option<&str>) -> Result<String, S3Error> {
    key.map(ToOwned::to_owned)
        .ok_or_else(|| S3Error::with_message(S3ErrorCode::InvalidRequest, "Object key is required"))
}

/// Require the `uploadId` query parameter.
fn require_upload_id(params: &[(String, String)]) -> Result<String, S3Error> {
    query_param(params, "uploadId")
        .ok_or_else(|| S3Error::with_message(S3ErrorCode::InvalidRequest, "uploadId is required"))
}

/// Parse an XML body into a typed value, returning an `S3Error` on failure.
fn parse_xml_body<T: courier_s3_xml::S3Deserialize>(body: &Bytes) -> Result<T, S3Error> {
    from_xml(body).map_err(|e| S3Error::malformed_xml(format!("Failed to parse XML body: {e}")))
}

// ---------------------------------------------------------------------------
// Bucket operations
// ---------------------------------------------------------------------------

impl FromS3Request for CreateBucketInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
        })
    }
}

impl FromS3Request for PutPublicAccessBlockInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            configuration: parse_xml_body(&body)?,
        })
    }
}

impl FromS3Request for DeleteBucketInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
        })
    }
}

impl FromS3Request for GetBucketLocationInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
        })
    }
}

impl FromS3Request for GetBucketVersioningInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
        })
    }
}

impl FromS3Request for ListObjectsInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            prefix: query_param(query_params, "prefix"),
            marker: query_param(query_params, "marker"),
            max_keys: query_param_parse(query_params, "max-keys")?,
            encoding_type: query_param(query_params, "encoding-type"),
        })
    }
}

// ---------------------------------------------------------------------------
// Object operations
// ---------------------------------------------------------------------------

impl FromS3Request for PutObjectInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            body,
            content_md5: header_str(parts, "content-md5"),
            content_type: header_str(parts, "content-type"),
        })
    }
}

impl FromS3Request for GetObjectInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
        })
    }
}

impl FromS3Request for DeleteObjectInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Multipart operations
// ---------------------------------------------------------------------------

impl FromS3Request for CreateMultipartUploadInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
        })
    }
}

impl FromS3Request for UploadPartInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let part_number = query_param_parse(query_params, "partNumber")?.ok_or_else(|| {
            S3Error::with_message(S3ErrorCode::InvalidRequest, "partNumber is required")
        })?;
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            upload_id: require_upload_id(query_params)?,
            part_number,
            body,
            content_md5: header_str(parts, "content-md5"),
            content_type: header_str(parts, "content-type"),
        })
    }
}

impl FromS3Request for CompleteMultipartUploadInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            upload_id: require_upload_id(query_params)?,
            multipart_upload: parse_xml_body(&body)?,
        })
    }
}

impl FromS3Request for AbortMultipartUploadInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            upload_id: require_upload_id(query_params)?,
        })
    }
}
