//! S3 output struct to HTTP response serialization.
//!
//! This module provides the [`IntoS3Response`] trait and implementations for converting
//! typed S3 output structs from `courier-s3-model` into HTTP responses.
//!
//! Response categories:
//! - **Header-only**: object writes return the ETag header; deletes return 204.
//! - **XML body**: listings, multipart results and bucket configuration getters.
//! - **Streaming body**: `GetObject` passes the object stream through.

use chrono::{DateTime, Utc};
use courier_s3_model::error::S3Error;
#[allow(clippy::wildcard_imports)] // All output types are used in IntoS3Response impls below.
use courier_s3_model::output::*;
use courier_s3_xml::{S3Serialize, to_xml};
use http::header::HeaderValue;

use crate::body::S3ResponseBody;

/// Trait for converting an S3 output struct into an HTTP response.
pub trait IntoS3Response {
    /// Convert this output into an HTTP response.
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` if the response cannot be constructed (e.g., invalid
    /// header value).
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error>;
}

// ---------------------------------------------------------------------------
// Helper functions for building responses
// ---------------------------------------------------------------------------

/// Quote an ETag for the `ETag` header.
fn quoted(etag: &str) -> String {
    format!("\"{etag}\"")
}

/// Format a timestamp as an HTTP date (RFC 7231).
fn http_date(value: &DateTime<Utc>) -> String {
    value.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Set an optional header on a response builder if the value is `Some`.
fn set_optional_header(
    builder: http::response::Builder,
    name: &str,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Build a response from a builder, converting build errors to `S3Error`.
fn build_response(
    builder: http::response::Builder,
    body: S3ResponseBody,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    builder
        .body(body)
        .map_err(|e| S3Error::internal_error(format!("failed to build HTTP response: {e}")))
}

/// Build a 200 response carrying an S3 XML document.
fn xml_response<T: S3Serialize>(
    root_element: &str,
    value: &T,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let xml = to_xml(root_element, value)
        .map_err(|e| S3Error::internal_error(format!("failed to serialize {root_element}: {e}")))?;
    let builder = http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/xml");
    build_response(builder, S3ResponseBody::from_xml(xml))
}

/// Apply the object metadata headers shared by GET and HEAD.
fn object_headers(
    builder: http::response::Builder,
    metadata: &ObjectMetadata,
) -> http::response::Builder {
    let builder = builder
        .header("Content-Length", metadata.content_length)
        .header("Last-Modified", http_date(&metadata.last_modified));
    let builder = set_optional_header(builder, "Content-Type", Some(&metadata.content_type));
    set_optional_header(builder, "ETag", Some(&quoted(&metadata.etag)))
}

/// A 200 response with no body.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other converters.
pub fn ok_response() -> Result<http::Response<S3ResponseBody>, S3Error> {
    build_response(
        http::Response::builder().status(http::StatusCode::OK),
        S3ResponseBody::empty(),
    )
}

/// A 204 response with no body.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other converters.
pub fn no_content_response() -> Result<http::Response<S3ResponseBody>, S3Error> {
    build_response(
        http::Response::builder().status(http::StatusCode::NO_CONTENT),
        S3ResponseBody::empty(),
    )
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

impl IntoS3Response for ListBucketsOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("ListAllMyBucketsResult", &self)
    }
}

impl IntoS3Response for ListObjectsOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("ListBucketResult", &self)
    }
}

impl IntoS3Response for GetBucketLocationOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("LocationConstraint", &self)
    }
}

impl IntoS3Response for GetBucketVersioningOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("VersioningConfiguration", &self)
    }
}

impl IntoS3Response for CreateMultipartUploadOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("InitiateMultipartUploadResult", &self)
    }
}

impl IntoS3Response for CompleteMultipartUploadOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("CompleteMultipartUploadResult", &self)
    }
}

impl IntoS3Response for PutObjectOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = http::Response::builder().status(http::StatusCode::OK);
        let builder = set_optional_header(builder, "ETag", Some(&quoted(&self.etag)));
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for UploadPartOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = http::Response::builder().status(http::StatusCode::OK);
        let builder = set_optional_header(builder, "ETag", Some(&quoted(&self.etag)));
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for HeadObjectOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = object_headers(
            http::Response::builder().status(http::StatusCode::OK),
            &self.metadata,
        );
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for GetObjectOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = object_headers(
            http::Response::builder().status(http::StatusCode::OK),
            &self.metadata,
        );
        let disposition = self.metadata.content_disposition();
        let builder = set_optional_header(builder, "Content-Disposition", disposition.as_deref());
        build_response(builder, S3ResponseBody::from_stream(self.body))
    }
}

/// Convert an `S3Error` into an HTTP response with an XML error body.
pub fn error_to_response(err: &S3Error, request_id: &str) -> http::Response<S3ResponseBody> {
    let xml_bytes =
        courier_s3_xml::error_to_xml(err.code.as_str(), &err.message, err.resource.as_deref());

    let builder = http::Response::builder()
        .status(err.status_code)
        .header("Content-Type", "application/xml");
    let builder = set_optional_header(builder, "x-amz-request-id", Some(request_id));

    builder
        .body(S3ResponseBody::from_xml(xml_bytes))
        .unwrap_or_else(|_| {
            let mut response = http::Response::new(S3ResponseBody::empty());
            *response.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::TimeZone;
    use courier_s3_model::error::S3ErrorCode;
    use futures::StreamExt;
    use http_body_util::BodyExt;

    use super::*;

    fn header<'a>(resp: &'a http::Response<S3ResponseBody>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    async fn body_string(resp: http::Response<S3ResponseBody>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn metadata(key: &str, content_type: &str) -> ObjectMetadata {
        ObjectMetadata {
            key: key.to_owned(),
            content_length: 5,
            content_type: content_type.to_owned(),
            etag: "5d41402abc4b2a76b9719d911017c592".to_owned(),
            last_modified: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_should_quote_put_object_etag() {
        let resp = PutObjectOutput {
            etag: "abc123".to_owned(),
        }
        .into_s3_response()
        .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(header(&resp, "ETag"), Some("\"abc123\""));
    }

    #[test]
    fn test_should_render_head_object_headers() {
        let resp = HeadObjectOutput {
            metadata: metadata("report.pdf", "application/pdf"),
        }
        .into_s3_response()
        .unwrap();
        assert_eq!(header(&resp, "Content-Length"), Some("5"));
        assert_eq!(header(&resp, "Content-Type"), Some("application/pdf"));
        assert_eq!(
            header(&resp, "Last-Modified"),
            Some("Mon, 15 Jan 2024 10:30:00 GMT")
        );
        assert_eq!(
            header(&resp, "ETag"),
            Some("\"5d41402abc4b2a76b9719d911017c592\"")
        );
        assert!(header(&resp, "Content-Disposition").is_none());
    }

    #[tokio::test]
    async fn test_should_stream_get_object_with_disposition() {
        let output = GetObjectOutput {
            metadata: metadata("docs/report.pdf", "application/pdf"),
            body: futures::stream::iter(vec![Ok(Bytes::from("hello"))]).boxed(),
        };
        let resp = output.into_s3_response().unwrap();
        assert_eq!(
            header(&resp, "Content-Disposition"),
            Some("attachment; filename=report.pdf")
        );
        assert_eq!(body_string(resp).await, "hello");
    }

    #[test]
    fn test_should_serve_text_inline() {
        let output = GetObjectOutput {
            metadata: metadata("notes.txt", "text/plain"),
            body: futures::stream::empty().boxed(),
        };
        let resp = output.into_s3_response().unwrap();
        assert!(header(&resp, "Content-Disposition").is_none());
    }

    #[tokio::test]
    async fn test_should_render_initiate_result() {
        let resp = CreateMultipartUploadOutput {
            bucket: "b".to_owned(),
            key: "k".to_owned(),
            upload_id: "u-1".to_owned(),
        }
        .into_s3_response()
        .unwrap();
        assert_eq!(header(&resp, "Content-Type"), Some("application/xml"));
        let xml = body_string(resp).await;
        assert!(xml.contains(
            "<InitiateMultipartUploadResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">"
        ));
        assert!(xml.contains("<UploadId>u-1</UploadId>"));
    }

    #[tokio::test]
    async fn test_should_render_versioning_document() {
        let resp = GetBucketVersioningOutput {
            status: "Disabled".to_owned(),
        }
        .into_s3_response()
        .unwrap();
        let xml = body_string(resp).await;
        assert!(xml.contains("<Status>Disabled</Status>"));
    }

    #[test]
    fn test_should_use_no_content_for_deletes() {
        assert_eq!(
            no_content_response().unwrap().status(),
            http::StatusCode::NO_CONTENT
        );
        assert_eq!(ok_response().unwrap().status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_render_error_document() {
        let err = S3Error::no_such_bucket("missing");
        let resp = error_to_response(&err, "req-1");
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(header(&resp, "x-amz-request-id"), Some("req-1"));
        let xml = body_string(resp).await;
        assert!(xml.contains("<Code>NoSuchBucket</Code>"));
        assert!(xml.contains("<Resource>missing</Resource>"));
        assert_eq!(err.code, S3ErrorCode::NoSuchBucket);
    }
}
