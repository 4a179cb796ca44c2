//! S3 request routing: path parsing and operation identification.
//!
//! The [`S3Router`] maps incoming HTTP requests to S3 operations by examining:
//!
//! - The HTTP method (GET, PUT, DELETE, POST, HEAD)
//! - Whether a bucket name is present (first path segment)
//! - Whether an object key is present (rest of the path)
//! - Query parameters that identify sub-resources (e.g., `?location`, `?uploads`)
//!
//! Bucket names are case-insensitive on the wire and lowercased here.

use courier_s3_model::error::{S3Error, S3ErrorCode};
use courier_s3_model::operations::S3Operation;
use http::Method;
use percent_encoding::percent_decode_str;

/// Path-style S3 request router.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Router;

/// The result of routing an HTTP request to an S3 operation.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// The resolved bucket name, lowercased, if any.
    pub bucket: Option<String>,
    /// The resolved object key, if any.
    pub key: Option<String>,
    /// The identified S3 operation.
    pub operation: S3Operation,
    /// Parsed query parameters from the request URI.
    pub query_params: Vec<(String, String)>,
}

impl S3Router {
    /// Create a router.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve an HTTP request to a routing context containing the identified S3 operation.
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` if the method is not allowed on the addressed resource.
    pub fn resolve<B>(&self, req: &http::Request<B>) -> Result<RoutingContext, S3Error> {
        let uri = req.uri();
        let query_params = parse_query_params(uri.query().unwrap_or(""));
        let (bucket, key) = parse_path(uri.path());

        let operation =
            identify_operation(req.method(), bucket.as_ref(), key.as_ref(), &query_params)?;

        Ok(RoutingContext {
            bucket,
            key,
            operation,
            query_params,
        })
    }
}

/// Parse the URI path into an optional lowercased bucket and optional key.
///
/// Path format: `/{bucket}` or `/{bucket}/{key...}`
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    if let Some(pos) = trimmed.find('/') {
        let bucket = decode_uri_component(&trimmed[..pos]).to_lowercase();
        let key_raw = &trimmed[pos + 1..];
        let key = if key_raw.is_empty() {
            None
        } else {
            Some(decode_uri_component(key_raw))
        };
        (Some(bucket), key)
    } else {
        (Some(decode_uri_component(trimmed).to_lowercase()), None)
    }
}

/// Decode a percent-encoded URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into key-value pairs.
fn parse_query_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_uri_component(key), decode_uri_component(value)),
            None => (decode_uri_component(pair), String::new()),
        })
        .collect()
}

/// Whether a query parameter is present.
fn query_has_key(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

/// Identify the S3 operation from the HTTP method, path structure and query params.
fn identify_operation(
    method: &Method,
    bucket: Option<&String>,
    key: Option<&String>,
    query_params: &[(String, String)],
) -> Result<S3Operation, S3Error> {
    match (method, bucket.is_some(), key.is_some()) {
        (&Method::GET, false, false) => Ok(S3Operation::ListBuckets),
        (method, true, false) => identify_bucket_operation(method, query_params),
        (method, true, true) => identify_object_operation(method, query_params),
        (_, false, _) => Err(S3Error::with_message(
            S3ErrorCode::MethodNotAllowed,
            "Only GET is allowed at the service level",
        )),
    }
}

/// Identify a bucket-level operation (bucket present, no key).
fn identify_bucket_operation(
    method: &Method,
    params: &[(String, String)],
) -> Result<S3Operation, S3Error> {
    match *method {
        Method::GET if query_has_key(params, "location") => Ok(S3Operation::GetBucketLocation),
        Method::GET if query_has_key(params, "versioning") => {
            Ok(S3Operation::GetBucketVersioning)
        }
        Method::GET => Ok(S3Operation::ListObjects),
        Method::PUT if query_has_key(params, "publicAccessBlock") => {
            Ok(S3Operation::PutPublicAccessBlock)
        }
        Method::PUT => Ok(S3Operation::CreateBucket),
        Method::DELETE => Ok(S3Operation::DeleteBucket),
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}

/// Identify an object-level operation (bucket and key present).
fn identify_object_operation(
    method: &Method,
    params: &[(String, String)],
) -> Result<S3Operation, S3Error> {
    let has_upload_id = query_has_key(params, "uploadId");
    match *method {
        Method::GET => Ok(S3Operation::GetObject),
        Method::HEAD => Ok(S3Operation::HeadObject),
        Method::PUT if has_upload_id && query_has_key(params, "partNumber") => {
            Ok(S3Operation::UploadPart)
        }
        Method::PUT => Ok(S3Operation::PutObject),
        Method::POST if query_has_key(params, "uploads") => Ok(S3Operation::CreateMultipartUpload),
        Method::POST if has_upload_id => Ok(S3Operation::CompleteMultipartUpload),
        Method::DELETE if has_upload_id => Ok(S3Operation::AbortMultipartUpload),
        Method::DELETE => Ok(S3Operation::DeleteObject),
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}
