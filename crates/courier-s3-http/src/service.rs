//! The main S3 HTTP service implementing hyper's `Service` trait.
//!
//! [`S3HttpService`] ties together routing, authentication, dispatch, and response
//! serialization into a single hyper-compatible service. It handles:
//!
//! 1. Health check interception (`GET /healthcheck`)
//! 2. S3 request routing via [`S3Router`]
//! 3. Request body collection, bounded in size and time
//! 4. SigV4 authentication; the caller is stored in the request extensions
//! 5. Payload hash verification and `aws-chunked` decoding
//! 6. Operation dispatch to the [`S3Handler`]
//! 7. Common response headers (`x-amz-request-id`, `Server`)
//! 8. Error response formatting

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use courier_s3_auth::sigv4::parse_authorization_header;
use courier_s3_auth::{AuthError, AuthFailure, CredentialProvider, verify_sigv4};
use courier_s3_model::S3Operation;
use courier_s3_model::error::{S3Error, S3ErrorCode};
use courier_s3_model::types::Owner;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::service::Service;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::body::S3ResponseBody;
use crate::chunked::{decode_aws_chunked, is_aws_chunked, verify_content_sha256};
use crate::dispatch::{S3Handler, dispatch_operation};
use crate::response::error_to_response;
use crate::router::S3Router;

/// Path answered with an empty 200 before routing or authentication.
pub const HEALTH_CHECK_PATH: &str = "/healthcheck";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for the S3 HTTP service.
#[derive(Clone)]
pub struct S3HttpConfig {
    /// Trust the access key named in the `Authorization` header without
    /// verifying the signature (development only).
    pub skip_signature_validation: bool,
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
    /// Upper bound for reading a request body.
    pub body_read_timeout: Duration,
    /// Credential provider for SigV4 verification. Without one every request is anonymous.
    pub credential_provider: Option<Arc<dyn CredentialProvider>>,
}

impl std::fmt::Debug for S3HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3HttpConfig")
            .field("skip_signature_validation", &self.skip_signature_validation)
            .field("max_body_size", &self.max_body_size)
            .field("body_read_timeout", &self.body_read_timeout)
            .field(
                "credential_provider",
                &self.credential_provider.as_ref().map(|_| "..."),
            )
            .finish()
    }
}

impl Default for S3HttpConfig {
    fn default() -> Self {
        Self {
            skip_signature_validation: false,
            max_body_size: 512 * 1024 * 1024,
            body_read_timeout: Duration::from_secs(600),
            credential_provider: None,
        }
    }
}

/// The S3 HTTP service that implements hyper's `Service` trait.
///
/// The service is generic over the request body, so it serves hyper's
/// `Incoming` as well as in-memory bodies.
#[derive(Debug)]
pub struct S3HttpService<H: S3Handler> {
    handler: Arc<H>,
    router: S3Router,
    config: Arc<S3HttpConfig>,
}

impl<H: S3Handler> S3HttpService<H> {
    /// Create a new S3 HTTP service with the given handler and configuration.
    #[must_use]
    pub fn new(handler: H, config: S3HttpConfig) -> Self {
        Self::from_shared(Arc::new(handler), config)
    }

    /// Create a new S3 HTTP service from an `Arc<H>` handler and configuration.
    #[must_use]
    pub fn from_shared(handler: Arc<H>, config: S3HttpConfig) -> Self {
        Self {
            handler,
            router: S3Router::new(),
            config: Arc::new(config),
        }
    }
}

impl<H: S3Handler> Clone for S3HttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            router: self.router,
            config: Arc::clone(&self.config),
        }
    }
}

impl<H, B> Service<http::Request<B>> for S3HttpService<H>
where
    H: S3Handler,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let router = self.router;
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let request_id = Uuid::new_v4().simple().to_string();
            let response =
                process_request(req, handler.as_ref(), router, &config, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Process an incoming HTTP request through the S3 pipeline.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    router: S3Router,
    config: &S3HttpConfig,
    request_id: &str,
) -> http::Response<S3ResponseBody>
where
    H: S3Handler,
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing S3 request");

    if is_health_check(&method, uri.path()) {
        return health_check_response();
    }

    let ctx = match router.resolve(&req) {
        Ok(ctx) => ctx,
        Err(err) => {
            warn!(%method, %uri, error = %err, request_id, "failed to route S3 request");
            return error_to_response(&err, request_id);
        }
    };

    info!(
        operation = %ctx.operation,
        bucket = ?ctx.bucket,
        key = ?ctx.key,
        request_id,
        "routed S3 request"
    );

    let (mut parts, incoming) = req.into_parts();
    let body = match collect_body(incoming, config).await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, request_id, "failed to collect request body");
            return error_to_response(&err, request_id);
        }
    };

    if let Err(err) = authenticate(&mut parts, ctx.operation, config).await {
        return error_to_response(&err, request_id);
    }

    let body = match decode_payload(&parts, body) {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, request_id, "rejected request payload");
            return error_to_response(&err, request_id);
        }
    };

    match dispatch_operation(handler, parts, body, ctx).await {
        Ok(response) => response,
        Err(err) => {
            debug!(error = %err, request_id, "S3 operation returned error");
            error_to_response(&err, request_id)
        }
    }
}

/// Collect the full body, enforcing the size limit and read timeout.
async fn collect_body<B>(body: B, config: &S3HttpConfig) -> Result<Bytes, S3Error>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let limited = Limited::new(body, config.max_body_size);
    match tokio::time::timeout(config.body_read_timeout, limited.collect()).await {
        Ok(Ok(collected)) => Ok(collected.to_bytes()),
        Ok(Err(e)) if e.is::<LengthLimitError>() => Err(S3Error::new(S3ErrorCode::EntityTooLarge)),
        Ok(Err(e)) => Err(S3Error::with_message(
            S3ErrorCode::InvalidRequest,
            format!("Failed to read request body: {e}"),
        )),
        Err(_) => Err(S3Error::new(S3ErrorCode::RequestTimeout)),
    }
}

/// Verify the declared payload hash, then strip any `aws-chunked` framing.
fn decode_payload(parts: &http::request::Parts, body: Bytes) -> Result<Bytes, S3Error> {
    verify_content_sha256(parts, &body)?;
    if is_aws_chunked(parts) {
        decode_aws_chunked(&body)
    } else {
        Ok(body)
    }
}

/// Resolve the caller and store it in the request extensions.
///
/// Operations that allow anonymous access proceed without a caller when
/// verification fails; every other operation fails with the auth error.
async fn authenticate(
    parts: &mut http::request::Parts,
    operation: S3Operation,
    config: &S3HttpConfig,
) -> Result<(), S3Error> {
    if config.skip_signature_validation {
        if let Some(owner) = unverified_caller(parts) {
            parts.extensions.insert(owner);
        }
        return Ok(());
    }

    let Some(provider) = config.credential_provider.as_ref() else {
        return Ok(());
    };

    match verify_sigv4(parts, provider.as_ref()).await {
        Ok(result) => {
            parts.extensions.insert(Owner {
                id: result.access_key_id,
                display_name: result.display_name,
            });
            Ok(())
        }
        Err(err)
            if operation.allows_anonymous() && err.failure() != AuthFailure::LookupFailed =>
        {
            debug!(error = %err, %operation, "continuing as anonymous caller");
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, %operation, "authentication failed");
            Err(auth_error_to_s3(&err))
        }
    }
}

/// The access key named in the `Authorization` header, without verification.
fn unverified_caller(parts: &http::request::Parts) -> Option<Owner> {
    let header = parts.headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let parsed = parse_authorization_header(header).ok()?;
    Some(Owner {
        id: parsed.access_key_id,
        display_name: None,
    })
}

/// Map an authentication failure to its S3 error.
fn auth_error_to_s3(err: &AuthError) -> S3Error {
    match err.failure() {
        AuthFailure::MissingCredentials
        | AuthFailure::MalformedHeader
        | AuthFailure::UnknownAccessKey => S3Error::invalid_access_key_id(),
        AuthFailure::SignatureMismatch => S3Error::signature_does_not_match(),
        AuthFailure::LookupFailed => {
            S3Error::service_unavailable("Credentials could not be looked up, please retry")
        }
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == HEALTH_CHECK_PATH
}

/// Produce a health check response.
fn health_check_response() -> http::Response<S3ResponseBody> {
    http::Response::new(S3ResponseBody::empty())
}

/// Add common response headers to every S3 response.
fn add_common_headers(
    mut response: http::Response<S3ResponseBody>,
    request_id: &str,
) -> http::Response<S3ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv);
    }
    headers.insert(
        http::header::SERVER,
        http::header::HeaderValue::from_static("Courier"),
    );

    response
}
