//! S3 operation dispatch: routes a resolved operation to the business logic handler.
//!
//! Given a [`RoutingContext`] and HTTP request parts/body, [`dispatch_operation`]
//! calls the [`S3Handler`], which deserializes the operation's typed input
//! (via [`FromS3Request`](crate::request::FromS3Request)), runs the operation
//! and serializes the output (via [`IntoS3Response`](crate::response::IntoS3Response)).

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use courier_s3_model::S3Operation;
use courier_s3_model::error::{S3Error, S3ErrorCode};
use courier_s3_model::types::Owner;

use crate::body::S3ResponseBody;
use crate::router::RoutingContext;

/// Future returned by [`S3Handler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>>;

/// Trait that the business logic provider must implement.
///
/// This is the boundary between the HTTP layer and the S3 business logic. The
/// trait returns boxed futures so it can be used as `Arc<dyn S3Handler>`.
pub trait S3Handler: Send + Sync + 'static {
    /// Handle an S3 operation and produce an HTTP response.
    ///
    /// The authenticated caller, if any, is available through [`caller`].
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> HandlerFuture;
}

/// The authenticated caller stored in the request extensions by the service.
///
/// `None` means the request is anonymous.
#[must_use]
pub fn caller(parts: &http::request::Parts) -> Option<&Owner> {
    parts.extensions.get::<Owner>()
}

/// Dispatch a routed S3 request to the handler.
pub async fn dispatch_operation<H: S3Handler>(
    handler: &H,
    parts: http::request::Parts,
    body: Bytes,
    ctx: RoutingContext,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let op = ctx.operation;
    tracing::debug!(operation = %op, bucket = ?ctx.bucket, key = ?ctx.key, "dispatching S3 operation");
    handler.handle_operation(op, parts, body, ctx).await
}

/// A handler that returns `NotImplemented` for all operations.
///
/// Useful for testing the HTTP routing and authentication layers in isolation.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedHandler;

impl S3Handler for NotImplementedHandler {
    fn handle_operation(
        &self,
        op: S3Operation,
        _parts: http::request::Parts,
        _body: Bytes,
        _ctx: RoutingContext,
    ) -> HandlerFuture {
        Box::pin(async move {
            Err(S3Error::with_message(
                S3ErrorCode::NotImplemented,
                format!("{op} is not implemented"),
            ))
        })
    }
}
