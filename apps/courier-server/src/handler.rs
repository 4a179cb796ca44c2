//! S3 operation handler implementation for [`CourierS3`].
//!
//! This module bridges the HTTP layer (`courier-s3-http`) with the business logic
//! (`courier-s3-core`) by implementing the [`S3Handler`] trait. Each S3 operation is
//! dispatched to the corresponding `handle_*` method on [`CourierS3`] together with
//! the caller resolved by the HTTP service, with request deserialization via
//! [`FromS3Request`] and response serialization via [`IntoS3Response`].

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use courier_s3_core::{CourierS3, S3ServiceResult};
use courier_s3_http::body::S3ResponseBody;
use courier_s3_http::dispatch::{HandlerFuture, S3Handler, caller};
use courier_s3_http::request::FromS3Request;
use courier_s3_http::response::{IntoS3Response, no_content_response, ok_response};
use courier_s3_http::router::RoutingContext;
use courier_s3_model::S3Operation;
use courier_s3_model::error::S3Error;

type HttpResult = Result<http::Response<S3ResponseBody>, S3Error>;

/// Wrapper that implements [`S3Handler`] by delegating to [`CourierS3`] handler methods.
#[derive(Debug, Clone)]
pub struct CourierHandler(pub Arc<CourierS3>);

impl S3Handler for CourierHandler {
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> HandlerFuture {
        let provider = Arc::clone(&self.0);
        Box::pin(async move {
            let bucket = ctx.bucket.as_deref();
            let key = ctx.key.as_deref();
            let query_params = &ctx.query_params;
            let who = caller(&parts);

            match op {
                // ---------------------------------------------------------------
                // Buckets
                // ---------------------------------------------------------------
                S3Operation::ListBuckets => match provider.handle_list_buckets(who).await {
                    Ok(output) => output.into_s3_response(),
                    Err(e) => Err(e.into()),
                },
                S3Operation::CreateBucket => {
                    dispatch_void(&parts, bucket, key, query_params, body, ok_response, |input| {
                        provider.handle_create_bucket(who, input)
                    })
                    .await
                }
                S3Operation::PutPublicAccessBlock => {
                    dispatch_void(&parts, bucket, key, query_params, body, ok_response, |input| {
                        provider.handle_put_public_access_block(who, input)
                    })
                    .await
                }
                S3Operation::DeleteBucket => {
                    dispatch_void(
                        &parts,
                        bucket,
                        key,
                        query_params,
                        body,
                        no_content_response,
                        |input| provider.handle_delete_bucket(who, input),
                    )
                    .await
                }
                S3Operation::GetBucketLocation => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_get_bucket_location(who, input)
                    })
                    .await
                }
                S3Operation::GetBucketVersioning => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_get_bucket_versioning(who, input)
                    })
                    .await
                }
                S3Operation::ListObjects => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_list_objects(who, input)
                    })
                    .await
                }

                // ---------------------------------------------------------------
                // Objects
                // ---------------------------------------------------------------
                S3Operation::PutObject => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_put_object(who, input)
                    })
                    .await
                }
                S3Operation::GetObject => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_get_object(who, input)
                    })
                    .await
                }
                S3Operation::HeadObject => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_head_object(who, input)
                    })
                    .await
                }
                S3Operation::DeleteObject => {
                    dispatch_void(
                        &parts,
                        bucket,
                        key,
                        query_params,
                        body,
                        no_content_response,
                        |input| provider.handle_delete_object(who, input),
                    )
                    .await
                }

                // ---------------------------------------------------------------
                // Multipart uploads
                // ---------------------------------------------------------------
                S3Operation::CreateMultipartUpload => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_create_multipart_upload(who, input)
                    })
                    .await
                }
                S3Operation::UploadPart => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_upload_part(who, input)
                    })
                    .await
                }
                S3Operation::CompleteMultipartUpload => {
                    dispatch_output(&parts, bucket, key, query_params, body, |input| {
                        provider.handle_complete_multipart_upload(who, input)
                    })
                    .await
                }
                S3Operation::AbortMultipartUpload => {
                    dispatch_void(
                        &parts,
                        bucket,
                        key,
                        query_params,
                        body,
                        no_content_response,
                        |input| provider.handle_abort_multipart_upload(who, input),
                    )
                    .await
                }
            }
        })
    }
}

/// Dispatch an operation whose output serializes itself into a response.
async fn dispatch_output<I, O, F, Fut>(
    parts: &http::request::Parts,
    bucket: Option<&str>,
    key: Option<&str>,
    query_params: &[(String, String)],
    body: Bytes,
    handler_fn: F,
) -> HttpResult
where
    I: FromS3Request,
    O: IntoS3Response,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = S3ServiceResult<O>>,
{
    let input = I::from_s3_request(parts, bucket, key, query_params, body)?;
    let output = handler_fn(input).await?;
    output.into_s3_response()
}

/// Dispatch an operation without output, answering with `respond` on success.
async fn dispatch_void<I, F, Fut>(
    parts: &http::request::Parts,
    bucket: Option<&str>,
    key: Option<&str>,
    query_params: &[(String, String)],
    body: Bytes,
    respond: fn() -> HttpResult,
    handler_fn: F,
) -> HttpResult
where
    I: FromS3Request,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = S3ServiceResult<()>>,
{
    let input = I::from_s3_request(parts, bucket, key, query_params, body)?;
    handler_fn(input).await?;
    respond()
}

#[cfg(test)]
mod tests {
    use courier_s3_core::CourierConfig;
    use courier_s3_http::router::S3Router;
    use courier_s3_model::types::Owner;
    use http_body_util::BodyExt;

    use super::*;

    fn handler() -> CourierHandler {
        CourierHandler(Arc::new(CourierS3::in_memory(CourierConfig::default())))
    }

    async fn call(
        handler: &CourierHandler,
        method: http::Method,
        uri: &str,
        owner: Option<&str>,
        body: &'static [u8],
    ) -> HttpResult {
        let req = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .expect("valid request");
        let ctx = S3Router::new().resolve(&req)?;
        let (mut parts, ()) = req.into_parts();
        if let Some(id) = owner {
            parts.extensions.insert(Owner {
                id: id.to_owned(),
                display_name: None,
            });
        }
        handler
            .handle_operation(ctx.operation, parts, Bytes::from_static(body), ctx)
            .await
    }

    async fn body_of(resp: http::Response<S3ResponseBody>) -> Bytes {
        resp.into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes()
    }

    #[tokio::test]
    async fn test_should_store_and_stream_object() {
        let handler = handler();
        let resp = call(&handler, http::Method::PUT, "/photos", Some("alice"), b"")
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);

        let resp = call(
            &handler,
            http::Method::PUT,
            "/photos/cat.txt",
            Some("alice"),
            b"hello",
        )
        .await
        .unwrap();
        assert_eq!(
            resp.headers().get("ETag").unwrap(),
            "\"5d41402abc4b2a76b9719d911017c592\""
        );

        let resp = call(
            &handler,
            http::Method::GET,
            "/photos/cat.txt",
            Some("alice"),
            b"",
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(body_of(resp).await, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_should_list_buckets_as_xml() {
        let handler = handler();
        call(&handler, http::Method::PUT, "/photos", Some("alice"), b"")
            .await
            .unwrap();

        let resp = call(&handler, http::Method::GET, "/", Some("alice"), b"")
            .await
            .unwrap();
        let xml = String::from_utf8(body_of(resp).await.to_vec()).unwrap();
        assert!(xml.contains("<ListAllMyBucketsResult"));
        assert!(xml.contains("<Name>photos</Name>"));
    }

    #[tokio::test]
    async fn test_should_answer_no_content_for_deletes() {
        let handler = handler();
        call(&handler, http::Method::PUT, "/photos", Some("alice"), b"")
            .await
            .unwrap();

        let resp = call(
            &handler,
            http::Method::DELETE,
            "/photos/missing",
            Some("alice"),
            b"",
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);

        let resp = call(&handler, http::Method::DELETE, "/photos", Some("alice"), b"")
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_should_surface_service_errors() {
        let handler = handler();
        let err = call(&handler, http::Method::PUT, "/photos", None, b"")
            .await
            .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);

        let err = call(
            &handler,
            http::Method::GET,
            "/missing/key",
            Some("alice"),
            b"",
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
