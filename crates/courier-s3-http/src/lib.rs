//! S3 HTTP routing, request parsing, response serialization, and hyper service.
//!
//! This crate provides the HTTP layer of the Courier gateway. It handles:
//!
//! - **Routing** ([`router`]): Maps HTTP requests to S3 operations by examining
//!   method, path and query parameters. Buckets are addressed path-style and
//!   the bucket segment is lowercased.
//!
//! - **Request deserialization** ([`request`]): Converts raw HTTP request parts into
//!   typed S3 input structs from `courier-s3-model`.
//!
//! - **Response serialization** ([`response`]): Converts typed S3 output structs into
//!   HTTP responses with appropriate status codes, headers, and bodies.
//!
//! - **Dispatch** ([`dispatch`]): Routes identified S3 operations to the business logic
//!   handler via the [`S3Handler`](dispatch::S3Handler) trait.
//!
//! - **Service** ([`service`]): The main [`S3HttpService`](service::S3HttpService) that
//!   implements hyper's `Service` trait, tying routing, auth, dispatch, and middleware
//!   together.
//!
//! - **Chunked payloads** ([`chunked`]): Verifies the declared payload hash and
//!   strips `aws-chunked` framing from streamed uploads.
//!
//! - **Body** ([`body`]): The [`S3ResponseBody`](body::S3ResponseBody) type supporting
//!   buffered, empty and streaming response modes.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> S3HttpService (hyper Service)
//!     -> Health check interception
//!     -> S3Router (operation identification)
//!     -> Body collection (size limit, read timeout)
//!     -> SigV4 authentication, caller stored in request extensions
//!     -> Payload hash check and aws-chunked decoding
//!     -> dispatch_operation (S3Handler trait)
//!     -> Common response headers (x-amz-request-id, Server)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use courier_s3_http::service::{S3HttpConfig, S3HttpService};
//! use courier_s3_http::dispatch::NotImplementedHandler;
//!
//! let config = S3HttpConfig::default();
//! let handler = NotImplementedHandler;
//! let service = S3HttpService::new(handler, config);
//! // Use `service` with hyper server.
//! ```

// S3Error is the domain error used pervasively as Result<T, S3Error>.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod chunked;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

pub use body::S3ResponseBody;
pub use dispatch::{NotImplementedHandler, S3Handler, caller};
pub use request::FromS3Request;
pub use response::IntoS3Response;
pub use router::{RoutingContext, S3Router};
pub use service::{S3HttpConfig, S3HttpService};
