//! S3 response body types supporting buffered, empty and streaming modes.
//!
//! - **Buffered**: XML payloads and error bodies.
//! - **Empty**: 204 responses, HEAD responses and other header-only replies.
//! - **Streaming**: object content produced lazily as the client reads it. An
//!   error item aborts the response mid-body.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use courier_s3_model::output::ObjectBody;
use futures::Stream;
use http_body::Frame;
use http_body_util::Full;

/// S3 response body.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper responses.
#[derive(Default)]
pub enum S3ResponseBody {
    /// Buffered body for small responses: XML payloads, error bodies.
    Buffered(Full<Bytes>),
    /// Empty body.
    #[default]
    Empty,
    /// Object content pulled from the blob transport on demand.
    Streaming(ObjectBody),
}

impl std::fmt::Debug for S3ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered(full) => f.debug_tuple("Buffered").field(full).finish(),
            Self::Empty => f.write_str("Empty"),
            Self::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

impl S3ResponseBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a buffered body from an XML byte vector.
    #[must_use]
    pub fn from_xml(xml: Vec<u8>) -> Self {
        Self::Buffered(Full::new(Bytes::from(xml)))
    }

    /// Create a streaming body.
    #[must_use]
    pub fn from_stream(stream: ObjectBody) -> Self {
        Self::Streaming(stream)
    }
}

impl http_body::Body for S3ResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
            Self::Streaming(stream) => Pin::new(stream)
                .poll_next(cx)
                .map(|item| item.map(|chunk| chunk.map(Frame::data))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
            Self::Streaming(_) => false,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
            Self::Streaming(_) => http_body::SizeHint::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use http_body::Body;
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn test_should_report_empty_body_as_end_of_stream() {
        let body = S3ResponseBody::empty();
        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));
    }

    #[test]
    fn test_should_create_buffered_body_from_bytes() {
        let body = S3ResponseBody::from_bytes(Bytes::from("hello"));
        assert!(!body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(5));
    }

    #[test]
    fn test_should_default_to_empty() {
        assert!(S3ResponseBody::default().is_end_stream());
    }

    #[tokio::test]
    async fn test_should_concatenate_streamed_chunks() {
        let chunks = vec![Ok(Bytes::from("hello ")), Ok(Bytes::from("world"))];
        let body = S3ResponseBody::from_stream(futures::stream::iter(chunks).boxed());

        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(collected, Bytes::from("hello world"));
    }

    #[tokio::test]
    async fn test_should_surface_stream_error() {
        let chunks = vec![
            Ok(Bytes::from("partial")),
            Err(std::io::Error::other("backend down")),
        ];
        let body = S3ResponseBody::from_stream(futures::stream::iter(chunks).boxed());

        let err = body.collect().await.unwrap_err();
        assert_eq!(err.to_string(), "backend down");
    }
}
