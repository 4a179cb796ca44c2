//! Payload checks and `aws-chunked` decoding for collected request bodies.
//!
//! SDKs that stream uploads wrap the object in chunk framing:
//!
//! ```text
//! <hex-size>[;chunk-signature=<sig>]\r\n
//! <data>\r\n
//! ...
//! 0[;chunk-signature=<sig>]\r\n
//! [<trailer-name>:<value>\r\n]*
//! \r\n
//! ```
//!
//! Only the data is kept. Chunk signatures and trailers are not verified.

use bytes::{Bytes, BytesMut};
use courier_s3_auth::hash_payload;
use courier_s3_model::error::{S3Error, S3ErrorCode};

const CONTENT_SHA256_HEADER: &str = "x-amz-content-sha256";

/// Declared payload hashes that do not name a digest of the body.
const PLACEHOLDER_HASHES: &[&str] = &[
    "UNSIGNED-PAYLOAD",
    "STREAMING-AWS4-HMAC-SHA256-PAYLOAD",
    "STREAMING-AWS4-HMAC-SHA256-PAYLOAD-TRAILER",
    "STREAMING-UNSIGNED-PAYLOAD-TRAILER",
];

/// Whether the body uses `aws-chunked` framing.
pub fn is_aws_chunked(parts: &http::request::Parts) -> bool {
    let encoded = parts
        .headers
        .get_all(http::header::CONTENT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| v.trim().eq_ignore_ascii_case("aws-chunked"));

    encoded
        || parts
            .headers
            .get(CONTENT_SHA256_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("STREAMING-"))
}

/// Check a declared hex `x-amz-content-sha256` against the received body.
///
/// A missing header or a placeholder value passes.
pub fn verify_content_sha256(parts: &http::request::Parts, body: &[u8]) -> Result<(), S3Error> {
    let Some(value) = parts.headers.get(CONTENT_SHA256_HEADER) else {
        return Ok(());
    };
    let declared = value
        .to_str()
        .map_err(|_| S3Error::new(S3ErrorCode::XAmzContentSHA256Mismatch))?;

    if PLACEHOLDER_HASHES.contains(&declared) {
        return Ok(());
    }
    if declared.len() != 64 || !declared.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(S3Error::with_message(
            S3ErrorCode::XAmzContentSHA256Mismatch,
            format!("The provided 'x-amz-content-sha256' header is not valid: {declared}"),
        ));
    }
    if !hash_payload(body).eq_ignore_ascii_case(declared) {
        return Err(S3Error::new(S3ErrorCode::XAmzContentSHA256Mismatch));
    }
    Ok(())
}

/// Strip `aws-chunked` framing, returning the payload.
pub fn decode_aws_chunked(body: &[u8]) -> Result<Bytes, S3Error> {
    let mut payload = BytesMut::with_capacity(body.len());
    let mut rest = body;

    loop {
        let (line, after_line) = split_line(rest)?;
        let size = chunk_size(line)?;
        if size == 0 {
            return Ok(payload.freeze());
        }

        if after_line.len() < size {
            return Err(malformed("chunk data truncated"));
        }
        let (data, after_data) = after_line.split_at(size);
        payload.extend_from_slice(data);

        rest = after_data
            .strip_prefix(b"\r\n")
            .ok_or_else(|| malformed("missing CRLF after chunk data"))?;
    }
}

/// Split off the next CRLF-terminated line.
fn split_line(input: &[u8]) -> Result<(&[u8], &[u8]), S3Error> {
    let end = input
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or_else(|| malformed("missing chunk size line"))?;
    Ok((&input[..end], &input[end + 2..]))
}

/// Parse the hex size in front of any `;` extensions.
fn chunk_size(line: &[u8]) -> Result<usize, S3Error> {
    let hex = line.split(|&b| b == b';').next().unwrap_or_default();
    let hex = std::str::from_utf8(hex).map_err(|_| malformed("invalid chunk size encoding"))?;
    usize::from_str_radix(hex.trim(), 16)
        .map_err(|_| malformed(&format!("invalid chunk size '{hex}'")))
}

fn malformed(detail: &str) -> S3Error {
    S3Error::with_message(
        S3ErrorCode::InvalidArgument,
        format!("Malformed aws-chunked body: {detail}"),
    )
}
