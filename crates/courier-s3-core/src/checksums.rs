//! MD5 digests and the multipart ETag.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;

use crate::error::S3ServiceError;

/// Compute the lowercase hex MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use courier_s3_core::checksums::compute_md5;
///
/// assert_eq!(compute_md5(b"hello"), "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn compute_md5(data: &[u8]) -> String {
    hex::encode(md5::Md5::digest(data))
}

/// Compute the ETag of a multipart object from the part ETags, in the order given.
///
/// The raw 16-byte digests of the parts are concatenated, hashed again with
/// MD5, and suffixed with `-<part count>`. The result is unquoted.
///
/// # Errors
///
/// Returns [`S3ServiceError::InvalidPart`] naming the first ETag that is not
/// a 32 character hex digest.
///
/// # Examples
///
/// ```
/// use courier_s3_core::checksums::{compute_md5, compute_multipart_etag};
///
/// let parts = [(1, compute_md5(b"hello")), (2, compute_md5(b"world"))];
/// let etag = compute_multipart_etag(&parts).unwrap();
/// assert!(etag.ends_with("-2"));
/// ```
pub fn compute_multipart_etag(parts: &[(u32, String)]) -> Result<String, S3ServiceError> {
    let mut combined = Vec::with_capacity(parts.len() * 16);
    for (part_number, etag) in parts {
        let digest = hex::decode(etag.trim_matches('"'))
            .ok()
            .filter(|bytes| bytes.len() == 16)
            .ok_or(S3ServiceError::InvalidPart {
                part_number: *part_number,
            })?;
        combined.extend_from_slice(&digest);
    }
    let final_md5 = hex::encode(md5::Md5::digest(&combined));
    Ok(format!("{final_md5}-{}", parts.len()))
}

/// Decode a base64 `Content-MD5` header into a hex digest.
///
/// # Errors
///
/// Returns [`S3ServiceError::InvalidDigest`] unless the header decodes to
/// exactly 16 bytes.
pub fn decode_content_md5(header: &str) -> Result<String, S3ServiceError> {
    let bytes = BASE64_STANDARD
        .decode(header.trim())
        .map_err(|_| S3ServiceError::InvalidDigest)?;
    if bytes.len() != 16 {
        return Err(S3ServiceError::InvalidDigest);
    }
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_compute_md5_empty() {
        assert_eq!(compute_md5(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_should_follow_multipart_etag_law() {
        let d1 = compute_md5(b"first part");
        let d2 = compute_md5(b"second part");

        let mut raw = hex::decode(&d1).unwrap();
        raw.extend(hex::decode(&d2).unwrap());
        let expected = format!("{}-2", hex::encode(md5::Md5::digest(&raw)));

        let etag = compute_multipart_etag(&[(1, d1), (2, d2)]).unwrap();
        assert_eq!(etag, expected);
    }

    #[test]
    fn test_should_depend_on_part_order() {
        let d1 = compute_md5(b"first part");
        let d2 = compute_md5(b"second part");

        let forward = compute_multipart_etag(&[(1, d1.clone()), (2, d2.clone())]).unwrap();
        let reversed = compute_multipart_etag(&[(2, d2), (1, d1)]).unwrap();
        assert_ne!(forward, reversed);
        assert!(reversed.ends_with("-2"));
    }

    #[test]
    fn test_should_accept_quoted_part_etags() {
        let d1 = compute_md5(b"x");
        let quoted = format!("\"{d1}\"");
        assert_eq!(
            compute_multipart_etag(&[(1, quoted)]).unwrap(),
            compute_multipart_etag(&[(1, d1)]).unwrap()
        );
    }

    #[test]
    fn test_should_reject_malformed_part_etag() {
        let err = compute_multipart_etag(&[(3, "xyz".to_owned())]).unwrap_err();
        assert!(matches!(err, S3ServiceError::InvalidPart { part_number: 3 }));
    }

    #[test]
    fn test_should_decode_content_md5() {
        // md5("hello") in base64.
        assert_eq!(
            decode_content_md5("XUFAKrxLKna5cZ2REBfFkg==").unwrap(),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn test_should_reject_short_or_invalid_content_md5() {
        assert!(matches!(
            decode_content_md5("aGVsbG8="),
            Err(S3ServiceError::InvalidDigest)
        ));
        assert!(matches!(
            decode_content_md5("%%%"),
            Err(S3ServiceError::InvalidDigest)
        ));
    }
}
