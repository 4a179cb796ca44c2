//! AWS Signature Version 4 verification.
//!
//! The verification flow:
//!
//! 1. Parse the `Authorization` header into a [`ParsedAuth`] record.
//! 2. Resolve the user's secret through a [`CredentialProvider`].
//! 3. Rebuild the canonical request from the request parts and the
//!    client-declared `x-amz-content-sha256` value.
//! 4. Build the string to sign and derive the scoped signing key.
//! 5. Compare the expected signature with the provided one in constant time.
//!
//! With the `test-util` feature, `sign_request` runs the same steps from the
//! client side so tests can produce valid headers.

use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::build_canonical_request;
use crate::credentials::CredentialProvider;
use crate::error::AuthError;

/// The only algorithm supported by this implementation.
const SUPPORTED_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Header carrying the request timestamp.
const AMZ_DATE_HEADER: &str = "x-amz-date";

/// Header carrying the client-declared payload hash.
const CONTENT_SHA256_HEADER: &str = "x-amz-content-sha256";

type HmacSha256 = Hmac<Sha256>;

/// The result of a successful SigV4 verification.
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The access key ID that signed the request.
    pub access_key_id: String,
    /// Display name of the owning user, when the store knows one.
    pub display_name: Option<String>,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// The headers that were included in the signature.
    pub signed_headers: Vec<String>,
}

/// Parsed components of an AWS SigV4 `Authorization` header.
#[derive(Debug, Clone)]
pub struct ParsedAuth {
    /// The signing algorithm (must be `AWS4-HMAC-SHA256`).
    pub algorithm: String,
    /// The access key ID.
    pub access_key_id: String,
    /// The date component of the credential scope (YYYYMMDD).
    pub date: String,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// The signed header names, in the order the client listed them.
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
}

impl ParsedAuth {
    fn credential_scope(&self) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            self.date, self.region, self.service
        )
    }
}

/// Parameters for signing a request on the client side.
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone, Copy)]
pub struct SigningParams<'a> {
    /// Access key ID placed in the credential scope.
    pub access_key_id: &'a str,
    /// Secret used to derive the signing key.
    pub secret_key: &'a str,
    /// Region placed in the credential scope.
    pub region: &'a str,
    /// Service placed in the credential scope.
    pub service: &'a str,
    /// Names of the headers to sign, in the order they should be listed.
    pub signed_headers: &'a [&'a str],
}

#[cfg(any(test, feature = "test-util"))]
impl std::fmt::Debug for SigningParams<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningParams")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("service", &self.service)
            .field("signed_headers", &self.signed_headers)
            .finish()
    }
}

/// Parse an AWS SigV4 `Authorization` header value into its components.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if a component is missing,
/// [`AuthError::UnsupportedAlgorithm`] if the algorithm is not `AWS4-HMAC-SHA256`,
/// or [`AuthError::InvalidCredential`] if the credential scope is malformed.
pub fn parse_authorization_header(header: &str) -> Result<ParsedAuth, AuthError> {
    let (algorithm, rest) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if algorithm != SUPPORTED_ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let mut credential = None;
    let mut signed_headers = None;
    let mut signature = None;

    for part in rest.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("Credential=") {
            credential = Some(value);
        } else if let Some(value) = part.strip_prefix("SignedHeaders=") {
            signed_headers = Some(value);
        } else if let Some(value) = part.strip_prefix("Signature=") {
            signature = Some(value);
        }
    }

    let credential = credential.ok_or(AuthError::InvalidAuthHeader)?;
    let signed_headers = signed_headers
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)?;
    let signature = signature
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)?;

    // AKID/date/region/service/aws4_request
    let cred_parts: Vec<&str> = credential.splitn(5, '/').collect();
    if cred_parts.len() != 5 || cred_parts[4] != "aws4_request" || cred_parts[0].is_empty() {
        return Err(AuthError::InvalidCredential);
    }

    Ok(ParsedAuth {
        algorithm: algorithm.to_owned(),
        access_key_id: cred_parts[0].to_owned(),
        date: cred_parts[1].to_owned(),
        region: cred_parts[2].to_owned(),
        service: cred_parts[3].to_owned(),
        signed_headers: signed_headers.split(';').map(ToOwned::to_owned).collect(),
        signature: signature.to_owned(),
    })
}

/// Build the SigV4 string to sign.
///
/// # Examples
///
/// ```
/// use courier_s3_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/us-east-1/s3/aws4_request",
///     "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{SUPPORTED_ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key using the HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, b"aws4_request")
}

/// Compute the hex-encoded HMAC-SHA256 signature of `data`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Verify an AWS SigV4-signed HTTP request.
///
/// The payload hash is taken from the `x-amz-content-sha256` header as declared
/// by the client; the body itself is not rehashed here.
///
/// # Errors
///
/// Returns an [`AuthError`] when the header is missing or malformed, the access
/// key is unknown, a signed header is absent, or the signature does not match.
pub async fn verify_sigv4(
    parts: &http::request::Parts,
    credential_provider: &dyn CredentialProvider,
) -> Result<AuthResult, AuthError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let parsed = parse_authorization_header(auth_header)?;
    let timestamp = extract_header_value(parts, AMZ_DATE_HEADER)?;
    let payload_hash = extract_header_value(parts, CONTENT_SHA256_HEADER)?;

    let credential = credential_provider
        .get_credential(&parsed.access_key_id)
        .await?;

    debug!(
        access_key_id = %parsed.access_key_id,
        date = %parsed.date,
        region = %parsed.region,
        service = %parsed.service,
        "Verifying SigV4 signature"
    );

    let signed_header_refs: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();
    let string_to_sign = string_to_sign_for(
        parts,
        &signed_header_refs,
        &timestamp,
        &parsed.credential_scope(),
        &payload_hash,
    )?;

    let signing_key = derive_signing_key(
        &credential.secret_key,
        &parsed.date,
        &parsed.region,
        &parsed.service,
    );
    let expected_signature = compute_signature(&signing_key, &string_to_sign);

    if parsed
        .signature
        .as_bytes()
        .ct_eq(expected_signature.as_bytes())
        .into()
    {
        debug!(access_key_id = %parsed.access_key_id, "Signature verification succeeded");
        Ok(AuthResult {
            access_key_id: parsed.access_key_id,
            display_name: credential.display_name,
            region: parsed.region,
            service: parsed.service,
            signed_headers: parsed.signed_headers,
        })
    } else {
        debug!(access_key_id = %parsed.access_key_id, "Signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

/// Compute the `Authorization` header value for a request.
///
/// The request must already carry `x-amz-date`, `x-amz-content-sha256` and every
/// header named in `params.signed_headers`.
///
/// # Errors
///
/// Returns [`AuthError::MissingHeader`] if a required header is absent.
#[cfg(any(test, feature = "test-util"))]
pub fn sign_request(
    parts: &http::request::Parts,
    params: &SigningParams<'_>,
) -> Result<String, AuthError> {
    let timestamp = extract_header_value(parts, AMZ_DATE_HEADER)?;
    let payload_hash = extract_header_value(parts, CONTENT_SHA256_HEADER)?;
    let date = timestamp.get(..8).ok_or(AuthError::InvalidAuthHeader)?;
    let credential_scope = format!(
        "{date}/{}/{}/aws4_request",
        params.region, params.service
    );

    let string_to_sign = string_to_sign_for(
        parts,
        params.signed_headers,
        &timestamp,
        &credential_scope,
        &payload_hash,
    )?;
    let signing_key = derive_signing_key(params.secret_key, date, params.region, params.service);
    let signature = compute_signature(&signing_key, &string_to_sign);

    Ok(format!(
        "{SUPPORTED_ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={}, Signature={signature}",
        params.access_key_id,
        crate::canonical::build_signed_headers_string(params.signed_headers),
    ))
}

/// Compute the SHA-256 hash of the given payload as a hex string.
///
/// # Examples
///
/// ```
/// use courier_s3_auth::sigv4::hash_payload;
///
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

fn string_to_sign_for(
    parts: &http::request::Parts,
    signed_headers: &[&str],
    timestamp: &str,
    credential_scope: &str,
    payload_hash: &str,
) -> Result<String, AuthError> {
    let header_values = collect_signed_headers(parts, signed_headers)?;
    let header_pairs: Vec<(&str, &str)> = signed_headers
        .iter()
        .copied()
        .zip(header_values.iter().map(String::as_str))
        .collect();

    let canonical_request = build_canonical_request(
        parts.method.as_str(),
        parts.uri.path(),
        parts.uri.query().unwrap_or(""),
        &header_pairs,
        payload_hash,
    );

    debug!(canonical_request, "Built canonical request");

    let canonical_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    Ok(build_string_to_sign(
        timestamp,
        credential_scope,
        &canonical_hash,
    ))
}

fn extract_header_value(parts: &http::request::Parts, name: &str) -> Result<String, AuthError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| AuthError::MissingHeader(name.to_owned()))?
        .to_str()
        .map(ToOwned::to_owned)
        .map_err(|_| AuthError::MissingHeader(name.to_owned()))
}

/// Collect the value of each signed header; repeated headers are joined with commas.
fn collect_signed_headers(
    parts: &http::request::Parts,
    signed_headers: &[&str],
) -> Result<Vec<String>, AuthError> {
    signed_headers
        .iter()
        .map(|&name| {
            let values = parts
                .headers
                .get_all(name)
                .iter()
                .map(|v| v.to_str().map(str::trim))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| AuthError::MissingHeader(name.to_owned()))?;
            if values.is_empty() {
                return Err(AuthError::MissingHeader(name.to_owned()));
            }
            Ok(values.join(","))
        })
        .collect()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
