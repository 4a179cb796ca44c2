//! Error types for SigV4 authentication.
//!
//! All authentication failures are represented by [`AuthError`]. Callers that only
//! need to know which class of failure happened use [`AuthError::failure`].

/// Errors that can occur during AWS Signature Version 4 authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header is missing from the request.
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A required HTTP header referenced in `SignedHeaders` is missing.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `Credential` component does not match the expected format
    /// (`AKID/date/region/service/aws4_request`).
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key ID was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The credential store could not be queried.
    #[error("Credential lookup failed: {0}")]
    CredentialLookup(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}

/// The class of an authentication failure, as seen by request handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No credentials were presented; the caller may be treated as anonymous.
    MissingCredentials,
    /// The `Authorization` header or a header it references is malformed.
    MalformedHeader,
    /// The access key is not known to the credential store.
    UnknownAccessKey,
    /// The signature does not match the one computed by the server.
    SignatureMismatch,
    /// The credential store could not answer; says nothing about the caller.
    LookupFailed,
}

impl AuthError {
    /// Classify this error into its failure class.
    #[must_use]
    pub fn failure(&self) -> AuthFailure {
        match self {
            Self::MissingAuthHeader => AuthFailure::MissingCredentials,
            Self::InvalidAuthHeader
            | Self::UnsupportedAlgorithm(_)
            | Self::MissingHeader(_)
            | Self::InvalidCredential => AuthFailure::MalformedHeader,
            Self::AccessKeyNotFound(_) => AuthFailure::UnknownAccessKey,
            Self::CredentialLookup(_) => AuthFailure::LookupFailed,
            Self::SignatureDoesNotMatch => AuthFailure::SignatureMismatch,
        }
    }
}
