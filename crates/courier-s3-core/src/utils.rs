//! Identifier generation.

use uuid::Uuid;

/// Generate an upload id for a multipart upload (a hyphenated UUID v4).
///
/// # Examples
///
/// ```
/// use courier_s3_core::utils::generate_upload_id;
///
/// let id = generate_upload_id();
/// assert_eq!(id.len(), 36);
/// ```
#[must_use]
pub fn generate_upload_id() -> String {
    Uuid::new_v4().to_string()
}
