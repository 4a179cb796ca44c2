//! Request validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::S3ServiceError;

static BUCKET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-z0-9_-]{1,255}$").expect("Failed to compile bucket name regex")
});

/// Largest accepted part number.
pub const MAX_PART_NUMBER: u32 = 10_000;

/// Validate a bucket name: 1 to 255 characters from `a-z`, `0-9`, `_` and `-`.
///
/// # Errors
///
/// Returns [`S3ServiceError::InvalidBucketName`] for any other name.
///
/// # Examples
///
/// ```
/// use courier_s3_core::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my-bucket").is_ok());
/// assert!(validate_bucket_name("My-Bucket").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), S3ServiceError> {
    if BUCKET_NAME.is_match(name) {
        Ok(())
    } else {
        Err(S3ServiceError::InvalidBucketName {
            name: name.to_owned(),
        })
    }
}

/// Validate an object key.
///
/// # Errors
///
/// Returns [`S3ServiceError::InvalidArgument`] for an empty key.
pub fn validate_object_key(key: &str) -> Result<(), S3ServiceError> {
    if key.is_empty() {
        return Err(S3ServiceError::InvalidArgument {
            message: "Object key must not be empty".to_owned(),
        });
    }
    Ok(())
}

/// Validate a part number.
///
/// # Errors
///
/// Returns [`S3ServiceError::InvalidArgument`] outside `1..=10000`.
pub fn validate_part_number(part_number: u32) -> Result<(), S3ServiceError> {
    if (1..=MAX_PART_NUMBER).contains(&part_number) {
        Ok(())
    } else {
        Err(S3ServiceError::InvalidArgument {
            message: format!(
                "Part number must be an integer between 1 and {MAX_PART_NUMBER}, inclusive"
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_reject_uppercase_bucket_name() {
        assert!(validate_bucket_name("My-Bucket").is_err());
    }

    #[test]
    fn test_should_accept_valid_bucket_names() {
        let longest = "b".repeat(255);
        for name in ["my-bucket", "a", "under_score", "123", longest.as_str()] {
            assert!(validate_bucket_name(name).is_ok(), "expected valid: {name}");
        }
    }

    #[test]
    fn test_should_reject_invalid_bucket_names() {
        let too_long = "a".repeat(256);
        for name in ["", "has.dot", "space here", "ünï", too_long.as_str()] {
            assert!(validate_bucket_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn test_should_validate_part_numbers() {
        assert!(validate_part_number(1).is_ok());
        assert!(validate_part_number(10_000).is_ok());
        assert!(validate_part_number(0).is_err());
        assert!(validate_part_number(10_001).is_err());
    }

    #[test]
    fn test_should_reject_empty_key() {
        assert!(validate_object_key("").is_err());
        assert!(validate_object_key("a/b.txt").is_ok());
    }
}
