//! Error response integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ProvideErrorMetadata;

    use crate::{cleanup_bucket, create_test_bucket, s3_client, s3_client_with, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_no_such_bucket() {
        let client = s3_client();
        let err = client
            .list_objects()
            .bucket(test_bucket_name("missing"))
            .send()
            .await
            .expect_err("missing bucket");
        assert!(err.into_service_error().is_no_such_bucket());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_no_such_key() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "nokey").await;

        let err = client
            .get_object()
            .bucket(&bucket)
            .key("absent")
            .send()
            .await
            .expect_err("missing key");
        assert!(err.into_service_error().is_no_such_key());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_wrong_secret() {
        let client = s3_client_with("test", "not-the-secret");
        let err = client
            .create_bucket()
            .bucket(test_bucket_name("badsig"))
            .send()
            .await
            .expect_err("bad signature");
        assert_eq!(
            err.into_service_error().meta().code(),
            Some("SignatureDoesNotMatch")
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_access_key() {
        let client = s3_client_with("nobody", "whatever");
        let err = client
            .list_buckets()
            .send()
            .await
            .expect_err("unknown key");
        assert_eq!(
            err.into_service_error().meta().code(),
            Some("InvalidAccessKeyId")
        );
    }
}
