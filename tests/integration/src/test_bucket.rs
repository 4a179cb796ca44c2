//! Bucket integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::PublicAccessBlockConfiguration;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_list_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "create").await;

        let resp = client.list_buckets().send().await.expect("list_buckets");
        assert!(
            resp.buckets().iter().any(|b| b.name() == Some(bucket.as_str())),
            "new bucket should be listed"
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_duplicate_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "dup").await;

        let err = client
            .create_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect_err("duplicate bucket must fail");
        assert!(err.into_service_error().is_bucket_already_exists());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_location_and_versioning() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "loc").await;

        client
            .get_bucket_location()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_location");

        let versioning = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_versioning");
        assert!(versioning.status().is_none_or(|s| s.as_str() == "Disabled"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_accept_public_access_block() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "pab").await;

        client
            .put_public_access_block()
            .bucket(&bucket)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(true)
                    .build(),
            )
            .send()
            .await
            .expect("put_public_access_block");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_empty_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "del").await;

        client
            .delete_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("delete_bucket");

        let resp = client.list_buckets().send().await.expect("list_buckets");
        assert!(!resp.buckets().iter().any(|b| b.name() == Some(bucket.as_str())));
    }
}
