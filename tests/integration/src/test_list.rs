//! ListObjects integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    async fn put(client: &aws_sdk_s3::Client, bucket: &str, key: &str) {
        client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from_static(b"x"))
            .send()
            .await
            .unwrap_or_else(|e| panic!("put {key}: {e}"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_with_prefix() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "list").await;
        for key in ["logs/a", "logs/b", "media/c"] {
            put(&client, &bucket, key).await;
        }

        let resp = client
            .list_objects()
            .bucket(&bucket)
            .prefix("logs/")
            .send()
            .await
            .expect("list_objects");
        let keys: Vec<_> = resp.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, vec!["logs/a", "logs/b"]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_page_with_marker() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "page").await;
        for key in ["a", "b", "c"] {
            put(&client, &bucket, key).await;
        }

        let first = client
            .list_objects()
            .bucket(&bucket)
            .max_keys(2)
            .send()
            .await
            .expect("first page");
        assert_eq!(first.is_truncated(), Some(true));
        assert_eq!(first.contents().len(), 2);

        let second = client
            .list_objects()
            .bucket(&bucket)
            .marker("b")
            .send()
            .await
            .expect("second page");
        let keys: Vec<_> = second.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, vec!["c"]);

        cleanup_bucket(&client, &bucket).await;
    }
}
