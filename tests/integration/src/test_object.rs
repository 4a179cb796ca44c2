//! Object integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, md5_hex, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_and_get_object() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "obj").await;

        let put = client
            .put_object()
            .bucket(&bucket)
            .key("hello.txt")
            .content_type("text/plain")
            .body(ByteStream::from_static(b"hello"))
            .send()
            .await
            .expect("put_object");
        assert_eq!(put.e_tag(), Some("\"5d41402abc4b2a76b9719d911017c592\""));

        let get = client
            .get_object()
            .bucket(&bucket)
            .key("hello.txt")
            .send()
            .await
            .expect("get_object");
        assert_eq!(get.content_length(), Some(5));
        assert_eq!(get.content_type(), Some("text/plain"));
        let body = get.body.collect().await.expect("read body").into_bytes();
        assert_eq!(body.as_ref(), b"hello");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_stream_object_larger_than_one_chunk() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "large").await;

        // Three and a half transport chunks.
        let data: Vec<u8> = (0..(3 * 1024 * 1024 + 512 * 1024))
            .map(|i: u32| (i % 251) as u8)
            .collect();
        client
            .put_object()
            .bucket(&bucket)
            .key("large.bin")
            .body(ByteStream::from(data.clone()))
            .send()
            .await
            .expect("put_object");

        let get = client
            .get_object()
            .bucket(&bucket)
            .key("large.bin")
            .send()
            .await
            .expect("get_object");
        assert_eq!(get.e_tag(), Some(format!("\"{}\"", md5_hex(&data)).as_str()));
        let body = get.body.collect().await.expect("read body").into_bytes();
        assert_eq!(body.len(), data.len());
        assert!(body.as_ref() == data.as_slice());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_head_object() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "head").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("doc.bin")
            .body(ByteStream::from_static(&[0u8; 64]))
            .send()
            .await
            .expect("put_object");

        let head = client
            .head_object()
            .bucket(&bucket)
            .key("doc.bin")
            .send()
            .await
            .expect("head_object");
        assert_eq!(head.content_length(), Some(64));
        assert!(head.last_modified().is_some());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_object_idempotently() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "rm").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("gone.txt")
            .body(ByteStream::from_static(b"bye"))
            .send()
            .await
            .expect("put_object");

        for _ in 0..2 {
            client
                .delete_object()
                .bucket(&bucket)
                .key("gone.txt")
                .send()
                .await
                .expect("delete_object");
        }

        let err = client
            .get_object()
            .bucket(&bucket)
            .key("gone.txt")
            .send()
            .await
            .expect_err("deleted object");
        assert!(err.into_service_error().is_no_such_key());

        cleanup_bucket(&client, &bucket).await;
    }
}
