//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ProvideErrorMetadata;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
    use md5::{Digest, Md5};

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_complete_multipart_upload() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("multipart.bin")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = create.upload_id().expect("upload_id");

        let part1_data = vec![0xAAu8; 1024];
        let part1 = client
            .upload_part()
            .bucket(&bucket)
            .key("multipart.bin")
            .upload_id(upload_id)
            .part_number(1)
            .body(ByteStream::from(part1_data.clone()))
            .send()
            .await
            .expect("upload part 1");

        let part2_data = vec![0xBBu8; 1024];
        let part2 = client
            .upload_part()
            .bucket(&bucket)
            .key("multipart.bin")
            .upload_id(upload_id)
            .part_number(2)
            .body(ByteStream::from(part2_data.clone()))
            .send()
            .await
            .expect("upload part 2");

        let completed = CompletedMultipartUpload::builder()
            .parts(
                CompletedPart::builder()
                    .part_number(1)
                    .e_tag(part1.e_tag().unwrap_or_default())
                    .build(),
            )
            .parts(
                CompletedPart::builder()
                    .part_number(2)
                    .e_tag(part2.e_tag().unwrap_or_default())
                    .build(),
            )
            .build();

        let complete = client
            .complete_multipart_upload()
            .bucket(&bucket)
            .key("multipart.bin")
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .expect("complete_multipart_upload");

        // MD5 over the concatenated binary part digests, suffixed with the part count.
        let mut hasher = Md5::new();
        hasher.update(Md5::digest(&part1_data));
        hasher.update(Md5::digest(&part2_data));
        let expected = format!("\"{}-2\"", hex::encode(hasher.finalize()));
        assert_eq!(complete.e_tag(), Some(expected.as_str()));

        let get = client
            .get_object()
            .bucket(&bucket)
            .key("multipart.bin")
            .send()
            .await
            .expect("get_object");
        let body = get.body.collect().await.expect("read body").into_bytes();
        assert_eq!(body.len(), 2048);
        assert_eq!(&body[..1024], part1_data.as_slice());
        assert_eq!(&body[1024..], part2_data.as_slice());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_abort_multipart_upload() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "abort").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("aborted.bin")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = create.upload_id().expect("upload_id");

        client
            .upload_part()
            .bucket(&bucket)
            .key("aborted.bin")
            .upload_id(upload_id)
            .part_number(1)
            .body(ByteStream::from_static(b"partial"))
            .send()
            .await
            .expect("upload part");

        client
            .abort_multipart_upload()
            .bucket(&bucket)
            .key("aborted.bin")
            .upload_id(upload_id)
            .send()
            .await
            .expect("abort_multipart_upload");

        let err = client
            .upload_part()
            .bucket(&bucket)
            .key("aborted.bin")
            .upload_id(upload_id)
            .part_number(2)
            .body(ByteStream::from_static(b"late"))
            .send()
            .await
            .expect_err("aborted upload");
        assert_eq!(
            err.into_service_error().meta().code(),
            Some("NoSuchUpload")
        );

        cleanup_bucket(&client, &bucket).await;
    }
}
