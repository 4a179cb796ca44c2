//! `ListObjects` (version 1) handler.

use courier_s3_model::input::ListObjectsInput;
use courier_s3_model::output::ListObjectsOutput;
use courier_s3_model::types::{ObjectEntry, Owner};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::{S3ServiceError, S3ServiceResult};
use crate::provider::{CourierS3, require_caller};
use crate::state::ListQuery;

/// Largest and default page size.
pub const MAX_KEYS_LIMIT: u32 = 1000;

/// Characters left as-is by `encoding-type=url`: RFC 3986 unreserved plus `/`.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

fn encode_key(key: &str, url_encoding: bool) -> String {
    if url_encoding {
        utf8_percent_encode(key, KEY_ENCODE_SET).to_string()
    } else {
        key.to_owned()
    }
}

impl CourierS3 {
    /// List complete objects in a bucket the caller owns.
    pub async fn handle_list_objects(
        &self,
        caller: Option<&Owner>,
        input: ListObjectsInput,
    ) -> S3ServiceResult<ListObjectsOutput> {
        let caller = require_caller(caller)?;

        let url_encoding = match input.encoding_type.as_deref() {
            None => false,
            Some(t) if t.eq_ignore_ascii_case("url") => true,
            Some(other) => {
                return Err(S3ServiceError::InvalidArgument {
                    message: format!("Invalid Encoding Method specified in Request: {other}"),
                });
            }
        };

        let bucket = self.owned_bucket(&input.bucket, caller).await?;

        let max_keys = input
            .max_keys
            .unwrap_or(MAX_KEYS_LIMIT)
            .clamp(1, MAX_KEYS_LIMIT);
        let prefix = input.prefix.unwrap_or_default();
        let marker = input.marker.unwrap_or_default();

        let query = ListQuery {
            prefix: prefix.clone(),
            marker: marker.clone(),
            max_keys: max_keys as usize,
        };
        let page = self.store.list_objects(&bucket.name, &query).await?;

        let contents = page
            .objects
            .into_iter()
            .map(|record| {
                let display_name = (record.owner == caller.id)
                    .then(|| caller.display_name.clone())
                    .flatten();
                ObjectEntry {
                    key: encode_key(&record.key, url_encoding),
                    last_modified: record.created_at,
                    etag: record.hash.unwrap_or_default(),
                    size: record.size,
                    owner: Owner {
                        id: record.owner,
                        display_name,
                    },
                }
            })
            .collect();

        Ok(ListObjectsOutput {
            name: bucket.name,
            prefix: encode_key(&prefix, url_encoding),
            marker: encode_key(&marker, url_encoding),
            max_keys,
            is_truncated: page.is_truncated,
            encoding_type: url_encoding.then(|| "url".to_owned()),
            contents,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use courier_s3_model::input::{CreateBucketInput, PutObjectInput};

    use super::*;
    use crate::provider::test_support::{alice, bob, provider};

    async fn seeded(keys: &[&str]) -> CourierS3 {
        let provider = provider();
        provider
            .handle_create_bucket(
                Some(&alice()),
                CreateBucketInput {
                    bucket: "listing".to_owned(),
                },
            )
            .await
            .unwrap();
        for key in keys {
            provider
                .handle_put_object(
                    Some(&alice()),
                    PutObjectInput {
                        bucket: "listing".to_owned(),
                        key: (*key).to_owned(),
                        body: Bytes::from_static(b"x"),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        provider
    }

    fn list(max_keys: Option<u32>) -> ListObjectsInput {
        ListObjectsInput {
            bucket: "listing".to_owned(),
            max_keys,
            ..Default::default()
        }
    }

    #[test]
    fn test_should_encode_keys_like_s3() {
        assert_eq!(encode_key("a b/c+d.txt", true), "a%20b/c%2Bd.txt");
        assert_eq!(encode_key("a b", false), "a b");
    }

    #[tokio::test]
    async fn test_should_list_in_key_order_with_owner() {
        let provider = seeded(&["b", "a", "c"]).await;
        let output = provider
            .handle_list_objects(Some(&alice()), list(None))
            .await
            .unwrap();

        let keys: Vec<_> = output.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(output.max_keys, 1000);
        assert!(!output.is_truncated);
        assert_eq!(output.contents[0].owner, alice());
        assert_eq!(output.contents[0].etag, crate::checksums::compute_md5(b"x"));
    }

    #[tokio::test]
    async fn test_should_page_with_marker() {
        let provider = seeded(&["a", "b", "c", "d"]).await;
        let first = provider
            .handle_list_objects(Some(&alice()), list(Some(2)))
            .await
            .unwrap();
        assert!(first.is_truncated);
        assert_eq!(first.contents.len(), 2);

        let second = provider
            .handle_list_objects(
                Some(&alice()),
                ListObjectsInput {
                    marker: Some("b".to_owned()),
                    ..list(Some(2))
                },
            )
            .await
            .unwrap();
        let keys: Vec<_> = second.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["c", "d"]);
        assert!(!second.is_truncated);
    }

    #[tokio::test]
    async fn test_should_clamp_max_keys() {
        let provider = seeded(&["a", "b"]).await;
        let output = provider
            .handle_list_objects(Some(&alice()), list(Some(0)))
            .await
            .unwrap();
        assert_eq!(output.max_keys, 1);
        assert_eq!(output.contents.len(), 1);

        let output = provider
            .handle_list_objects(Some(&alice()), list(Some(5000)))
            .await
            .unwrap();
        assert_eq!(output.max_keys, 1000);
    }

    #[tokio::test]
    async fn test_should_filter_by_prefix_and_encode() {
        let provider = seeded(&["docs/a b.txt", "docs/c.txt", "img/x.png"]).await;
        let output = provider
            .handle_list_objects(
                Some(&alice()),
                ListObjectsInput {
                    prefix: Some("docs/".to_owned()),
                    encoding_type: Some("url".to_owned()),
                    ..list(None)
                },
            )
            .await
            .unwrap();

        let keys: Vec<_> = output.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["docs/a%20b.txt", "docs/c.txt"]);
        assert_eq!(output.encoding_type.as_deref(), Some("url"));
    }

    #[tokio::test]
    async fn test_should_reject_unknown_encoding() {
        let provider = seeded(&[]).await;
        let err = provider
            .handle_list_objects(
                Some(&alice()),
                ListObjectsInput {
                    encoding_type: Some("base64".to_owned()),
                    ..list(None)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_should_hide_listing_from_other_users() {
        let provider = seeded(&["a"]).await;
        let err = provider
            .handle_list_objects(Some(&bob()), list(None))
            .await
            .unwrap_err();
        assert!(matches!(err, S3ServiceError::NoSuchBucket { .. }));
    }
}
