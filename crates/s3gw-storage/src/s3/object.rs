use std::collections::HashMap;
use std::io::SeekFrom;

use s3gw_common::error::{BackendError, GatewayError, Result};
use s3gw_common::types::{ListObjectsInfo, ObjectInfo};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

use super::S3Gateway;
use super::errors::s3_to_object_error;
use super::metadata::{from_backend_metadata, to_backend_metadata};
use crate::client::{DataReader, ListBucketResult, ObjectHandle, ObjectStat};
use crate::hash_reader::HashReader;
use crate::traits::DataWriter;

/// Pseudo-metadata some callers attach; never forwarded to the backend.
const MD5_SUM_KEY: &str = "md5Sum";
const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_ENCODING: &str = "Content-Encoding";

pub(crate) fn object_info_from_stat(bucket: &str, stat: ObjectStat) -> ObjectInfo {
    let mut metadata = from_backend_metadata(&stat.metadata);
    metadata.insert(CONTENT_TYPE.to_string(), stat.content_type.clone());
    let content_encoding = metadata
        .get(CONTENT_ENCODING)
        .cloned()
        .unwrap_or_default();

    ObjectInfo {
        bucket: bucket.to_string(),
        key: stat.key,
        size: stat.size,
        etag: stat.etag,
        content_type: stat.content_type,
        content_encoding,
        last_modified: stat.last_modified,
        metadata,
    }
}

pub(crate) fn list_objects_info_from_result(
    bucket: &str,
    result: ListBucketResult,
) -> ListObjectsInfo {
    ListObjectsInfo {
        is_truncated: result.is_truncated,
        next_marker: result.next_marker,
        prefix: result.prefix,
        prefixes: result.common_prefixes,
        objects: result
            .contents
            .into_iter()
            .map(|stat| object_info_from_stat(bucket, stat))
            .collect(),
    }
}

/// Copies `length` bytes starting at `offset` out of `handle`. A source that
/// runs dry before `length` bytes is an error, never a short success.
pub(crate) async fn copy_object_range(
    mut handle: Box<dyn ObjectHandle>,
    bucket: &str,
    key: &str,
    offset: u64,
    length: u64,
    writer: DataWriter<'_>,
) -> Result<()> {
    handle.seek(SeekFrom::Start(offset)).await?;

    let mut limited = (&mut handle).take(length);
    let copied = tokio::io::copy(&mut limited, &mut *writer).await?;
    if copied < length {
        return Err(GatewayError::IncompleteRead {
            bucket: bucket.to_string(),
            object: key.to_string(),
            expected: length,
            actual: copied,
        });
    }

    writer.flush().await?;
    Ok(())
}

impl S3Gateway {
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> Result<ListObjectsInfo> {
        let result = self
            .client
            .list_objects(bucket, prefix, marker, delimiter, max_keys)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, None))?;
        Ok(list_objects_info_from_result(bucket, result))
    }

    pub async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
        writer: DataWriter<'_>,
    ) -> Result<()> {
        debug!(bucket, key, offset, length, "reading object range");
        let handle = self
            .client
            .get_object(bucket, key)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        copy_object_range(handle, bucket, key, offset, length, writer).await
    }

    pub async fn get_object_info(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let stat = self
            .client
            .stat_object(bucket, key)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        Ok(object_info_from_stat(bucket, stat))
    }

    /// Streams `data` to the backend. With a non-empty `sha256_hex` the bytes
    /// are hashed on the way through; a mismatch removes the written object
    /// (best effort) and fails with [`GatewayError::ChecksumMismatch`].
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        size: i64,
        data: DataReader<'_>,
        mut metadata: HashMap<String, String>,
        sha256_hex: &str,
    ) -> Result<ObjectInfo> {
        metadata.remove(MD5_SUM_KEY);
        let backend_metadata = to_backend_metadata(&metadata);
        debug!(bucket, key, size, verify = !sha256_hex.is_empty(), "writing object");

        let computed = if sha256_hex.is_empty() {
            self.client
                .put_object(bucket, key, size, data, backend_metadata)
                .await
                .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
            None
        } else {
            let mut reader = HashReader::new(data);
            self.client
                .put_object(bucket, key, size, &mut reader, backend_metadata)
                .await
                .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
            debug!(bucket, key, hashed = reader.bytes_read(), "payload hashed");
            Some(reader.sha256_hex())
        };

        if let Some(computed) = computed
            && !computed.eq_ignore_ascii_case(sha256_hex)
        {
            if let Err(err) = self.client.remove_object(bucket, key).await {
                warn!(bucket, key, error = %err, "failed to remove object after sha256 mismatch");
            }
            return Err(GatewayError::ChecksumMismatch {
                expected: sha256_hex.to_string(),
                computed,
            });
        }

        self.get_object_info(bucket, key).await
    }

    pub async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        metadata: HashMap<String, String>,
    ) -> Result<ObjectInfo> {
        let source = format!("{src_bucket}/{src_key}");
        debug!(source = %source, dst_bucket, dst_key, "copying object on backend");
        self.client
            .copy_object(dst_bucket, dst_key, &source, to_backend_metadata(&metadata))
            .await
            .map_err(|err| {
                // Failures default to the source; a response naming the
                // destination bucket is reported against the destination.
                let names_destination = src_bucket != dst_bucket
                    && matches!(
                        &err,
                        BackendError::Response(resp) if resp.bucket_name == dst_bucket
                    );
                if names_destination {
                    s3_to_object_error(err, dst_bucket, Some(dst_key))
                } else {
                    s3_to_object_error(err, src_bucket, Some(src_key))
                }
            })?;

        self.get_object_info(dst_bucket, dst_key).await
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .remove_object(bucket, key)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{list_objects_info_from_result, object_info_from_stat};
    use crate::client::{ListBucketResult, ObjectStat};

    fn stat(key: &str, metadata: &[(&str, &str)]) -> ObjectStat {
        ObjectStat {
            key: key.to_string(),
            etag: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            size: 42,
            last_modified: Utc::now(),
            content_type: "image/jpeg".to_string(),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), vec![v.to_string()]))
                .collect(),
        }
    }

    #[test]
    fn content_type_is_merged_into_metadata() {
        let info = object_info_from_stat(
            "photos",
            stat("a.jpg", &[("x-amz-meta-owner", "ops"), ("content-encoding", "gzip")]),
        );

        assert_eq!(info.bucket, "photos");
        assert_eq!(info.key, "a.jpg");
        assert_eq!(info.size, 42);
        assert_eq!(info.content_type, "image/jpeg");
        assert_eq!(info.content_encoding, "gzip");
        assert_eq!(info.metadata["Content-Type"], "image/jpeg");
        assert_eq!(info.metadata["X-Amz-Meta-Owner"], "ops");
    }

    #[test]
    fn top_level_content_type_wins_over_metadata_entry() {
        let info = object_info_from_stat("b", stat("k", &[("content-type", "text/plain")]));
        assert_eq!(info.metadata["Content-Type"], "image/jpeg");
        assert_eq!(info.content_encoding, "");
    }

    #[test]
    fn list_result_is_mapped_losslessly() {
        let result = ListBucketResult {
            name: "photos".to_string(),
            prefix: "photos/".to_string(),
            next_marker: Some("opaque-token".to_string()),
            delimiter: "/".to_string(),
            is_truncated: true,
            contents: vec![stat("photos/a.jpg", &[])],
            common_prefixes: vec!["photos/sub/".to_string()],
            ..ListBucketResult::default()
        };

        let info = list_objects_info_from_result("photos", result);
        assert!(info.is_truncated);
        assert_eq!(info.next_marker.as_deref(), Some("opaque-token"));
        assert_eq!(info.prefix, "photos/");
        assert_eq!(info.prefixes, vec!["photos/sub/".to_string()]);
        assert_eq!(info.objects.len(), 1);
        assert_eq!(info.objects[0].bucket, "photos");
        assert!(info.objects[0].metadata.contains_key("Content-Type"));
    }
}
