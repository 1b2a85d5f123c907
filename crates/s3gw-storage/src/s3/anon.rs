use chrono::{DateTime, Utc};
use s3gw_common::error::{GatewayError, Result};
use s3gw_common::types::{BucketInfo, ListObjectsInfo, ObjectInfo};

use super::S3Gateway;
use super::errors::s3_to_object_error;
use super::object::{copy_object_range, list_objects_info_from_result, object_info_from_stat};
use crate::traits::DataWriter;

// Anonymous requests go through the unauthenticated client, so whatever the
// backend lets the public see is all these calls can reach.
impl S3Gateway {
    /// The anonymous client cannot list buckets, so only existence is known
    /// and the creation time is reported as the Unix epoch.
    pub async fn anon_get_bucket_info(&self, bucket: &str) -> Result<BucketInfo> {
        let exists = self
            .anon_client
            .bucket_exists(bucket)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, None))?;
        if !exists {
            return Err(GatewayError::BucketNotFound {
                bucket: bucket.to_string(),
                source: None,
            });
        }

        Ok(BucketInfo {
            name: bucket.to_string(),
            created: DateTime::<Utc>::UNIX_EPOCH,
        })
    }

    pub async fn anon_list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> Result<ListObjectsInfo> {
        let result = self
            .anon_client
            .list_objects(bucket, prefix, marker, delimiter, max_keys)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, None))?;
        Ok(list_objects_info_from_result(bucket, result))
    }

    pub async fn anon_get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
        writer: DataWriter<'_>,
    ) -> Result<()> {
        let handle = self
            .anon_client
            .get_object(bucket, key)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        copy_object_range(handle, bucket, key, offset, length, writer).await
    }

    pub async fn anon_get_object_info(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let stat = self
            .anon_client
            .stat_object(bucket, key)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        Ok(object_info_from_stat(bucket, stat))
    }
}
