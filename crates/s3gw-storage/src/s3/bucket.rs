use s3gw_common::error::{GatewayError, Result};
use s3gw_common::types::{BucketAccessPolicy, BucketInfo};
use tracing::debug;

use super::S3Gateway;
use super::errors::s3_to_object_error;
use crate::client::BucketEntry;

fn bucket_info_from_entry(entry: BucketEntry) -> BucketInfo {
    BucketInfo {
        name: entry.name,
        created: entry.creation_date,
    }
}

impl S3Gateway {
    pub async fn make_bucket(&self, location: &str, bucket: &str) -> Result<()> {
        debug!(bucket, location, "creating bucket on backend");
        self.client
            .make_bucket(bucket, location)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, None))
    }

    /// The backend has no stat-bucket call, so this scans the full bucket
    /// list on every call.
    pub async fn get_bucket_info(&self, bucket: &str) -> Result<BucketInfo> {
        let buckets = self
            .client
            .list_buckets()
            .await
            .map_err(|err| s3_to_object_error(err, bucket, None))?;

        buckets
            .into_iter()
            .find(|entry| entry.name == bucket)
            .map(bucket_info_from_entry)
            .ok_or_else(|| GatewayError::BucketNotFound {
                bucket: bucket.to_string(),
                source: None,
            })
    }

    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let buckets = self
            .client
            .list_buckets()
            .await
            .map_err(|err| s3_to_object_error(err, "", None))?;
        Ok(buckets.into_iter().map(bucket_info_from_entry).collect())
    }

    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        debug!(bucket, "removing bucket on backend");
        self.client
            .remove_bucket(bucket)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, None))
    }

    pub async fn set_bucket_policies(
        &self,
        _bucket: &str,
        _policies: Vec<BucketAccessPolicy>,
    ) -> Result<()> {
        Err(GatewayError::NotSupported("bucket policies"))
    }

    pub async fn get_bucket_policies(&self, _bucket: &str) -> Result<Vec<BucketAccessPolicy>> {
        Err(GatewayError::NotSupported("bucket policies"))
    }

    pub async fn delete_bucket_policies(&self, _bucket: &str) -> Result<()> {
        Err(GatewayError::NotSupported("bucket policies"))
    }
}
