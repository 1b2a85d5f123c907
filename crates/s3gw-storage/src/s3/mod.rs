//! Gateway onto a remote S3-compatible backend.

mod anon;
mod bucket;
pub mod errors;
pub mod metadata;
mod multipart;
mod object;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use s3gw_common::error::Result;
use s3gw_common::types::{
    BucketAccessPolicy, BucketInfo, CompletePart, ListMultipartsInfo, ListObjectsInfo,
    ListPartsInfo, ObjectInfo, PartInfo,
};
use tracing::info;

use crate::client::{BackendClient, Connector, DataReader};
use crate::config::GatewayConfig;
use crate::traits::{DataWriter, GatewayLayer};

pub use errors::s3_to_object_error;

#[derive(Clone)]
pub struct S3Gateway {
    client: Arc<dyn BackendClient>,
    anon_client: Arc<dyn BackendClient>,
}

impl fmt::Debug for S3Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Gateway").finish_non_exhaustive()
    }
}

impl S3Gateway {
    /// Connects an authenticated and an anonymous client to the configured
    /// endpoint. Fails if either connection cannot be established.
    pub async fn new(config: &GatewayConfig, connector: &dyn Connector) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let credentials = config.credentials();

        let client = connector.connect(&endpoint, credentials.as_ref()).await?;
        let anon_client = connector.connect(&endpoint, None).await?;

        info!(
            endpoint = %endpoint,
            authenticated = credentials.is_some(),
            "s3 gateway connected to backend"
        );
        Ok(Self::from_clients(client, anon_client))
    }

    pub fn from_clients(
        client: Arc<dyn BackendClient>,
        anon_client: Arc<dyn BackendClient>,
    ) -> Self {
        Self {
            client,
            anon_client,
        }
    }
}

#[async_trait]
impl GatewayLayer for S3Gateway {
    async fn make_bucket(&self, location: &str, bucket: &str) -> Result<()> {
        S3Gateway::make_bucket(self, location, bucket).await
    }

    async fn get_bucket_info(&self, bucket: &str) -> Result<BucketInfo> {
        S3Gateway::get_bucket_info(self, bucket).await
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        S3Gateway::list_buckets(self).await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        S3Gateway::delete_bucket(self, bucket).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> Result<ListObjectsInfo> {
        S3Gateway::list_objects(self, bucket, prefix, marker, delimiter, max_keys).await
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
        writer: DataWriter<'_>,
    ) -> Result<()> {
        S3Gateway::get_object(self, bucket, key, offset, length, writer).await
    }

    async fn get_object_info(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        S3Gateway::get_object_info(self, bucket, key).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        size: i64,
        data: DataReader<'_>,
        metadata: HashMap<String, String>,
        sha256_hex: &str,
    ) -> Result<ObjectInfo> {
        S3Gateway::put_object(self, bucket, key, size, data, metadata, sha256_hex).await
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        metadata: HashMap<String, String>,
    ) -> Result<ObjectInfo> {
        S3Gateway::copy_object(self, src_bucket, src_key, dst_bucket, dst_key, metadata).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        S3Gateway::delete_object(self, bucket, key).await
    }

    async fn new_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String> {
        S3Gateway::new_multipart_upload(self, bucket, key, metadata).await
    }

    async fn copy_object_part(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        upload_id: &str,
        part_number: i32,
        offset: u64,
        length: u64,
    ) -> Result<PartInfo> {
        S3Gateway::copy_object_part(
            self,
            src_bucket,
            src_key,
            dst_bucket,
            dst_key,
            upload_id,
            part_number,
            offset,
            length,
        )
        .await
    }

    async fn put_object_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        size: i64,
        data: DataReader<'_>,
        md5_hex: &str,
        sha256_hex: &str,
    ) -> Result<PartInfo> {
        S3Gateway::put_object_part(
            self,
            bucket,
            key,
            upload_id,
            part_number,
            size,
            data,
            md5_hex,
            sha256_hex,
        )
        .await
    }

    async fn list_object_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: i32,
        max_parts: i32,
    ) -> Result<ListPartsInfo> {
        S3Gateway::list_object_parts(self, bucket, key, upload_id, part_number_marker, max_parts)
            .await
    }

    async fn abort_multipart_upload(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()> {
        S3Gateway::abort_multipart_upload(self, bucket, key, upload_id).await
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletePart>,
    ) -> Result<ObjectInfo> {
        S3Gateway::complete_multipart_upload(self, bucket, key, upload_id, parts).await
    }

    async fn list_multipart_uploads(
        &self,
        bucket: &str,
        prefix: &str,
        key_marker: &str,
        upload_id_marker: &str,
        delimiter: &str,
        max_uploads: i32,
    ) -> Result<ListMultipartsInfo> {
        S3Gateway::list_multipart_uploads(
            self,
            bucket,
            prefix,
            key_marker,
            upload_id_marker,
            delimiter,
            max_uploads,
        )
        .await
    }

    async fn set_bucket_policies(
        &self,
        bucket: &str,
        policies: Vec<BucketAccessPolicy>,
    ) -> Result<()> {
        S3Gateway::set_bucket_policies(self, bucket, policies).await
    }

    async fn get_bucket_policies(&self, bucket: &str) -> Result<Vec<BucketAccessPolicy>> {
        S3Gateway::get_bucket_policies(self, bucket).await
    }

    async fn delete_bucket_policies(&self, bucket: &str) -> Result<()> {
        S3Gateway::delete_bucket_policies(self, bucket).await
    }
}
