use std::collections::HashMap;

use async_trait::async_trait;
use s3gw_common::error::Result;
use s3gw_common::types::{
    BucketAccessPolicy, BucketInfo, CompletePart, ListMultipartsInfo, ListObjectsInfo,
    ListPartsInfo, ObjectInfo, PartInfo,
};
use tokio::io::AsyncWrite;

use crate::client::DataReader;

/// Destination for object reads.
pub type DataWriter<'a> = &'a mut (dyn AsyncWrite + Send + Unpin);

#[async_trait]
pub trait GatewayLayer: Send + Sync {
    async fn make_bucket(&self, location: &str, bucket: &str) -> Result<()>;
    async fn get_bucket_info(&self, bucket: &str) -> Result<BucketInfo>;
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> Result<ListObjectsInfo>;
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
        writer: DataWriter<'_>,
    ) -> Result<()>;
    async fn get_object_info(&self, bucket: &str, key: &str) -> Result<ObjectInfo>;
    #[allow(clippy::too_many_arguments)]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        size: i64,
        data: DataReader<'_>,
        metadata: HashMap<String, String>,
        sha256_hex: &str,
    ) -> Result<ObjectInfo>;
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        metadata: HashMap<String, String>,
    ) -> Result<ObjectInfo>;
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    async fn new_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String>;
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<PartInfo>;
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<PartInfo>;
    async fn list_object_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: i32,
        max_parts: i32,
    ) -> Result<ListPartsInfo>;
    async fn abort_multipart_upload(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()>;
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletePart>,
    ) -> Result<ObjectInfo>;
    #[allow(clippy::too_many_arguments)]
    async fn list_multipart_uploads(
        &self,
        bucket: &str,
        prefix: &str,
        key_marker: &str,
        upload_id_marker: &str,
        delimiter: &str,
        max_uploads: i32,
    ) -> Result<ListMultipartsInfo>;

    async fn set_bucket_policies(
        &self,
        bucket: &str,
        policies: Vec<BucketAccessPolicy>,
    ) -> Result<()>;
    async fn get_bucket_policies(&self, bucket: &str) -> Result<Vec<BucketAccessPolicy>>;
    async fn delete_bucket_policies(&self, bucket: &str) -> Result<()>;
}
