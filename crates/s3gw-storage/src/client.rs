//! Surface of the S3-compatible backend client the gateway is built on.
//!
//! The wire protocol and request signing live behind [`BackendClient`]; the
//! gateway only sees the typed results and [`BackendError`] values below.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3gw_common::error::BackendResult;
use s3gw_common::types::CompletePart;
use tokio::io::{AsyncRead, AsyncSeek};
use url::Url;

use crate::config::Credentials;

/// Multi-valued header map keyed by canonical header names.
pub type HeaderMultimap = HashMap<String, Vec<String>>;

/// Byte source handed to upload calls.
pub type DataReader<'a> = &'a mut (dyn AsyncRead + Send + Unpin);

/// Seekable streaming handle over a stored object.
pub trait ObjectHandle: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T> ObjectHandle for T where T: AsyncRead + AsyncSeek + Send + Unpin {}

#[derive(Debug, Clone)]
pub struct BucketEntry {
    pub name: String,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub key: String,
    pub etag: String,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
    pub content_type: String,
    pub metadata: HeaderMultimap,
}

#[derive(Debug, Clone, Default)]
pub struct ListBucketResult {
    pub name: String,
    pub prefix: String,
    pub marker: String,
    pub next_marker: Option<String>,
    pub delimiter: String,
    pub max_keys: i32,
    pub is_truncated: bool,
    pub contents: Vec<ObjectStat>,
    pub common_prefixes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectPart {
    pub part_number: i32,
    pub etag: String,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ListObjectPartsResult {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub part_number_marker: i32,
    pub next_part_number_marker: i32,
    pub max_parts: i32,
    pub is_truncated: bool,
    pub encoding_type: String,
    pub parts: Vec<ObjectPart>,
}

#[derive(Debug, Clone)]
pub struct MultipartUpload {
    pub key: String,
    pub upload_id: String,
    pub initiated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ListMultipartUploadsResult {
    pub bucket: String,
    pub key_marker: String,
    pub upload_id_marker: String,
    pub next_key_marker: String,
    pub next_upload_id_marker: String,
    pub encoding_type: String,
    pub max_uploads: i32,
    pub is_truncated: bool,
    pub uploads: Vec<MultipartUpload>,
    pub prefix: String,
    pub delimiter: String,
    pub common_prefixes: Vec<String>,
}

#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn make_bucket(&self, bucket: &str, location: &str) -> BackendResult<()>;
    async fn bucket_exists(&self, bucket: &str) -> BackendResult<bool>;
    async fn list_buckets(&self) -> BackendResult<Vec<BucketEntry>>;
    async fn remove_bucket(&self, bucket: &str) -> BackendResult<()>;
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> BackendResult<ListBucketResult>;
    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<Box<dyn ObjectHandle>>;
    async fn stat_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectStat>;
    /// Streams `size` bytes from `data`; a negative size reads to end of stream.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        size: i64,
        data: DataReader<'_>,
        metadata: HeaderMultimap,
    ) -> BackendResult<ObjectStat>;
    /// `source` is `"{bucket}/{key}"`; empty `metadata` keeps the source's.
    async fn copy_object(
        &self,
        dst_bucket: &str,
        dst_key: &str,
        source: &str,
        metadata: HeaderMultimap,
    ) -> BackendResult<()>;
    async fn remove_object(&self, bucket: &str, key: &str) -> BackendResult<()>;
    async fn new_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: HeaderMultimap,
    ) -> BackendResult<String>;
    /// Empty `md5` / `sha256` slices mean no digest was supplied.
    #[allow(clippy::too_many_arguments)]
    async fn put_object_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        size: i64,
        data: DataReader<'_>,
        md5: &[u8],
        sha256: &[u8],
    ) -> BackendResult<ObjectPart>;
    async fn list_object_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: i32,
        max_parts: i32,
    ) -> BackendResult<ListObjectPartsResult>;
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletePart],
    ) -> BackendResult<String>;
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> BackendResult<()>;
    #[allow(clippy::too_many_arguments)]
    async fn list_multipart_uploads(
        &self,
        bucket: &str,
        prefix: &str,
        key_marker: &str,
        upload_id_marker: &str,
        delimiter: &str,
        max_uploads: i32,
    ) -> BackendResult<ListMultipartUploadsResult>;
}

/// Builds backend clients for an endpoint. `None` credentials request an
/// anonymous client. Implementations must fail when the endpoint cannot be
/// reached rather than hand back a client that errors on first use.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &Url,
        credentials: Option<&Credentials>,
    ) -> BackendResult<Arc<dyn BackendClient>>;
}
