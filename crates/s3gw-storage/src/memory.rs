//! In-memory S3-compatible backend.
//!
//! Mirrors the error codes and listing rules of a real S3 endpoint closely
//! enough to drive the gateway in tests and local development.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use s3gw_common::error::{BackendError, BackendResult, ErrorResponse};
use s3gw_common::time::now;
use s3gw_common::types::CompletePart;
use sha2::Sha256;
use tokio::io::AsyncReadExt;
use url::Url;
use uuid::Uuid;

use crate::client::{
    BackendClient, BucketEntry, Connector, DataReader, HeaderMultimap, ListBucketResult,
    ListMultipartUploadsResult, ListObjectPartsResult, MultipartUpload, ObjectHandle,
    ObjectPart, ObjectStat,
};
use crate::config::Credentials;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const CONTENT_TYPE: &str = "Content-Type";
const DEFAULT_MAX_KEYS: usize = 1000;
const MAX_PART_NUMBER: i32 = 10_000;
const MAX_OBJECT_KEY_LEN: usize = 1024;

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    buckets: BTreeMap<String, MemBucket>,
}

#[derive(Debug)]
struct MemBucket {
    created: DateTime<Utc>,
    public_read: bool,
    objects: BTreeMap<String, MemObject>,
    uploads: BTreeMap<String, MemUpload>,
}

#[derive(Debug, Clone)]
struct MemObject {
    data: Bytes,
    etag: String,
    content_type: String,
    last_modified: DateTime<Utc>,
    metadata: HeaderMultimap,
}

#[derive(Debug)]
struct MemUpload {
    key: String,
    initiated: DateTime<Utc>,
    metadata: HeaderMultimap,
    parts: BTreeMap<i32, MemPart>,
}

#[derive(Debug, Clone)]
struct MemPart {
    data: Bytes,
    md5: Vec<u8>,
    etag: String,
    last_modified: DateTime<Utc>,
}

impl MemObject {
    fn new(data: Bytes, etag: String, mut metadata: HeaderMultimap) -> Self {
        let content_type = metadata
            .remove(CONTENT_TYPE)
            .and_then(|values| values.into_iter().next())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        Self {
            data,
            etag,
            content_type,
            last_modified: now(),
            metadata,
        }
    }

    fn stat(&self, key: &str) -> ObjectStat {
        ObjectStat {
            key: key.to_string(),
            etag: self.etag.clone(),
            size: self.data.len() as i64,
            last_modified: self.last_modified,
            content_type: self.content_type.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Authenticated client over this store.
    pub fn client(self: &Arc<Self>) -> MemoryClient {
        MemoryClient {
            store: Arc::clone(self),
            anonymous: false,
        }
    }

    /// Client restricted to reads on public buckets.
    pub fn anonymous_client(self: &Arc<Self>) -> MemoryClient {
        MemoryClient {
            store: Arc::clone(self),
            anonymous: true,
        }
    }

    /// Opens a bucket to anonymous reads. This is backend-side setup, not a
    /// gateway policy operation.
    pub fn set_public_read(&self, bucket: &str, public_read: bool) -> BackendResult<()> {
        let mut state = self.write()?;
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.public_read = public_read;
        Ok(())
    }

    fn read(&self) -> BackendResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| internal_error("memory store lock poisoned"))
    }

    fn write(&self) -> BackendResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| internal_error("memory store lock poisoned"))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryClient {
    store: Arc<MemoryStore>,
    anonymous: bool,
}

impl MemoryClient {
    fn deny_anonymous(&self, bucket: &str, key: &str) -> BackendResult<()> {
        if self.anonymous {
            return Err(access_denied(bucket, key));
        }
        Ok(())
    }

    fn readable_bucket<'a>(
        &self,
        state: &'a StoreState,
        bucket: &str,
        key: &str,
    ) -> BackendResult<&'a MemBucket> {
        let entry = state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        if self.anonymous && !entry.public_read {
            return Err(access_denied(bucket, key));
        }
        Ok(entry)
    }

    fn upload_exists(&self, bucket: &str, key: &str, upload_id: &str) -> BackendResult<()> {
        let state = self.store.read()?;
        find_upload(&state, bucket, key, upload_id).map(|_| ())
    }
}

#[async_trait]
impl BackendClient for MemoryClient {
    async fn make_bucket(&self, bucket: &str, _location: &str) -> BackendResult<()> {
        self.deny_anonymous(bucket, "")?;
        validate_bucket_name(bucket)?;

        let mut state = self.store.write()?;
        if state.buckets.contains_key(bucket) {
            return Err(error_response(
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded and you already own it.",
                bucket,
                "",
            ));
        }
        state.buckets.insert(
            bucket.to_string(),
            MemBucket {
                created: now(),
                public_read: false,
                objects: BTreeMap::new(),
                uploads: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> BackendResult<bool> {
        let state = self.store.read()?;
        match self.readable_bucket(&state, bucket, "") {
            Ok(_) => Ok(true),
            Err(err) if err.code() == Some("NoSuchBucket") => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn list_buckets(&self) -> BackendResult<Vec<BucketEntry>> {
        self.deny_anonymous("", "")?;
        let state = self.store.read()?;
        Ok(state
            .buckets
            .iter()
            .map(|(name, entry)| BucketEntry {
                name: name.clone(),
                creation_date: entry.created,
            })
            .collect())
    }

    async fn remove_bucket(&self, bucket: &str) -> BackendResult<()> {
        self.deny_anonymous(bucket, "")?;
        let mut state = self.store.write()?;
        let entry = state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        if !entry.objects.is_empty() {
            return Err(error_response(
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty",
                bucket,
                "",
            ));
        }
        state.buckets.remove(bucket);
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i32,
    ) -> BackendResult<ListBucketResult> {
        let state = self.store.read()?;
        let entry = self.readable_bucket(&state, bucket, "")?;
        let limit = page_limit(max_keys);

        let mut contents = Vec::new();
        let mut common_prefixes: Vec<String> = Vec::new();
        let mut last_marker: Option<String> = None;
        let mut is_truncated = false;

        for (key, object) in entry.objects.iter() {
            if !key.starts_with(prefix) || (!marker.is_empty() && key.as_str() <= marker) {
                continue;
            }

            let rolled_up = common_prefix(key, prefix, delimiter);
            if let Some(common) = &rolled_up
                && (common.as_str() <= marker || common_prefixes.last() == Some(common))
            {
                continue;
            }

            if contents.len() + common_prefixes.len() == limit {
                is_truncated = true;
                break;
            }

            match rolled_up {
                Some(common) => {
                    last_marker = Some(common.clone());
                    common_prefixes.push(common);
                }
                None => {
                    last_marker = Some(key.clone());
                    contents.push(object.stat(key));
                }
            }
        }

        Ok(ListBucketResult {
            name: bucket.to_string(),
            prefix: prefix.to_string(),
            marker: marker.to_string(),
            next_marker: if is_truncated { last_marker } else { None },
            delimiter: delimiter.to_string(),
            max_keys: i32::try_from(limit).unwrap_or(i32::MAX),
            is_truncated,
            contents,
            common_prefixes,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<Box<dyn ObjectHandle>> {
        let state = self.store.read()?;
        let entry = self.readable_bucket(&state, bucket, key)?;
        let object = entry
            .objects
            .get(key)
            .ok_or_else(|| no_such_key(bucket, key))?;
        Ok(Box::new(Cursor::new(object.data.clone())))
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectStat> {
        let state = self.store.read()?;
        let entry = self.readable_bucket(&state, bucket, key)?;
        entry
            .objects
            .get(key)
            .map(|object| object.stat(key))
            .ok_or_else(|| no_such_key(bucket, key))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        size: i64,
        data: DataReader<'_>,
        metadata: HeaderMultimap,
    ) -> BackendResult<ObjectStat> {
        self.deny_anonymous(bucket, key)?;
        validate_object_key(bucket, key)?;
        {
            let state = self.store.read()?;
            ensure_bucket(&state, bucket)?;
        }

        let payload = read_payload(data, size, bucket, key).await?;
        let etag = hex::encode(Md5::digest(&payload));
        let object = MemObject::new(payload, etag, metadata);
        let stat = object.stat(key);

        let mut state = self.store.write()?;
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.objects.insert(key.to_string(), object);
        Ok(stat)
    }

    async fn copy_object(
        &self,
        dst_bucket: &str,
        dst_key: &str,
        source: &str,
        metadata: HeaderMultimap,
    ) -> BackendResult<()> {
        self.deny_anonymous(dst_bucket, dst_key)?;
        validate_object_key(dst_bucket, dst_key)?;
        let (src_bucket, src_key) = source.split_once('/').ok_or_else(|| {
            error_response(
                "InvalidArgument",
                "Copy source must be of the form bucket/key",
                dst_bucket,
                dst_key,
            )
        })?;

        let mut state = self.store.write()?;
        let source_object = state
            .buckets
            .get(src_bucket)
            .ok_or_else(|| no_such_bucket(src_bucket))?
            .objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| no_such_key(src_bucket, src_key))?;

        let copied = if metadata.is_empty() {
            MemObject {
                last_modified: now(),
                ..source_object
            }
        } else {
            let mut replaced = MemObject::new(source_object.data, source_object.etag, metadata);
            if replaced.content_type == DEFAULT_CONTENT_TYPE {
                replaced.content_type = source_object.content_type;
            }
            replaced
        };

        let entry = state
            .buckets
            .get_mut(dst_bucket)
            .ok_or_else(|| no_such_bucket(dst_bucket))?;
        entry.objects.insert(dst_key.to_string(), copied);
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        self.deny_anonymous(bucket, key)?;
        let mut state = self.store.write()?;
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.objects.remove(key);
        Ok(())
    }

    async fn new_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: HeaderMultimap,
    ) -> BackendResult<String> {
        self.deny_anonymous(bucket, key)?;
        validate_object_key(bucket, key)?;

        let mut state = self.store.write()?;
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        let upload_id = Uuid::new_v4().to_string();
        entry.uploads.insert(
            upload_id.clone(),
            MemUpload {
                key: key.to_string(),
                initiated: now(),
                metadata,
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

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
    ) -> BackendResult<ObjectPart> {
        self.deny_anonymous(bucket, key)?;
        if !(1..=MAX_PART_NUMBER).contains(&part_number) {
            return Err(error_response(
                "InvalidArgument",
                "Part number must be an integer between 1 and 10000, inclusive",
                bucket,
                key,
            ));
        }
        self.upload_exists(bucket, key, upload_id)?;

        let payload = read_payload(data, size, bucket, key).await?;
        let computed_md5 = Md5::digest(&payload).to_vec();
        if !md5.is_empty() && md5 != computed_md5.as_slice() {
            return Err(error_response(
                "BadDigest",
                "The Content-MD5 you specified did not match what we received.",
                bucket,
                key,
            ));
        }
        if !sha256.is_empty() && sha256 != Sha256::digest(&payload).as_slice() {
            return Err(error_response(
                "XAmzContentSHA256Mismatch",
                "The provided 'x-amz-content-sha256' header does not match what was computed.",
                bucket,
                key,
            ));
        }

        let part = MemPart {
            etag: hex::encode(&computed_md5),
            md5: computed_md5,
            last_modified: now(),
            data: payload,
        };
        let info = ObjectPart {
            part_number,
            etag: part.etag.clone(),
            size: part.data.len() as i64,
            last_modified: part.last_modified,
        };

        let mut state = self.store.write()?;
        find_upload_mut(&mut state, bucket, key, upload_id)?
            .parts
            .insert(part_number, part);
        Ok(info)
    }

    async fn list_object_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: i32,
        max_parts: i32,
    ) -> BackendResult<ListObjectPartsResult> {
        self.deny_anonymous(bucket, key)?;
        let state = self.store.read()?;
        let upload = find_upload(&state, bucket, key, upload_id)?;
        let limit = page_limit(max_parts);

        let mut remaining = upload
            .parts
            .range(part_number_marker.saturating_add(1)..)
            .map(|(part_number, part)| ObjectPart {
                part_number: *part_number,
                etag: part.etag.clone(),
                size: part.data.len() as i64,
                last_modified: part.last_modified,
            });
        let parts: Vec<ObjectPart> = remaining.by_ref().take(limit).collect();
        let is_truncated = remaining.next().is_some();
        let next_part_number_marker = if is_truncated {
            parts.last().map(|part| part.part_number).unwrap_or_default()
        } else {
            0
        };

        Ok(ListObjectPartsResult {
            bucket: bucket.to_string(),
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            part_number_marker,
            next_part_number_marker,
            max_parts: i32::try_from(limit).unwrap_or(i32::MAX),
            is_truncated,
            encoding_type: String::new(),
            parts,
        })
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletePart],
    ) -> BackendResult<String> {
        self.deny_anonymous(bucket, key)?;
        let mut state = self.store.write()?;
        let upload = find_upload(&state, bucket, key, upload_id)?;

        if parts.is_empty() {
            return Err(error_response(
                "MalformedXML",
                "You must specify at least one part",
                bucket,
                key,
            ));
        }
        if parts
            .windows(2)
            .any(|pair| pair[1].part_number <= pair[0].part_number)
        {
            return Err(error_response(
                "InvalidPartOrder",
                "The list of parts was not in ascending order. Parts must be ordered by part number.",
                bucket,
                key,
            ));
        }

        let mut assembled = Vec::new();
        let mut md5_concat = Vec::new();
        for requested in parts {
            let stored = upload
                .parts
                .get(&requested.part_number)
                .filter(|stored| stored.etag == requested.etag.trim_matches('"'))
                .ok_or_else(|| {
                    error_response(
                        "InvalidPart",
                        "One or more of the specified parts could not be found or the specified entity tag might not have matched the part's entity tag.",
                        bucket,
                        key,
                    )
                })?;
            assembled.extend_from_slice(&stored.data);
            md5_concat.extend_from_slice(&stored.md5);
        }

        let etag = format!("{}-{}", hex::encode(Md5::digest(&md5_concat)), parts.len());
        let metadata = upload.metadata.clone();

        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.uploads.remove(upload_id);
        entry.objects.insert(
            key.to_string(),
            MemObject::new(Bytes::from(assembled), etag.clone(), metadata),
        );
        Ok(etag)
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> BackendResult<()> {
        self.deny_anonymous(bucket, key)?;
        let mut state = self.store.write()?;
        find_upload(&state, bucket, key, upload_id)?;
        if let Some(entry) = state.buckets.get_mut(bucket) {
            entry.uploads.remove(upload_id);
        }
        Ok(())
    }

    async fn list_multipart_uploads(
        &self,
        bucket: &str,
        prefix: &str,
        key_marker: &str,
        upload_id_marker: &str,
        delimiter: &str,
        max_uploads: i32,
    ) -> BackendResult<ListMultipartUploadsResult> {
        self.deny_anonymous(bucket, "")?;
        let state = self.store.read()?;
        let entry = ensure_bucket(&state, bucket)?;
        let limit = page_limit(max_uploads);

        let mut pending: Vec<(&String, &MemUpload)> = entry.uploads.iter().collect();
        pending.sort_by(|a, b| {
            (&a.1.key, a.1.initiated, a.0).cmp(&(&b.1.key, b.1.initiated, b.0))
        });

        let mut uploads: Vec<MultipartUpload> = Vec::new();
        let mut common_prefixes: Vec<String> = Vec::new();
        // (key, upload id) of the last entry emitted; a common prefix has no id.
        let mut last_marker: Option<(String, String)> = None;
        let mut is_truncated = false;

        for (upload_id, upload) in pending {
            if !upload.key.starts_with(prefix)
                || !after_upload_marker(upload, upload_id, key_marker, upload_id_marker)
            {
                continue;
            }

            let rolled_up = common_prefix(&upload.key, prefix, delimiter);
            if let Some(common) = &rolled_up
                && (common.as_str() <= key_marker || common_prefixes.last() == Some(common))
            {
                continue;
            }

            if uploads.len() + common_prefixes.len() == limit {
                is_truncated = true;
                break;
            }

            match rolled_up {
                Some(common) => {
                    last_marker = Some((common.clone(), String::new()));
                    common_prefixes.push(common);
                }
                None => {
                    last_marker = Some((upload.key.clone(), upload_id.clone()));
                    uploads.push(MultipartUpload {
                        key: upload.key.clone(),
                        upload_id: upload_id.clone(),
                        initiated: upload.initiated,
                    });
                }
            }
        }

        let (next_key_marker, next_upload_id_marker) = match last_marker {
            Some(marker) if is_truncated => marker,
            _ => (String::new(), String::new()),
        };

        Ok(ListMultipartUploadsResult {
            bucket: bucket.to_string(),
            key_marker: key_marker.to_string(),
            upload_id_marker: upload_id_marker.to_string(),
            next_key_marker,
            next_upload_id_marker,
            encoding_type: String::new(),
            max_uploads: i32::try_from(limit).unwrap_or(i32::MAX),
            is_truncated,
            uploads,
            prefix: prefix.to_string(),
            delimiter: delimiter.to_string(),
            common_prefixes,
        })
    }
}

/// Routes endpoints to in-memory stores. Unregistered endpoints refuse the
/// connection the way an unreachable host would.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    endpoints: HashMap<String, Arc<MemoryStore>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str, store: Arc<MemoryStore>) -> Self {
        let endpoint = endpoint.trim().trim_end_matches('/');
        let target = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{endpoint}")
        };
        let key = Url::parse(&target)
            .ok()
            .and_then(|url| endpoint_key(&url))
            .unwrap_or_else(|| endpoint.to_string());
        self.endpoints.insert(key, store);
        self
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(
        &self,
        endpoint: &Url,
        credentials: Option<&Credentials>,
    ) -> BackendResult<Arc<dyn BackendClient>> {
        let store = endpoint_key(endpoint)
            .and_then(|key| self.endpoints.get(&key))
            .ok_or_else(|| {
                BackendError::Transport(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("no backend reachable at {endpoint}"),
                ))
            })?;

        let client = match credentials {
            Some(_) => store.client(),
            None => store.anonymous_client(),
        };
        Ok(Arc::new(client))
    }
}

fn endpoint_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

async fn read_payload(
    data: DataReader<'_>,
    size: i64,
    bucket: &str,
    key: &str,
) -> BackendResult<Bytes> {
    let mut payload = Vec::new();
    match u64::try_from(size) {
        Ok(expected) => {
            data.take(expected).read_to_end(&mut payload).await?;
            if (payload.len() as u64) < expected {
                return Err(error_response(
                    "IncompleteBody",
                    "You did not provide the number of bytes specified by the Content-Length HTTP header.",
                    bucket,
                    key,
                ));
            }
        }
        Err(_) => {
            data.read_to_end(&mut payload).await?;
        }
    }
    Ok(Bytes::from(payload))
}

fn page_limit(requested: i32) -> usize {
    usize::try_from(requested)
        .ok()
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_MAX_KEYS)
}

fn common_prefix(key: &str, prefix: &str, delimiter: &str) -> Option<String> {
    if delimiter.is_empty() {
        return None;
    }
    let suffix = &key[prefix.len()..];
    suffix
        .find(delimiter)
        .map(|idx| format!("{prefix}{}", &suffix[..idx + delimiter.len()]))
}

fn after_upload_marker(
    upload: &MemUpload,
    upload_id: &str,
    key_marker: &str,
    upload_id_marker: &str,
) -> bool {
    if key_marker.is_empty() {
        return true;
    }
    match upload.key.as_str().cmp(key_marker) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Equal => !upload_id_marker.is_empty() && upload_id > upload_id_marker,
        std::cmp::Ordering::Less => false,
    }
}

fn ensure_bucket<'a>(state: &'a StoreState, bucket: &str) -> BackendResult<&'a MemBucket> {
    state
        .buckets
        .get(bucket)
        .ok_or_else(|| no_such_bucket(bucket))
}

fn find_upload<'a>(
    state: &'a StoreState,
    bucket: &str,
    key: &str,
    upload_id: &str,
) -> BackendResult<&'a MemUpload> {
    ensure_bucket(state, bucket)?
        .uploads
        .get(upload_id)
        .filter(|upload| upload.key == key)
        .ok_or_else(|| no_such_upload(bucket, key))
}

fn find_upload_mut<'a>(
    state: &'a mut StoreState,
    bucket: &str,
    key: &str,
    upload_id: &str,
) -> BackendResult<&'a mut MemUpload> {
    state
        .buckets
        .get_mut(bucket)
        .ok_or_else(|| no_such_bucket(bucket))?
        .uploads
        .get_mut(upload_id)
        .filter(|upload| upload.key == key)
        .ok_or_else(|| no_such_upload(bucket, key))
}

fn validate_bucket_name(bucket: &str) -> BackendResult<()> {
    let bytes = bucket.as_bytes();
    let valid = (3..=63).contains(&bytes.len())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'.' || *b == b'-')
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric)
        && !bucket.contains("..");
    if !valid {
        return Err(error_response(
            "InvalidBucketName",
            "The specified bucket is not valid.",
            bucket,
            "",
        ));
    }
    Ok(())
}

fn validate_object_key(bucket: &str, key: &str) -> BackendResult<()> {
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        return Err(error_response(
            "XMinioInvalidObjectName",
            "Object name contains unsupported characters.",
            bucket,
            key,
        ));
    }
    Ok(())
}

fn status_for(code: &str) -> u16 {
    match code {
        "NoSuchBucket" | "NoSuchKey" | "NoSuchUpload" => 404,
        "AccessDenied" => 403,
        "BucketAlreadyOwnedByYou" | "BucketNotEmpty" => 409,
        "InternalError" => 500,
        _ => 400,
    }
}

fn error_response(code: &str, message: &str, bucket: &str, key: &str) -> BackendError {
    BackendError::Response(
        ErrorResponse::new(code, message)
            .with_resource(bucket, key)
            .with_status(status_for(code)),
    )
}

fn no_such_bucket(bucket: &str) -> BackendError {
    error_response("NoSuchBucket", "The specified bucket does not exist", bucket, "")
}

fn no_such_key(bucket: &str, key: &str) -> BackendError {
    error_response("NoSuchKey", "The specified key does not exist.", bucket, key)
}

fn no_such_upload(bucket: &str, key: &str) -> BackendError {
    error_response(
        "NoSuchUpload",
        "The specified multipart upload does not exist.",
        bucket,
        key,
    )
}

fn access_denied(bucket: &str, key: &str) -> BackendError {
    error_response("AccessDenied", "Access Denied.", bucket, key)
}

fn internal_error(message: &str) -> BackendError {
    error_response("InternalError", message, "", "")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use s3gw_common::types::CompletePart;

    use super::MemoryStore;
    use crate::client::BackendClient;

    fn code_of<T: std::fmt::Debug>(result: s3gw_common::error::BackendResult<T>) -> String {
        result
            .unwrap_err()
            .code()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn bucket_rules_follow_s3() {
        let client = MemoryStore::new().client();
        assert_eq!(code_of(client.make_bucket("Bad_Name", "").await), "InvalidBucketName");
        assert_eq!(code_of(client.make_bucket("ab", "").await), "InvalidBucketName");

        client.make_bucket("photos", "us-east-1").await.unwrap();
        assert_eq!(
            code_of(client.make_bucket("photos", "us-east-1").await),
            "BucketAlreadyOwnedByYou"
        );

        let mut data: &[u8] = b"x";
        client
            .put_object("photos", "a.jpg", 1, &mut data, HashMap::new())
            .await
            .unwrap();
        assert_eq!(code_of(client.remove_bucket("photos").await), "BucketNotEmpty");
        assert_eq!(code_of(client.remove_bucket("missing").await), "NoSuchBucket");
    }

    #[tokio::test]
    async fn short_stream_is_rejected() {
        let client = MemoryStore::new().client();
        client.make_bucket("data", "").await.unwrap();

        let mut data: &[u8] = b"abc";
        let result = client
            .put_object("data", "k", 10, &mut data, HashMap::new())
            .await;
        assert_eq!(code_of(result), "IncompleteBody");
        assert_eq!(code_of(client.stat_object("data", "k").await), "NoSuchKey");
    }

    #[tokio::test]
    async fn listing_rolls_up_common_prefixes_and_paginates() {
        let client = MemoryStore::new().client();
        client.make_bucket("data", "").await.unwrap();
        for key in ["a/1", "a/2", "b", "c/1", "d"] {
            let mut data: &[u8] = b"x";
            client
                .put_object("data", key, 1, &mut data, HashMap::new())
                .await
                .unwrap();
        }

        let page = client.list_objects("data", "", "", "/", 2).await.unwrap();
        assert_eq!(page.common_prefixes, vec!["a/".to_string()]);
        assert_eq!(page.contents.len(), 1);
        assert!(page.is_truncated);
        assert_eq!(page.next_marker.as_deref(), Some("b"));

        let page = client.list_objects("data", "", "b", "/", 2).await.unwrap();
        assert_eq!(page.common_prefixes, vec!["c/".to_string()]);
        assert_eq!(page.contents[0].key, "d");
        assert!(!page.is_truncated);
        assert_eq!(page.next_marker, None);
    }

    #[tokio::test]
    async fn multipart_etag_counts_parts() {
        let client = MemoryStore::new().client();
        client.make_bucket("data", "").await.unwrap();
        let upload_id = client
            .new_multipart_upload("data", "big", HashMap::new())
            .await
            .unwrap();

        let mut first: &[u8] = b"hello ";
        let mut second: &[u8] = b"world";
        let one = client
            .put_object_part("data", "big", &upload_id, 1, 6, &mut first, &[], &[])
            .await
            .unwrap();
        let two = client
            .put_object_part("data", "big", &upload_id, 2, 5, &mut second, &[], &[])
            .await
            .unwrap();

        let etag = client
            .complete_multipart_upload(
                "data",
                "big",
                &upload_id,
                &[
                    CompletePart {
                        part_number: 1,
                        etag: format!("\"{}\"", one.etag),
                    },
                    CompletePart {
                        part_number: 2,
                        etag: two.etag,
                    },
                ],
            )
            .await
            .unwrap();
        assert!(etag.ends_with("-2"));

        let stat = client.stat_object("data", "big").await.unwrap();
        assert_eq!(stat.size, 11);
        assert_eq!(
            code_of(client.abort_multipart_upload("data", "big", &upload_id).await),
            "NoSuchUpload"
        );
    }

    #[tokio::test]
    async fn part_digests_are_verified() {
        let client = MemoryStore::new().client();
        client.make_bucket("data", "").await.unwrap();
        let upload_id = client
            .new_multipart_upload("data", "k", HashMap::new())
            .await
            .unwrap();

        let mut data: &[u8] = b"abc";
        let result = client
            .put_object_part("data", "k", &upload_id, 1, 3, &mut data, &[0u8; 16], &[])
            .await;
        assert_eq!(code_of(result), "BadDigest");

        let mut data: &[u8] = b"abc";
        let result = client
            .put_object_part("data", "k", &upload_id, 0, 3, &mut data, &[], &[])
            .await;
        assert_eq!(code_of(result), "InvalidArgument");
    }

    #[tokio::test]
    async fn anonymous_reads_need_public_bucket() {
        let store = MemoryStore::new();
        let client = store.client();
        let anon = store.anonymous_client();
        client.make_bucket("data", "").await.unwrap();

        assert_eq!(code_of(anon.stat_object("data", "k").await), "AccessDenied");
        assert_eq!(code_of(anon.make_bucket("other", "").await), "AccessDenied");

        store.set_public_read("data", true).unwrap();
        assert_eq!(code_of(anon.stat_object("data", "k").await), "NoSuchKey");
        assert!(anon.bucket_exists("data").await.unwrap());
        assert!(!anon.bucket_exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn upload_listing_resumes_after_common_prefix() {
        let client = MemoryStore::new().client();
        client.make_bucket("data", "").await.unwrap();
        for key in ["a", "dir/x", "dir/y", "z"] {
            client
                .new_multipart_upload("data", key, HashMap::new())
                .await
                .unwrap();
        }

        let page = client
            .list_multipart_uploads("data", "", "", "", "/", 2)
            .await
            .unwrap();
        let keys: Vec<&str> = page.uploads.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["a"]);
        assert_eq!(page.common_prefixes, vec!["dir/".to_string()]);
        assert!(page.is_truncated);
        assert_eq!(page.next_key_marker, "dir/");
        assert_eq!(page.next_upload_id_marker, "");

        let page = client
            .list_multipart_uploads(
                "data",
                "",
                &page.next_key_marker,
                &page.next_upload_id_marker,
                "/",
                2,
            )
            .await
            .unwrap();
        let keys: Vec<&str> = page.uploads.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["z"]);
        assert!(page.common_prefixes.is_empty());
        assert!(!page.is_truncated);
    }
}
