use std::collections::HashMap;

use s3gw_common::error::{GatewayError, Result};
use s3gw_common::types::{
    CompletePart, ListMultipartsInfo, ListPartsInfo, MultipartUploadInfo, ObjectInfo, PartInfo,
};
use tracing::debug;

use super::S3Gateway;
use super::errors::s3_to_object_error;
use super::metadata::to_backend_metadata;
use crate::client::{
    DataReader, ListMultipartUploadsResult, ListObjectPartsResult, MultipartUpload, ObjectPart,
};

fn part_info_from_part(part: ObjectPart) -> PartInfo {
    PartInfo {
        part_number: part.part_number,
        size: part.size,
        etag: part.etag,
        last_modified: part.last_modified,
    }
}

fn list_parts_info_from_result(result: ListObjectPartsResult) -> ListPartsInfo {
    ListPartsInfo {
        bucket: result.bucket,
        key: result.key,
        upload_id: result.upload_id,
        storage_class: String::new(),
        part_number_marker: result.part_number_marker,
        next_part_number_marker: result.next_part_number_marker,
        max_parts: result.max_parts,
        is_truncated: result.is_truncated,
        encoding_type: result.encoding_type,
        parts: result.parts.into_iter().map(part_info_from_part).collect(),
    }
}

fn upload_info_from_upload(upload: MultipartUpload) -> MultipartUploadInfo {
    MultipartUploadInfo {
        key: upload.key,
        upload_id: upload.upload_id,
        initiated: upload.initiated,
    }
}

fn list_multiparts_info_from_result(result: ListMultipartUploadsResult) -> ListMultipartsInfo {
    ListMultipartsInfo {
        key_marker: result.key_marker,
        upload_id_marker: result.upload_id_marker,
        next_key_marker: result.next_key_marker,
        next_upload_id_marker: result.next_upload_id_marker,
        max_uploads: result.max_uploads,
        is_truncated: result.is_truncated,
        uploads: result
            .uploads
            .into_iter()
            .map(upload_info_from_upload)
            .collect(),
        prefix: result.prefix,
        delimiter: result.delimiter,
        common_prefixes: result.common_prefixes,
        encoding_type: result.encoding_type,
    }
}

fn decode_digest(algorithm: &'static str, digest_hex: &str) -> Result<Vec<u8>> {
    hex::decode(digest_hex).map_err(|source| GatewayError::InvalidDigest { algorithm, source })
}

impl S3Gateway {
    pub async fn new_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String> {
        let upload_id = self
            .client
            .new_multipart_upload(bucket, key, to_backend_metadata(&metadata))
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        debug!(bucket, key, upload_id = %upload_id, "multipart upload started");
        Ok(upload_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn copy_object_part(
        &self,
        _src_bucket: &str,
        _src_key: &str,
        _dst_bucket: &str,
        _dst_key: &str,
        _upload_id: &str,
        _part_number: i32,
        _offset: u64,
        _length: u64,
    ) -> Result<PartInfo> {
        Err(GatewayError::NotSupported("copy object part"))
    }

    /// Both digests are hex; an empty string means the caller supplied none.
    /// Malformed hex fails before anything is sent to the backend.
    #[allow(clippy::too_many_arguments)]
    pub async fn put_object_part(
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
        let md5 = decode_digest("md5", md5_hex)?;
        let sha256 = decode_digest("sha256", sha256_hex)?;

        let part = self
            .client
            .put_object_part(
                bucket,
                key,
                upload_id,
                part_number,
                size,
                data,
                &md5,
                &sha256,
            )
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        debug!(bucket, key, upload_id, part_number, size = part.size, "part uploaded");
        Ok(part_info_from_part(part))
    }

    pub async fn list_object_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: i32,
        max_parts: i32,
    ) -> Result<ListPartsInfo> {
        let result = self
            .client
            .list_object_parts(bucket, key, upload_id, part_number_marker, max_parts)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        Ok(list_parts_info_from_result(result))
    }

    pub async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<()> {
        self.client
            .abort_multipart_upload(bucket, key, upload_id)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        debug!(bucket, key, upload_id, "multipart upload aborted");
        Ok(())
    }

    /// Parts are forwarded in the caller's order; ordering and ETag checks
    /// are the backend's, and any failure it reports is returned.
    pub async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletePart>,
    ) -> Result<ObjectInfo> {
        let etag = self
            .client
            .complete_multipart_upload(bucket, key, upload_id, &parts)
            .await
            .map_err(|err| s3_to_object_error(err, bucket, Some(key)))?;
        debug!(
            bucket,
            key,
            upload_id,
            etag = %etag,
            parts = parts.len(),
            "multipart upload completed"
        );

        self.get_object_info(bucket, key).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list_multipart_uploads(
        &self,
        bucket: &str,
        prefix: &str,
        key_marker: &str,
        upload_id_marker: &str,
        delimiter: &str,
        max_uploads: i32,
    ) -> Result<ListMultipartsInfo> {
        let result = self
            .client
            .list_multipart_uploads(
                bucket,
                prefix,
                key_marker,
                upload_id_marker,
                delimiter,
                max_uploads,
            )
            .await
            .map_err(|err| s3_to_object_error(err, bucket, None))?;
        Ok(list_multiparts_info_from_result(result))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use s3gw_common::error::GatewayError;

    use super::{decode_digest, list_parts_info_from_result};
    use crate::client::{ListObjectPartsResult, ObjectPart};

    #[test]
    fn empty_digest_decodes_to_nothing() {
        assert!(decode_digest("md5", "").unwrap().is_empty());
        assert_eq!(decode_digest("md5", "00ff").unwrap(), vec![0x00, 0xff]);
    }

    #[test]
    fn malformed_digest_names_algorithm() {
        match decode_digest("sha256", "zz") {
            Err(GatewayError::InvalidDigest { algorithm, .. }) => assert_eq!(algorithm, "sha256"),
            other => panic!("expected InvalidDigest, got {other:?}"),
        }
        assert!(decode_digest("md5", "abc").is_err());
    }

    #[test]
    fn part_listing_keeps_markers() {
        let now = Utc::now();
        let info = list_parts_info_from_result(ListObjectPartsResult {
            bucket: "b".to_string(),
            key: "k".to_string(),
            upload_id: "u".to_string(),
            part_number_marker: 1,
            next_part_number_marker: 3,
            max_parts: 2,
            is_truncated: true,
            encoding_type: String::new(),
            parts: vec![
                ObjectPart {
                    part_number: 2,
                    etag: "e2".to_string(),
                    size: 5,
                    last_modified: now,
                },
                ObjectPart {
                    part_number: 3,
                    etag: "e3".to_string(),
                    size: 7,
                    last_modified: now,
                },
            ],
        });

        assert_eq!(info.next_part_number_marker, 3);
        assert!(info.is_truncated);
        let numbers: Vec<i32> = info.parts.iter().map(|part| part.part_number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }
}
