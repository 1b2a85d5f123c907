use thiserror::Error;

/// Error document returned by an S3-compatible backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub bucket_name: String,
    pub key: String,
    pub request_id: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            bucket_name: String::new(),
            key: String::new(),
            request_id: String::new(),
            status_code: 0,
        }
    }

    pub fn with_resource(mut self, bucket: &str, key: &str) -> Self {
        self.bucket_name = bucket.to_string();
        self.key = key.to_string();
        self
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }
}

/// Failure surfaced by a backend client call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend responded with {0}")]
    Response(#[from] ErrorResponse),
    #[error("backend transport failure: {0}")]
    Transport(#[from] std::io::Error),
}

impl BackendError {
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Response(resp) => Some(resp.code.as_str()),
            Self::Transport(_) => None,
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("bucket already owned by you: {bucket}")]
    BucketAlreadyOwned {
        bucket: String,
        #[source]
        source: ErrorResponse,
    },
    #[error("bucket not empty: {bucket}")]
    BucketNotEmpty {
        bucket: String,
        #[source]
        source: ErrorResponse,
    },
    #[error("invalid bucket name: {bucket}")]
    InvalidBucketName {
        bucket: String,
        #[source]
        source: ErrorResponse,
    },
    #[error("bucket not found: {bucket}")]
    BucketNotFound {
        bucket: String,
        #[source]
        source: Option<ErrorResponse>,
    },
    #[error("object not found: {bucket}/{object}")]
    ObjectNotFound {
        bucket: String,
        object: String,
        #[source]
        source: ErrorResponse,
    },
    #[error("invalid object name: {bucket}/{object}")]
    InvalidObjectName {
        bucket: String,
        object: String,
        #[source]
        source: ErrorResponse,
    },
    #[error("access denied: {bucket}/{object}")]
    PrefixAccessDenied {
        bucket: String,
        object: String,
        #[source]
        source: ErrorResponse,
    },
    #[error("sha256 mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch { expected: String, computed: String },
    #[error("short read on {bucket}/{object}: expected {expected} bytes, got {actual}")]
    IncompleteRead {
        bucket: String,
        object: String,
        expected: u64,
        actual: u64,
    },
    #[error("invalid {algorithm} digest")]
    InvalidDigest {
        algorithm: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    #[error("not supported: {0}")]
    NotSupported(&'static str),
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
    #[error("backend error on {bucket}/{object}")]
    Unrecognized {
        bucket: String,
        object: String,
        #[source]
        source: ErrorResponse,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn s3_error_code(&self) -> &str {
        match self {
            Self::BucketAlreadyOwned { .. } => "BucketAlreadyOwnedByYou",
            Self::BucketNotEmpty { .. } => "BucketNotEmpty",
            Self::InvalidBucketName { .. } => "InvalidBucketName",
            Self::BucketNotFound { .. } => "NoSuchBucket",
            Self::ObjectNotFound { .. } => "NoSuchKey",
            Self::InvalidObjectName { .. } => "XMinioInvalidObjectName",
            Self::PrefixAccessDenied { .. } => "AccessDenied",
            Self::ChecksumMismatch { .. } => "XAmzContentSHA256Mismatch",
            Self::IncompleteRead { .. } => "IncompleteBody",
            Self::InvalidDigest { .. } => "InvalidDigest",
            Self::NotSupported(_) => "NotImplemented",
            Self::Unrecognized { source, .. } => source.code.as_str(),
            Self::InvalidConfig(_) | Self::Backend(_) | Self::Io(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::{BackendError, ErrorResponse, GatewayError};

    #[test]
    fn unrecognized_reports_backend_code() {
        let err = GatewayError::Unrecognized {
            bucket: "b".to_string(),
            object: String::new(),
            source: ErrorResponse::new("SlowDown", "reduce your request rate"),
        };
        assert_eq!(err.s3_error_code(), "SlowDown");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("SlowDown: reduce your request rate")
        );
    }

    #[test]
    fn transport_errors_have_no_code() {
        let err = BackendError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(err.code(), None);
        assert_eq!(GatewayError::from(err).s3_error_code(), "InternalError");
    }

    #[test]
    fn local_bucket_not_found_has_no_source() {
        let err = GatewayError::BucketNotFound {
            bucket: "b".to_string(),
            source: None,
        };
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "bucket not found: b");
    }
}
