use s3gw_common::error::{BackendError, GatewayError};

/// Maps a backend failure onto the gateway error taxonomy.
///
/// Only backend error responses are interpreted; transport failures come
/// back unchanged as [`GatewayError::Backend`]. The response is kept as the
/// error source for every mapped kind.
pub fn s3_to_object_error(err: BackendError, bucket: &str, object: Option<&str>) -> GatewayError {
    let response = match err {
        BackendError::Response(response) => response,
        other => return GatewayError::Backend(other),
    };

    let object = object.filter(|name| !name.is_empty());
    let bucket = bucket.to_string();
    let object_name = object.unwrap_or_default().to_string();

    match response.code.as_str() {
        "BucketAlreadyOwnedByYou" => GatewayError::BucketAlreadyOwned {
            bucket,
            source: response,
        },
        "BucketNotEmpty" => GatewayError::BucketNotEmpty {
            bucket,
            source: response,
        },
        "InvalidBucketName" => GatewayError::InvalidBucketName {
            bucket,
            source: response,
        },
        "NoSuchBucket" => GatewayError::BucketNotFound {
            bucket,
            source: Some(response),
        },
        "NoSuchKey" if object.is_some() => GatewayError::ObjectNotFound {
            bucket,
            object: object_name,
            source: response,
        },
        "NoSuchKey" => GatewayError::BucketNotFound {
            bucket,
            source: Some(response),
        },
        "XMinioInvalidObjectName" | "InvalidObjectName" => GatewayError::InvalidObjectName {
            bucket,
            object: object_name,
            source: response,
        },
        "AccessDenied" => GatewayError::PrefixAccessDenied {
            bucket,
            object: object_name,
            source: response,
        },
        _ => GatewayError::Unrecognized {
            bucket,
            object: object_name,
            source: response,
        },
    }
}

#[cfg(test)]
mod tests {
    use s3gw_common::error::{BackendError, ErrorResponse, GatewayError};

    use super::s3_to_object_error;

    fn response(code: &str) -> BackendError {
        BackendError::Response(ErrorResponse::new(code, "backend message"))
    }

    #[test]
    fn bucket_codes_map_to_bucket_kinds() {
        assert!(matches!(
            s3_to_object_error(response("BucketAlreadyOwnedByYou"), "b", None),
            GatewayError::BucketAlreadyOwned { bucket, .. } if bucket == "b"
        ));
        assert!(matches!(
            s3_to_object_error(response("BucketNotEmpty"), "b", None),
            GatewayError::BucketNotEmpty { bucket, .. } if bucket == "b"
        ));
        assert!(matches!(
            s3_to_object_error(response("InvalidBucketName"), "b", None),
            GatewayError::InvalidBucketName { bucket, .. } if bucket == "b"
        ));
        assert!(matches!(
            s3_to_object_error(response("NoSuchBucket"), "b", Some("o")),
            GatewayError::BucketNotFound { bucket, source: Some(_) } if bucket == "b"
        ));
    }

    #[test]
    fn no_such_key_depends_on_object_context() {
        assert!(matches!(
            s3_to_object_error(response("NoSuchKey"), "b", Some("o")),
            GatewayError::ObjectNotFound { bucket, object, .. } if bucket == "b" && object == "o"
        ));
        assert!(matches!(
            s3_to_object_error(response("NoSuchKey"), "b", None),
            GatewayError::BucketNotFound { bucket, .. } if bucket == "b"
        ));
        assert!(matches!(
            s3_to_object_error(response("NoSuchKey"), "b", Some("")),
            GatewayError::BucketNotFound { .. }
        ));
    }

    #[test]
    fn object_codes_carry_bucket_and_object() {
        assert!(matches!(
            s3_to_object_error(response("XMinioInvalidObjectName"), "b", Some("o")),
            GatewayError::InvalidObjectName { bucket, object, .. } if bucket == "b" && object == "o"
        ));
        assert!(matches!(
            s3_to_object_error(response("AccessDenied"), "b", Some("o")),
            GatewayError::PrefixAccessDenied { bucket, object, .. }
                if bucket == "b" && object == "o"
        ));
    }

    #[test]
    fn mapped_kinds_keep_backend_response() {
        match s3_to_object_error(response("NoSuchKey"), "b", Some("o")) {
            GatewayError::ObjectNotFound { source, .. } => {
                assert_eq!(source.code, "NoSuchKey");
                assert_eq!(source.message, "backend message");
            }
            other => panic!("expected ObjectNotFound, got {other:?}"),
        }
    }

    #[test]
    fn unknown_codes_wrap_original_response() {
        let err = s3_to_object_error(response("SlowDown"), "b", Some("o"));
        match err {
            GatewayError::Unrecognized {
                bucket,
                object,
                source,
            } => {
                assert_eq!(bucket, "b");
                assert_eq!(object, "o");
                assert_eq!(source, ErrorResponse::new("SlowDown", "backend message"));
            }
            other => panic!("expected Unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn transport_errors_pass_through() {
        let err = BackendError::Transport(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        match s3_to_object_error(err, "b", Some("o")) {
            GatewayError::Backend(BackendError::Transport(io)) => {
                assert_eq!(io.kind(), std::io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected pass-through, got {other:?}"),
        }
    }

    #[test]
    fn translation_is_deterministic() {
        let first = s3_to_object_error(response("AccessDenied"), "b", Some("o")).to_string();
        let second = s3_to_object_error(response("AccessDenied"), "b", Some("o")).to_string();
        assert_eq!(first, second);
    }
}
