use std::collections::HashMap;

use crate::client::HeaderMultimap;

/// Canonical MIME header form: `x-amz-meta-foo` becomes `X-Amz-Meta-Foo`.
/// Keys carrying bytes outside the HTTP token set are returned as is.
pub fn canonical_header_key(key: &str) -> String {
    if !key.bytes().all(is_token_byte) {
        return key.to_string();
    }

    let mut upper = true;
    key.chars()
        .map(|ch| {
            let out = if upper {
                ch.to_ascii_uppercase()
            } else {
                ch.to_ascii_lowercase()
            };
            upper = ch == '-';
            out
        })
        .collect()
}

pub fn to_backend_metadata(metadata: &HashMap<String, String>) -> HeaderMultimap {
    let mut keys: Vec<&String> = metadata.keys().collect();
    keys.sort();

    keys.into_iter()
        .map(|key| (canonical_header_key(key), vec![metadata[key].clone()]))
        .collect()
}

/// Only the first value of each header survives.
pub fn from_backend_metadata(metadata: &HeaderMultimap) -> HashMap<String, String> {
    metadata
        .iter()
        .filter_map(|(key, values)| {
            values
                .first()
                .map(|value| (canonical_header_key(key), value.clone()))
        })
        .collect()
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::{canonical_header_key, from_backend_metadata, to_backend_metadata};

    #[test]
    fn canonicalizes_header_keys() {
        assert_eq!(canonical_header_key("content-type"), "Content-Type");
        assert_eq!(canonical_header_key("X-AMZ-META-COLOR"), "X-Amz-Meta-Color");
        assert_eq!(canonical_header_key("etag"), "Etag");
        assert_eq!(canonical_header_key("has space"), "has space");
        assert_eq!(canonical_header_key(""), "");
    }

    #[test]
    fn to_backend_wraps_single_values() {
        let metadata = HashMap::from([("x-amz-meta-color".to_string(), "blue".to_string())]);
        let backend = to_backend_metadata(&metadata);
        assert_eq!(
            backend.get("X-Amz-Meta-Color"),
            Some(&vec!["blue".to_string()])
        );
    }

    #[test]
    fn from_backend_keeps_first_value() {
        let backend = HashMap::from([
            (
                "x-amz-meta-tag".to_string(),
                vec!["first".to_string(), "second".to_string()],
            ),
            ("x-amz-meta-empty".to_string(), Vec::new()),
        ]);
        let metadata = from_backend_metadata(&backend);
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata["X-Amz-Meta-Tag"], "first");
    }

    #[test]
    fn round_trip_preserves_canonical_key_set() {
        let metadata = HashMap::from([
            ("x-amz-meta-owner".to_string(), "ops".to_string()),
            ("X-Amz-Meta-Owner".to_string(), "dev".to_string()),
            ("content-encoding".to_string(), "gzip".to_string()),
            ("Cache-Control".to_string(), "no-cache".to_string()),
        ]);

        let expected: HashSet<String> = metadata
            .keys()
            .map(|key| canonical_header_key(key))
            .collect();
        let round_tripped: HashSet<String> = from_backend_metadata(&to_backend_metadata(&metadata))
            .into_keys()
            .collect();

        assert_eq!(round_tripped, expected);
    }
}
