use s3gw_common::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_ENDPOINT: &str = "s3.amazonaws.com";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    /// Returns `None` when either key is empty, which callers treat as anonymous.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Option<Self> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();
        if access_key.is_empty() || secret_key.is_empty() {
            None
        } else {
            Some(Self {
                access_key,
                secret_key,
            })
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub endpoint: String,
    #[serde(default = "default_secure")]
    pub secure: bool,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
}

fn default_secure() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            secure: true,
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

impl GatewayConfig {
    pub fn new(
        endpoint: impl Into<String>,
        secure: bool,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            secure,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Reads `S3GW_ENDPOINT`, `S3GW_SECURE`, `S3GW_ACCESS_KEY` and
    /// `S3GW_SECRET_KEY`; unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let endpoint = lookup("S3GW_ENDPOINT")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.endpoint);
        let secure = lookup("S3GW_SECURE")
            .and_then(|value| parse_bool(&value))
            .unwrap_or(defaults.secure);
        let access_key = lookup("S3GW_ACCESS_KEY").unwrap_or_default();
        let secret_key = lookup("S3GW_SECRET_KEY").unwrap_or_default();

        Self {
            endpoint,
            secure,
            access_key,
            secret_key,
        }
    }

    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::new(self.access_key.clone(), self.secret_key.clone())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        let normalized = self.endpoint.trim().trim_end_matches('/');
        if normalized.is_empty() {
            return Err(GatewayError::InvalidConfig(
                "backend endpoint is empty".to_string(),
            ));
        }

        let target = if normalized.contains("://") {
            normalized.to_string()
        } else {
            let scheme = if self.secure { "https" } else { "http" };
            format!("{scheme}://{normalized}")
        };

        let url = Url::parse(&target).map_err(|err| {
            GatewayError::InvalidConfig(format!("invalid backend endpoint {normalized}: {err}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(GatewayError::InvalidConfig(format!(
                "invalid backend endpoint {normalized}: expected http(s)://host[:port]"
            )));
        }
        if url.path() != "/" || url.query().is_some() {
            return Err(GatewayError::InvalidConfig(format!(
                "invalid backend endpoint {normalized}: paths are not allowed"
            )));
        }

        Ok(url)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
