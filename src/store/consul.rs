use super::{KvPair, KvStore, StoreError};
use crate::utils::DEFAULT_CONSUL_ADDR;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TOKEN_HEADER: &str = "X-Consul-Token";

/// Connection settings for the Consul HTTP API
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base address, e.g. `http://127.0.0.1:8500`
    pub address: String,
    /// ACL token sent with every request
    pub token: Option<String>,
    /// Datacenter to target instead of the agent's own
    pub datacenter: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONSUL_ADDR.to_string(),
            token: None,
            datacenter: None,
        }
    }
}

/// Entry of a recursive `GET /v1/kv/` response
#[derive(Debug, Deserialize)]
struct ConsulKvEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: Option<String>,
}

/// `KvStore` backed by the Consul KV HTTP API
#[derive(Debug, Clone)]
pub struct ConsulStore {
    client: reqwest::Client,
    base_url: Url,
    config: StoreConfig,
}

impl ConsulStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let base_url = Url::parse(&config.address).map_err(|e| {
            StoreError::Unavailable(format!("invalid Consul address {}: {}", config.address, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Unavailable(format!(
                "invalid Consul address {}",
                config.address
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// URL of `/v1/kv/<key>`, with every key segment percent-encoded.
    ///
    /// `.` and `..` segments are rejected: URL normalization would resolve
    /// them and address a different key.
    fn kv_url(&self, key: &str) -> Result<Url, String> {
        if key.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(format!("key {key:?} contains a \".\" or \"..\" path segment"));
        }

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v1", "kv"]).extend(key.split('/'));
        }
        if let Some(dc) = &self.config.datacenter {
            url.query_pairs_mut().append_pair("dc", dc);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn write(
        &self,
        method: reqwest::Method,
        key: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(), StoreError> {
        let write_error = |message: String| StoreError::Write {
            key: key.to_string(),
            message,
        };

        let url = self.kv_url(key).map_err(write_error)?;
        let mut request = self.request(method, url);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| classify(e, write_error))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| write_error(e.to_string()))?;

        if !status.is_success() {
            return Err(write_error(format!("{status}: {}", text.trim())));
        }
        if text.trim() == "false" {
            return Err(write_error("Consul refused the operation".to_string()));
        }
        Ok(())
    }
}

/// Connection and timeout failures mean the store is unreachable; anything
/// else belongs to the operation that was attempted.
fn classify(error: reqwest::Error, otherwise: impl FnOnce(String) -> StoreError) -> StoreError {
    if error.is_connect() || error.is_timeout() {
        StoreError::Unavailable(error.to_string())
    } else {
        otherwise(error.to_string())
    }
}

#[async_trait]
impl KvStore for ConsulStore {
    async fn list(&self, prefix: &str) -> Result<Vec<KvPair>, StoreError> {
        let query_error = |message: String| StoreError::Query {
            prefix: prefix.to_string(),
            message,
        };

        let mut url = self.kv_url(prefix).map_err(query_error)?;
        url.query_pairs_mut().append_pair("recurse", "true");
        debug!(%url, "Listing Consul keys");

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| classify(e, query_error))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(query_error(format!("{status}: {}", text.trim())));
        }

        let entries: Vec<ConsulKvEntry> = response
            .json()
            .await
            .map_err(|e| query_error(format!("invalid response body: {e}")))?;

        entries
            .into_iter()
            .map(|entry| {
                let value = match entry.value {
                    Some(encoded) => STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                        query_error(format!("invalid value for key {}: {}", entry.key, e))
                    })?,
                    None => Vec::new(),
                };
                Ok(KvPair::new(entry.key, value))
            })
            .collect()
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.write(reqwest::Method::PUT, key, Some(value.to_vec())).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.write(reqwest::Method::DELETE, key, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(config: StoreConfig) -> ConsulStore {
        ConsulStore::new(config).expect("Should build store")
    }

    #[test]
    fn test_kv_url_for_root_prefix() {
        let store = store(StoreConfig::default());
        let url = store.kv_url("").expect("Should build URL");
        assert_eq!(url.as_str(), "http://127.0.0.1:8500/v1/kv/");
    }

    #[test]
    fn test_kv_url_encodes_segments() {
        let store = store(StoreConfig::default());
        assert_eq!(
            store.kv_url("app/with space/x").expect("Should build URL").as_str(),
            "http://127.0.0.1:8500/v1/kv/app/with%20space/x"
        );
    }

    #[test]
    fn test_kv_url_with_datacenter() {
        let store = store(StoreConfig {
            datacenter: Some("dc2".to_string()),
            ..StoreConfig::default()
        });
        assert_eq!(
            store.kv_url("app/").expect("Should build URL").as_str(),
            "http://127.0.0.1:8500/v1/kv/app/?dc=dc2"
        );
    }

    #[test]
    fn test_kv_url_rejects_dot_segments() {
        let store = store(StoreConfig::default());
        assert!(store.kv_url("app/./y").is_err());
        assert!(store.kv_url("app/../x").is_err());
        assert!(store.kv_url("..").is_err());
        assert!(store.kv_url("app/.hidden/x").is_ok());
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let result = ConsulStore::new(StoreConfig {
            address: "not a url".to_string(),
            ..StoreConfig::default()
        });
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
