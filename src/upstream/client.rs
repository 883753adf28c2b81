use crate::cache::{Fingerprint, ResponseCache};
use crate::config::UpstreamConfig;
use crate::search::filter::CompiledQuery;
use crate::upstream::error::UpstreamError;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identifies this client to the upstream API
pub const USER_AGENT: &str = concat!("housing-search/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the listings API.
///
/// Successful payloads are written to the shared [`ResponseCache`] before
/// being returned, unless the configuration changed while the request was in
/// flight.
pub struct UpstreamClient {
    connection: RwLock<Connection>,
    cache: Arc<ResponseCache>,
}

/// Current credential/base URL and the HTTP client built for it.
///
/// `epoch` is bumped whenever base URL or credential change.
struct Connection {
    config: UpstreamConfig,
    http: Client,
    epoch: u64,
}

fn build_http(timeout_secs: u64) -> Result<Client, UpstreamError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| UpstreamError::Configuration(format!("failed to create HTTP client: {e}")))
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig, cache: Arc<ResponseCache>) -> Result<Self, UpstreamError> {
        let http = build_http(config.timeout_secs)?;
        Ok(Self {
            connection: RwLock::new(Connection {
                config,
                http,
                epoch: 0,
            }),
            cache,
        })
    }

    pub fn config(&self) -> UpstreamConfig {
        self.connection.read().config.clone()
    }

    /// Swap credential, base URL and timeout.
    ///
    /// The cache is cleared when credential or base URL changed; returns the
    /// number of entries removed. A changed timeout rebuilds the HTTP client.
    pub fn reconfigure(&self, next: UpstreamConfig) -> Result<usize, UpstreamError> {
        let mut connection = self.connection.write();
        if next.timeout_secs != connection.config.timeout_secs {
            connection.http = build_http(next.timeout_secs)?;
            debug!("HTTP client rebuilt with {}s timeout", next.timeout_secs);
        }

        let changed = connection.config.differs_from(&next);
        if changed {
            connection.epoch += 1;
        }
        connection.config = next;
        drop(connection);

        if changed {
            info!("Upstream configuration changed, invalidating cache");
            Ok(self.cache.clear_all())
        } else {
            Ok(0)
        }
    }

    /// Perform one GET against `endpoint` with the compiled query
    pub async fn call(&self, endpoint: &str, query: &CompiledQuery) -> Result<Value, UpstreamError> {
        let (config, http, epoch) = {
            let connection = self.connection.read();
            (
                connection.config.clone(),
                connection.http.clone(),
                connection.epoch,
            )
        };
        let base = config.validate()?;

        let url = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let mut pairs: Vec<(&str, &str)> = query.pairs().collect();
        pairs.push(("access_token", config.server_token.as_str()));

        debug!("Requesting {} with {} parameters", url, pairs.len());

        let response = http
            .get(&url)
            .query(&pairs)
            .send()
            .await
            .map_err(|e| {
                warn!("Upstream transport failure: {}", e);
                UpstreamError::Transport(e.without_url().to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!("Failed to read upstream body: {}", e);
            UpstreamError::Transport(e.without_url().to_string())
        })?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!("Upstream returned status {}: {}", status.as_u16(), message);
            return Err(UpstreamError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let payload: Value = serde_json::from_slice(&body).map_err(|e| {
            warn!("Upstream JSON error: {}", e);
            UpstreamError::Decode(e.to_string())
        })?;
        if !payload.get("value").map_or(false, Value::is_array) {
            warn!("Upstream payload has no value array");
            return Err(UpstreamError::Decode(
                "response is missing the value array".to_string(),
            ));
        }

        // held across the put so a concurrent reconfigure clears after us
        let connection = self.connection.read();
        if connection.epoch == epoch {
            self.cache.put(Fingerprint::of(endpoint, query), payload.clone());
        } else {
            debug!("Configuration changed during request, not caching");
        }
        drop(connection);

        Ok(payload)
    }
}

/// Prefer the API's own error text over a bare status line
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let fallback = format!("API request failed with status {}", status.as_u16());
    let Ok(json) = serde_json::from_slice::<Value>(body) else {
        return fallback;
    };

    json.pointer("/error/message")
        .or_else(|| json.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_structured_fields() {
        let nested = br#"{"error":{"message":"Invalid token"}}"#;
        assert_eq!(error_message(StatusCode::UNAUTHORIZED, nested), "Invalid token");

        let flat = br#"{"message":"Slow down"}"#;
        assert_eq!(error_message(StatusCode::TOO_MANY_REQUESTS, flat), "Slow down");

        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, b"<html>oops</html>"),
            "API request failed with status 502"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, b""),
            "API request failed with status 404"
        );
    }

    #[tokio::test]
    async fn configuration_errors_fail_fast() {
        let cache = Arc::new(ResponseCache::default());
        let client = UpstreamClient::new(UpstreamConfig::new("http://insecure.test", "tok"), cache)
            .unwrap();
        let err = client.call("Property", &CompiledQuery::new()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Configuration(_)));
    }

    #[test]
    fn reconfigure_clears_only_on_change() {
        let cache = Arc::new(ResponseCache::default());
        let client = UpstreamClient::new(
            UpstreamConfig::new("https://api.test", "one"),
            cache.clone(),
        )
        .unwrap();

        cache.put(Fingerprint::of("Property", &CompiledQuery::new()), Value::Null);
        assert_eq!(client.reconfigure(UpstreamConfig::new("https://api.test", "one")).unwrap(), 0);
        assert_eq!(cache.len(), 1);

        let mut slower = UpstreamConfig::new("https://api.test", "one");
        slower.timeout_secs = 5;
        assert_eq!(client.reconfigure(slower).unwrap(), 0);
        assert_eq!(cache.len(), 1);
        assert_eq!(client.config().timeout_secs, 5);

        assert_eq!(client.reconfigure(UpstreamConfig::new("https://api.test", "two")).unwrap(), 1);
        assert!(cache.is_empty());
        assert_eq!(client.config().server_token, "two");
    }
}
