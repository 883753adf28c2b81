use crate::cache::{Fingerprint, ResponseCache};
use crate::client::SearchBackend;
use crate::config::{Config, UpstreamConfig};
use crate::models::{Listing, SearchReply, SearchResults};
use crate::search::error::SearchError;
use crate::search::filter::{compile_query, single_key_query, CompiledQuery, PROPERTY_ENDPOINT};
use crate::search::sanitize::sanitize;
use crate::search::types::RawParams;
use crate::upstream::UpstreamClient;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type SearchOutcome = Result<SearchResults, SearchError>;

/// One named step of a connection test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionCheck {
    pub name: &'static str,
    pub success: bool,
    pub message: String,
}

/// Result of probing the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub checks: Vec<ConnectionCheck>,
}

/// Sanitize, compile, serve from cache or upstream, decorate with photos
pub struct SearchService {
    upstream: UpstreamClient,
    cache: Arc<ResponseCache>,
    default_limit: u32,
}

impl SearchService {
    pub fn new(config: &Config) -> Result<Self, SearchError> {
        let cache = Arc::new(ResponseCache::new(config.cache.ttl_secs, config.cache.enabled));
        Self::with_cache(config.upstream.clone(), cache, config.search.default_limit)
    }

    pub fn with_cache(
        upstream: UpstreamConfig,
        cache: Arc<ResponseCache>,
        default_limit: u32,
    ) -> Result<Self, SearchError> {
        let upstream = UpstreamClient::new(upstream, cache.clone())?;
        Ok(Self {
            upstream,
            cache,
            default_limit,
        })
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub async fn search(&self, raw: &RawParams) -> SearchOutcome {
        let params = sanitize(raw, self.default_limit);
        let query = compile_query(&params);
        debug!("Compiled filter: {:?}", query.get("$filter"));

        let payload = self.fetch(PROPERTY_ENDPOINT, &query).await?;
        let results = SearchResults::from_payload(&payload).ok_or_else(|| {
            warn!("Search payload has no value array");
            SearchError::Decode("response is missing the value array".to_string())
        })?;
        info!("Search returned {} listings", results.count);
        Ok(results)
    }

    /// [`Self::search`] flattened into what the rendering side consumes
    pub async fn reply(&self, raw: &RawParams) -> SearchReply {
        match self.search(raw).await {
            Ok(results) => SearchReply::Results(results),
            Err(err) => SearchReply::Error {
                error: err
                    .user_message()
                    .unwrap_or_else(|| "Search failed. Please try again.".to_string()),
            },
        }
    }

    /// Look up one listing by its `ListingKey`
    pub async fn get_listing(&self, listing_key: &str) -> Result<Option<Listing>, SearchError> {
        self.single("ListingKey", listing_key).await
    }

    /// Look up one listing by its MLS number (`ListingId`)
    pub async fn get_listing_by_mls_id(&self, mls_id: &str) -> Result<Option<Listing>, SearchError> {
        self.single("ListingId", mls_id).await
    }

    async fn single(&self, field: &str, value: &str) -> Result<Option<Listing>, SearchError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SearchError::InvalidRequest(format!("Invalid {field}")));
        }

        let payload = self.fetch(PROPERTY_ENDPOINT, &single_key_query(field, value)).await?;
        let records = payload
            .get("value")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchError::Decode("response is missing the value array".to_string()))?;
        Ok(records.first().and_then(Listing::from_raw))
    }

    async fn fetch(&self, endpoint: &str, query: &CompiledQuery) -> Result<Arc<Value>, SearchError> {
        let key = Fingerprint::of(endpoint, query);
        if let Some(entry) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(entry.payload);
        }

        debug!("Cache miss for {}", key);
        match self.upstream.call(endpoint, query).await {
            Ok(payload) => Ok(Arc::new(payload)),
            Err(err) => {
                warn!("Upstream call failed: {}", err);
                Err(err.into())
            }
        }
    }

    /// Probe the API with a one-row request
    pub async fn test_connection(&self) -> ConnectionReport {
        let query = CompiledQuery::new()
            .with("$top", "1")
            .with("$select", "ListingKey,ListPrice");

        let mut checks = Vec::new();
        match self.upstream.call(PROPERTY_ENDPOINT, &query).await {
            Err(err) => checks.push(ConnectionCheck {
                name: "Basic Connection",
                success: false,
                message: SearchError::from(err)
                    .user_message()
                    .unwrap_or_default(),
            }),
            Ok(payload) => {
                checks.push(ConnectionCheck {
                    name: "Basic Connection",
                    success: true,
                    message: "Connected successfully".to_string(),
                });
                // the upstream client rejects payloads without a value array
                let found = payload.get("value").and_then(Value::as_array).map_or(0, Vec::len);
                checks.push(ConnectionCheck {
                    name: "Data Structure",
                    success: true,
                    message: format!("Found {} properties", found),
                });
            }
        }

        ConnectionReport {
            success: checks.iter().all(|c| c.success),
            checks,
        }
    }

    pub fn clear_cache(&self) -> usize {
        self.cache.clear_all()
    }

    /// Apply new credentials, base URL or timeout; the cache is invalidated
    /// when credentials or base URL change
    pub fn update_upstream_config(&self, config: UpstreamConfig) -> Result<usize, SearchError> {
        Ok(self.upstream.reconfigure(config)?)
    }
}

#[async_trait]
impl SearchBackend for SearchService {
    async fn search(&self, params: RawParams) -> SearchOutcome {
        SearchService::search(self, &params).await
    }
}
