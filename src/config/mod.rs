//! Typed configuration.
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables prefixed `HOUSING_SEARCH_` (nested keys use `__`, e.g.
//! `HOUSING_SEARCH_UPSTREAM__SERVER_TOKEN`).

use crate::cache::DEFAULT_TTL_SECS;
use crate::mortgage::MortgageTerms;
use crate::search::types::{DEFAULT_LIMIT, MAX_LIMIT};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;

pub const ENV_PREFIX: &str = "HOUSING_SEARCH_";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("API token not configured")]
    MissingToken,
    #[error("API URL not configured")]
    MissingBaseUrl,
    #[error("invalid API URL {0:?}: an https URL is required")]
    InvalidBaseUrl(String),
    #[error("default limit {0} is outside 1..={max}", max = MAX_LIMIT)]
    InvalidLimit(u32),
    #[error("invalid mortgage terms: {0}")]
    InvalidMortgage(String),
}

/// Upstream credential and endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the listings API, e.g. `https://api.example.com/OData/test`
    pub base_url: String,
    /// Shared server token, sent as `access_token`
    pub server_token: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            server_token: String::new(),
            timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>, server_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            server_token: server_token.into(),
            ..Self::default()
        }
    }

    /// Check the credential and base URL; returns the parsed base URL
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.server_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        match Url::parse(self.base_url.trim()) {
            Ok(url) if url.host_str().is_some() && is_encrypted_or_local(&url) => Ok(url),
            _ => Err(ConfigError::InvalidBaseUrl(self.base_url.clone())),
        }
    }

    /// True when switching to `other` changes what the upstream would return
    pub fn differs_from(&self, other: &UpstreamConfig) -> bool {
        self.base_url != other.base_url || self.server_token != other.server_token
    }
}

/// https everywhere; plain http only to a loopback host (local mocks)
fn is_encrypted_or_local(url: &Url) -> bool {
    match url.scheme() {
        "https" => true,
        "http" => match url.host_str() {
            Some("localhost") => true,
            Some(host) => host
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false),
            None => false,
        },
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Row cap used when a search does not ask for one
    pub default_limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
        }
    }
}

/// Timing of the client-side search controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Quiet period before typed input triggers a search
    pub debounce_ms: u64,
    /// Window during which an identical search is suppressed
    pub cooldown_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            cooldown_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub client: ClientConfig,
    pub mortgage: MortgageTerms,
}

impl Config {
    /// Load from `path` (if it exists) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.upstream.validate()?;
        if !(1..=MAX_LIMIT).contains(&self.search.default_limit) {
            return Err(ConfigError::InvalidLimit(self.search.default_limit));
        }
        self.mortgage.validate().map_err(ConfigError::InvalidMortgage)?;
        Ok(())
    }
}
