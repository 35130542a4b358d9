use std::time::Duration;

use async_trait::async_trait;
use pulse_core::AppConfig;
use reqwest::Url;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ScienceError};
use crate::http::{DiskCache, RateLimitedClient, USER_AGENT};
use crate::identifiers::doi::Doi;
use crate::sources::OpenAccessSource;

const BASE_URL: &str = "https://api.unpaywall.org/v2";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnpaywallResult {
    pub doi: String,
    pub is_oa: bool,
    pub oa_status: Option<String>,
}

impl UnpaywallResult {
    pub fn from_json(v: &Value) -> Self {
        Self {
            doi: v
                .get("doi")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            is_oa: v.get("is_oa").and_then(Value::as_bool).unwrap_or(false),
            oa_status: v
                .get("oa_status")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
        }
    }
}

pub struct UnpaywallSource {
    client: RateLimitedClient,
    cache: DiskCache,
    email: String,
    base_url: String,
}

impl UnpaywallSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = RateLimitedClient::new(
            Duration::from_millis(200),
            config.http.max_retries,
            USER_AGENT,
            Duration::from_secs(config.http.open_access_timeout_secs),
        )?;
        let cache = if config.cache.enabled {
            DiskCache::new("unpaywall", config.cache_ttl())
        } else {
            DiskCache::disabled()
        };
        Ok(Self::with_params(
            BASE_URL,
            client,
            cache,
            config.sources.unpaywall_email.clone(),
        ))
    }

    pub fn with_params(
        base_url: &str,
        client: RateLimitedClient,
        cache: DiskCache,
        email: String,
    ) -> Self {
        Self {
            client,
            cache,
            email,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `None` when Unpaywall has no record of the DOI.
    pub async fn check_oa(&self, doi: &Doi) -> Result<Option<UnpaywallResult>> {
        let cache_key = doi.normalized.to_string();
        if let Some(cached) = self.cache.get::<UnpaywallResult>(&cache_key).await {
            return Ok(Some(cached));
        }

        let mut url = Url::parse(&format!("{}/{}", self.base_url, doi.normalized))
            .map_err(|e| ScienceError::Parse(format!("invalid Unpaywall URL: {e}")))?;
        url.query_pairs_mut().append_pair("email", &self.email);

        let Some(body) = self.client.get_optional(url.as_str(), HeaderMap::new()).await? else {
            return Ok(None);
        };
        let json: Value =
            serde_json::from_str(&body).map_err(|e| ScienceError::Parse(e.to_string()))?;
        let result = UnpaywallResult::from_json(&json);

        self.cache.set(&cache_key, &result).await;
        Ok(Some(result))
    }
}

#[async_trait]
impl OpenAccessSource for UnpaywallSource {
    fn name(&self) -> &'static str {
        "unpaywall"
    }

    async fn is_open_access(&self, doi: &Doi) -> Result<bool> {
        Ok(self.check_oa(doi).await?.is_some_and(|r| r.is_oa))
    }
}
