use std::time::Duration;

use async_trait::async_trait;
use pulse_core::AppConfig;
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ScienceError};
use crate::http::{DiskCache, RateLimitedClient, USER_AGENT};
use crate::identifiers::Doi;
use crate::sources::CitationSource;
use crate::types::CitationInfo;

const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
const API_KEY_HEADER: &str = "x-api-key";
const DOI_FIELDS: &str = "citationCount,year,isRetracted";
const SEARCH_FIELDS: &str = "title,citationCount,year,externalIds,isRetracted";

impl CitationInfo {
    pub fn from_json(v: &Value) -> Option<Self> {
        let obj = v.as_object().filter(|o| !o.is_empty())?;

        let paper_id = obj
            .get("paperId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);

        let citation_count = obj
            .get("citationCount")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);

        let year = obj
            .get("year")
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok());

        let doi = obj
            .get("externalIds")
            .and_then(|ids| ids.get("DOI"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);

        Some(Self {
            paper_id,
            citation_count,
            year,
            is_retracted: obj
                .get("isRetracted")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            doi,
        })
    }
}

pub struct SemanticScholarSource {
    client: RateLimitedClient,
    cache: DiskCache,
    api_key: Option<String>,
    base_url: String,
}

impl SemanticScholarSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config.sources.semantic_scholar_api_key.clone();
        let min_interval = if api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(1)
        };
        let client = RateLimitedClient::new(
            min_interval,
            config.http.max_retries,
            USER_AGENT,
            Duration::from_secs(config.http.citation_timeout_secs),
        )?;
        let cache = if config.cache.enabled {
            DiskCache::new("semantic_scholar", config.cache_ttl())
        } else {
            DiskCache::disabled()
        };
        Ok(Self::with_params(BASE_URL, client, cache, api_key))
    }

    pub fn with_params(
        base_url: &str,
        client: RateLimitedClient,
        cache: DiskCache,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            cache,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let value =
                HeaderValue::from_str(key).map_err(|e| ScienceError::Parse(e.to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }

    async fn get_json(&self, url: &str) -> Result<Option<Value>> {
        let Some(body) = self.client.get_optional(url, self.auth_headers()?).await? else {
            return Ok(None);
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ScienceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CitationSource for SemanticScholarSource {
    fn name(&self) -> &'static str {
        "semantic_scholar"
    }

    async fn fetch_by_doi(&self, doi: &Doi) -> Result<Option<CitationInfo>> {
        let key = format!("doi:{}", doi.normalized);
        if let Some(cached) = self.cache.get::<CitationInfo>(&key).await {
            return Ok(Some(cached));
        }

        let url = format!(
            "{}/paper/DOI:{}?fields={DOI_FIELDS}",
            self.base_url, doi.normalized
        );
        let Some(val) = self.get_json(&url).await? else {
            return Ok(None);
        };

        let info = CitationInfo::from_json(&val);
        if let Some(info) = &info {
            debug!(doi = %doi, citations = info.citation_count, "semantic scholar hit by DOI");
            self.cache.set(&key, info).await;
        }
        Ok(info)
    }

    async fn fetch_by_title(&self, title: &str) -> Result<Option<CitationInfo>> {
        let key = format!("title:{title}");
        if let Some(cached) = self.cache.get::<CitationInfo>(&key).await {
            return Ok(Some(cached));
        }

        let mut url = parse_base_url(&self.base_url)?;
        {
            let mut segs = url.path_segments_mut().map_err(|_| {
                ScienceError::Parse("invalid Semantic Scholar base URL".to_string())
            })?;
            segs.push("paper");
            segs.push("search");
        }
        url.query_pairs_mut()
            .append_pair("query", title)
            .append_pair("limit", "1")
            .append_pair("fields", SEARCH_FIELDS);

        let Some(val) = self.get_json(url.as_str()).await? else {
            return Ok(None);
        };

        let info = val
            .get("data")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(CitationInfo::from_json);
        if let Some(info) = &info {
            debug!(title, citations = info.citation_count, "semantic scholar hit by title");
            self.cache.set(&key, info).await;
        }
        Ok(info)
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).map_err(|e| ScienceError::Parse(format!("invalid URL {base_url}: {e}")))
}
