use std::time::Duration;

use async_trait::async_trait;
use pulse_core::{AppConfig, parse_year_value};
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ScienceError};
use crate::http::{DiskCache, RateLimitedClient, USER_AGENT};
use crate::identifiers::Doi;
use crate::sources::MetadataSource;
use crate::types::{RegistryAuthor, RegistryWork};

const BASE_URL: &str = "https://api.crossref.org";

pub struct CrossRefSource {
    client: RateLimitedClient,
    cache: DiskCache,
    base_url: String,
}

impl CrossRefSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let user_agent = match &config.sources.polite_pool_email {
            Some(email) => format!("{USER_AGENT} (mailto:{email})"),
            None => USER_AGENT.to_string(),
        };
        let client = RateLimitedClient::new(
            Duration::from_millis(100),
            config.http.max_retries,
            &user_agent,
            Duration::from_secs(config.http.registry_timeout_secs),
        )?;
        let cache = if config.cache.enabled {
            DiskCache::new("crossref", config.cache_ttl())
        } else {
            DiskCache::disabled()
        };
        Ok(Self::with_params(BASE_URL, client, cache))
    }

    pub fn with_params(base_url: &str, client: RateLimitedClient, cache: DiskCache) -> Self {
        Self {
            client,
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Option<Value>> {
        let Some(body) = self.client.get_optional(url, HeaderMap::new()).await? else {
            return Ok(None);
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ScienceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MetadataSource for CrossRefSource {
    fn name(&self) -> &'static str {
        "crossref"
    }

    async fn fetch_by_doi(&self, doi: &Doi) -> Result<Option<RegistryWork>> {
        let key = format!("doi:{}", doi.normalized);
        if let Some(cached) = self.cache.get::<RegistryWork>(&key).await {
            return Ok(Some(cached));
        }

        let url = format!("{}/works/{}", self.base_url, doi.normalized);
        let Some(val) = self.get_json(&url).await? else {
            return Ok(None);
        };

        let work = val.get("message").and_then(work_from_json);
        if let Some(work) = &work {
            debug!(doi = %doi, "crossref hit by DOI");
            self.cache.set(&key, work).await;
        }
        Ok(work)
    }

    async fn fetch_by_title(&self, title: &str) -> Result<Option<RegistryWork>> {
        let key = format!("title:{title}");
        if let Some(cached) = self.cache.get::<RegistryWork>(&key).await {
            return Ok(Some(cached));
        }

        let url = format!(
            "{}/works?query.title={}&rows=1",
            self.base_url,
            urlencoding::encode(title)
        );
        let Some(val) = self.get_json(&url).await? else {
            return Ok(None);
        };

        let work = val["message"]["items"]
            .as_array()
            .and_then(|items| items.first())
            .and_then(work_from_json);
        if let Some(work) = &work {
            debug!(title, "crossref hit by title");
            self.cache.set(&key, work).await;
        }
        Ok(work)
    }
}

/// Flatten a CrossRef `message` object. `None` when there is nothing to use.
pub fn work_from_json(v: &Value) -> Option<RegistryWork> {
    let obj = v.as_object().filter(|o| !o.is_empty())?;

    let doi = obj
        .get("DOI")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned);

    let authors = obj
        .get("author")
        .and_then(Value::as_array)
        .map(|a| a.iter().map(author_from_json).collect())
        .unwrap_or_default();

    let funders = obj
        .get("funder")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .map(|f| f["name"].as_str().unwrap_or_default().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    Some(RegistryWork {
        doi,
        title: string_list(obj.get("title")),
        container_title: string_list(obj.get("container-title")),
        volume: scalar_string(obj.get("volume")),
        issue: scalar_string(obj.get("issue")),
        issued_year: date_parts_year(obj.get("issued")),
        published_print_year: date_parts_year(obj.get("published-print")),
        authors,
        funders,
    })
}

fn author_from_json(v: &Value) -> RegistryAuthor {
    let name = match (v["given"].as_str(), v["family"].as_str()) {
        (Some(g), Some(f)) => format!("{g} {f}"),
        (None, Some(f)) => f.to_string(),
        (Some(g), None) => g.to_string(),
        (None, None) => v["name"].as_str().unwrap_or_default().to_string(),
    };

    // Affiliations come either as {"name": ...} objects or as bare strings.
    let affiliations = v["affiliation"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|aff| match aff {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(o) => o.get("name").and_then(Value::as_str),
                    _ => None,
                })
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();

    RegistryAuthor { name, affiliations }
}

fn date_parts_year(v: Option<&Value>) -> Option<i32> {
    v.and_then(|d| d.pointer("/date-parts/0/0"))
        .and_then(parse_year_value)
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn scalar_string(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
