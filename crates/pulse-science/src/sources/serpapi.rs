use std::time::Duration;

use async_trait::async_trait;
use pulse_core::{AppConfig, AuthorProfile};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ScienceError};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::sources::ProfileSource;

const BASE_URL: &str = "https://serpapi.com";
const ENGINE: &str = "google_scholar_author";

/// Google Scholar author profiles through SerpAPI.
///
/// Every failure here is reported as [`ScienceError::ProfileFetch`]: without a
/// profile there is nothing to analyze.
pub struct SerpApiSource {
    client: RateLimitedClient,
    api_key: Option<String>,
    base_url: String,
}

impl SerpApiSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = RateLimitedClient::new(
            Duration::ZERO,
            config.http.max_retries,
            USER_AGENT,
            Duration::from_secs(config.http.profile_timeout_secs),
        )?;
        Ok(Self::with_params(
            BASE_URL,
            client,
            config.sources.serpapi_key.clone(),
        ))
    }

    pub fn with_params(base_url: &str, client: RateLimitedClient, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn profile_url(&self, author_id: &str, api_key: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/search.json", self.base_url))
            .map_err(|e| ScienceError::ProfileFetch(format!("invalid SerpAPI URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("engine", ENGINE)
            .append_pair("author_id", author_id)
            .append_pair("api_key", api_key);
        Ok(url)
    }
}

#[async_trait]
impl ProfileSource for SerpApiSource {
    fn name(&self) -> &'static str {
        "serpapi"
    }

    async fn fetch_author_profile(&self, author_id: &str) -> Result<AuthorProfile> {
        let author_id = author_id.trim();
        if author_id.is_empty() {
            return Err(ScienceError::ProfileFetch("empty author id".to_string()));
        }
        let Some(api_key) = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        else {
            return Err(ScienceError::ProfileFetch(
                "SerpAPI key is not configured (set SERPAPI_KEY)".to_string(),
            ));
        };

        let url = self.profile_url(author_id, api_key)?;
        let body = self
            .client
            .get(url.as_str())
            .await
            .map_err(|e| ScienceError::ProfileFetch(redact(&e.to_string(), api_key)))?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ScienceError::ProfileFetch(format!("malformed profile payload: {e}")))?;

        if let Some(message) = json.get("error").and_then(Value::as_str) {
            return Err(ScienceError::ProfileFetch(message.to_string()));
        }

        let profile = AuthorProfile::from_json(&json);
        debug!(
            author_id,
            name = %profile.name,
            articles = profile.articles.len(),
            "fetched author profile"
        );
        Ok(profile)
    }
}

/// Error text carries the request URL, key included.
fn redact(message: &str, api_key: &str) -> String {
    message.replace(api_key, "***")
}
