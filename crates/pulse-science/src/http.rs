use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{Result, ScienceError};

pub const USER_AGENT: &str = "scholar-pulse/0.1";

// ─── RateLimitedClient ────────────────────────────────────────────────────────

/// HTTP client that keeps a minimum spacing between requests to one service.
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(
        min_interval: Duration,
        max_retries: u32,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
            max_retries,
        })
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    /// GET that treats 404 as an error like any other non-success status.
    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<String> {
        self.fetch(url, headers).await?.ok_or_else(|| {
            ScienceError::ApiError(url.to_string(), "HTTP 404: not found".to_string())
        })
    }

    /// GET where 404 means "no such record" and yields `Ok(None)`.
    pub async fn get_optional(&self, url: &str, headers: HeaderMap) -> Result<Option<String>> {
        self.fetch(url, headers).await
    }

    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<Option<String>> {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            let resp = self.client.get(url).headers(headers.clone()).send().await;
            match resp {
                Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = r
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    if attempt >= self.max_retries {
                        return Err(ScienceError::RateLimit(host_of(url), wait));
                    }
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(r) if r.status() == StatusCode::NOT_FOUND => return Ok(None),
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    return Err(ScienceError::ApiError(
                        url.to_string(),
                        format!("HTTP {status}: {body}"),
                    ));
                }
                Ok(r) => return r.text().await.map(Some).map_err(ScienceError::Http),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(ScienceError::Http(e));
                    }
                    let backoff = 2u64.saturating_pow(attempt);
                    sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToOwned::to_owned))
        .unwrap_or_else(|| "server".to_string())
}

// ─── DiskCache ────────────────────────────────────────────────────────────────

/// JSON file cache with a TTL. A disabled cache never hits and never writes.
pub struct DiskCache {
    dir: Option<PathBuf>,
    ttl: Duration,
}

fn cache_key_to_path(dir: &Path, key: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();
    dir.join(format!("{hash:016x}.json"))
}

#[derive(Serialize, serde::Deserialize)]
struct CacheEntry<T> {
    stored_at: u64, // Unix timestamp secs
    value: T,
}

impl DiskCache {
    pub fn new(namespace: &str, ttl: Duration) -> Self {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("scholar-pulse")
            .join("cache")
            .join(namespace);
        Self::in_dir(dir, ttl)
    }

    pub fn in_dir(dir: PathBuf, ttl: Duration) -> Self {
        let _ = std::fs::create_dir_all(&dir);
        Self {
            dir: Some(dir),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        Self {
            dir: None,
            ttl: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = cache_key_to_path(self.dir.as_deref()?, key);
        let data = tokio::fs::read(&path).await.ok()?;
        let entry: CacheEntry<T> = serde_json::from_slice(&data).ok()?;
        if unix_now().saturating_sub(entry.stored_at) > self.ttl.as_secs() {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        Some(entry.value)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let Some(dir) = self.dir.as_deref() else {
            return;
        };
        let entry = CacheEntry {
            stored_at: unix_now(),
            value,
        };
        if let Ok(data) = serde_json::to_vec(&entry) {
            let _ = tokio::fs::write(cache_key_to_path(dir, key), data).await;
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    fn test_client(min_interval: Duration) -> RateLimitedClient {
        RateLimitedClient::new(min_interval, 0, USER_AGENT, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn cache_set_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::in_dir(dir.path().to_path_buf(), Duration::from_secs(60));
        cache.set("key1", &"hello world").await;
        let val: Option<String> = cache.get("key1").await;
        assert_eq!(val, Some("hello world".to_string()));
    }

    #[tokio::test]
    async fn cache_expired_returns_none() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::in_dir(dir.path().to_path_buf(), Duration::from_secs(0));
        cache.set("key_exp", &42u32).await;
        sleep(Duration::from_millis(1100)).await;
        let val: Option<u32> = cache.get("key_exp").await;
        assert_eq!(val, None);
    }

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let cache = DiskCache::disabled();
        cache.set("k", &1u8).await;
        assert!(!cache.is_enabled());
        assert_eq!(cache.get::<u8>("k").await, None);
    }

    #[tokio::test]
    async fn not_found_is_none_for_optional_get() {
        let mut server = Server::new_async().await;
        let _m = server.mock("GET", "/missing").with_status(404).create_async().await;

        let client = test_client(Duration::ZERO);
        let url = format!("{}/missing", server.url());
        assert!(client.get_optional(&url, HeaderMap::new()).await.unwrap().is_none());
        assert!(matches!(client.get(&url).await, Err(ScienceError::ApiError(_, _))));
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/boom")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let client = test_client(Duration::ZERO);
        let err = client
            .get_optional(&format!("{}/boom", server.url()), HeaderMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn requests_are_spaced() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;

        let client = test_client(Duration::from_millis(200));
        let url = format!("{}/ok", server.url());
        let start = Instant::now();
        client.get(&url).await.unwrap();
        client.get(&url).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
