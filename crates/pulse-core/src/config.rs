use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};

/// Upper bound for `http.max_retries`; backoff doubles per retry.
pub const MAX_RETRIES: u32 = 10;

/// Root application configuration, loaded from `~/.config/scholar-pulse/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub batch: BatchConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serpapi_key: Option<String>,
    pub unpaywall_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_scholar_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polite_pool_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Year citations-per-year is measured against.
    pub reference_year: i32,
    pub max_publications: usize,
    /// Pause between two papers of the same batch.
    pub politeness_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub profile_timeout_secs: u64,
    pub registry_timeout_secs: u64,
    pub citation_timeout_secs: u64,
    pub open_access_timeout_secs: u64,
    /// Upper bound on one resolver step, retries included.
    pub resolver_timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_hours: u64,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            unpaywall_email: "you@example.com".to_string(),
            semantic_scholar_api_key: None,
            polite_pool_email: None,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            reference_year: chrono::Utc::now().year(),
            max_publications: 10,
            politeness_delay_ms: 1000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            profile_timeout_secs: 30,
            registry_timeout_secs: 20,
            citation_timeout_secs: 15,
            open_access_timeout_secs: 15,
            resolver_timeout_secs: 45,
            max_retries: 2,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: 7 * 24,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/scholar-pulse/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SCHOLAR_PULSE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("scholar-pulse")
            .join("config.toml")
    }

    /// Load config from the standard path, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific path, falling back to defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Overlay values from the environment (`SERPAPI_KEY`, `UNPAYWALL_EMAIL`,
    /// `SEMANTIC_SCHOLAR_API_KEY`, `CURRENT_YEAR`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("SERPAPI_KEY") {
            self.sources.serpapi_key = Some(key);
        }
        if let Some(email) = non_empty("UNPAYWALL_EMAIL") {
            self.sources.unpaywall_email = email;
        }
        if let Some(key) = non_empty("SEMANTIC_SCHOLAR_API_KEY") {
            self.sources.semantic_scholar_api_key = Some(key);
        }
        if let Some(year) = non_empty("CURRENT_YEAR").and_then(|y| y.parse::<i32>().ok()) {
            self.batch.reference_year = year;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1000..=9999).contains(&self.batch.reference_year) {
            return Err(PulseError::ValidationError(format!(
                "reference year {} is not a 4-digit year",
                self.batch.reference_year
            )));
        }
        if self.batch.max_publications == 0 {
            return Err(PulseError::ValidationError(
                "batch.max_publications must be at least 1".to_string(),
            ));
        }
        if self.http.max_retries > MAX_RETRIES {
            return Err(PulseError::ValidationError(format!(
                "http.max_retries must be at most {MAX_RETRIES}"
            )));
        }
        Ok(())
    }

    // ─── Derived values ────────────────────────────────────

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.batch.politeness_delay_ms)
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_secs(self.http.resolver_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_hours * 3600)
    }
}
