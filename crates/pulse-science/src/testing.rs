//! In-memory sources for resolver and pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pulse_core::AuthorProfile;

use crate::error::{Result, ScienceError};
use crate::identifiers::Doi;
use crate::sources::{CitationSource, MetadataSource, OpenAccessSource, ProfileSource};
use crate::types::{CitationInfo, RegistryWork};

/// Answers lookups from fixed tables and counts calls.
pub struct Scripted<T> {
    by_doi: HashMap<String, T>,
    by_title: HashMap<String, T>,
    fail: bool,
    delay: Option<Duration>,
    doi_calls: AtomicUsize,
    title_calls: AtomicUsize,
}

impl<T> Default for Scripted<T> {
    fn default() -> Self {
        Self {
            by_doi: HashMap::new(),
            by_title: HashMap::new(),
            fail: false,
            delay: None,
            doi_calls: AtomicUsize::new(0),
            title_calls: AtomicUsize::new(0),
        }
    }
}

impl<T: Clone> Scripted<T> {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_doi(mut self, doi: &str, value: T) -> Self {
        self.by_doi.insert(doi.to_lowercase(), value);
        self
    }

    pub fn with_title(mut self, title: &str, value: T) -> Self {
        self.by_title.insert(title.to_string(), value);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn doi_calls(&self) -> usize {
        self.doi_calls.load(Ordering::SeqCst)
    }

    pub fn title_calls(&self) -> usize {
        self.title_calls.load(Ordering::SeqCst)
    }

    async fn answer_doi(&self, doi: &Doi) -> Result<Option<T>> {
        self.doi_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(self.by_doi.get(&doi.normalized)).await
    }

    async fn answer_title(&self, title: &str) -> Result<Option<T>> {
        self.title_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(self.by_title.get(title)).await
    }

    async fn answer(&self, hit: Option<&T>) -> Result<Option<T>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ScienceError::ApiError(
                "scripted".to_string(),
                "HTTP 503: unavailable".to_string(),
            ));
        }
        Ok(hit.cloned())
    }
}

#[async_trait]
impl MetadataSource for Scripted<RegistryWork> {
    fn name(&self) -> &'static str {
        "scripted-registry"
    }

    async fn fetch_by_doi(&self, doi: &Doi) -> Result<Option<RegistryWork>> {
        self.answer_doi(doi).await
    }

    async fn fetch_by_title(&self, title: &str) -> Result<Option<RegistryWork>> {
        self.answer_title(title).await
    }
}

#[async_trait]
impl CitationSource for Scripted<CitationInfo> {
    fn name(&self) -> &'static str {
        "scripted-citations"
    }

    async fn fetch_by_doi(&self, doi: &Doi) -> Result<Option<CitationInfo>> {
        self.answer_doi(doi).await
    }

    async fn fetch_by_title(&self, title: &str) -> Result<Option<CitationInfo>> {
        self.answer_title(title).await
    }
}

/// Open-access lookup backed by a set of open DOIs.
#[derive(Default)]
pub struct FixedOpenAccess {
    open: HashSet<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl FixedOpenAccess {
    pub fn open(dois: &[&str]) -> Self {
        Self {
            open: dois.iter().map(|d| d.to_lowercase()).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OpenAccessSource for FixedOpenAccess {
    fn name(&self) -> &'static str {
        "fixed-open-access"
    }

    async fn is_open_access(&self, doi: &Doi) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScienceError::Parse("scripted failure".to_string()));
        }
        Ok(self.open.contains(&doi.normalized))
    }
}

/// Profile source returning a fixed profile, or failing when there is none.
pub struct FixedProfile(pub Option<AuthorProfile>);

#[async_trait]
impl ProfileSource for FixedProfile {
    fn name(&self) -> &'static str {
        "fixed-profile"
    }

    async fn fetch_author_profile(&self, author_id: &str) -> Result<AuthorProfile> {
        self.0
            .clone()
            .ok_or_else(|| ScienceError::ProfileFetch(format!("no profile for {author_id}")))
    }
}
