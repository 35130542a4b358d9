//! External source capabilities and their HTTP bindings.
//!
//! Every source returns `Result`; deciding what a failure means is left to
//! the resolvers, except for the author profile where failure is fatal.

use async_trait::async_trait;
use pulse_core::AuthorProfile;

use crate::error::Result;
use crate::identifiers::Doi;
use crate::types::{CitationInfo, RegistryWork};

pub mod crossref;
pub mod semantic_scholar;
pub mod serpapi;
pub mod unpaywall;

/// Author-profile source. Called once per run.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_author_profile(&self, author_id: &str) -> Result<AuthorProfile>;
}

/// Scholarly-metadata registry.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_by_doi(&self, doi: &Doi) -> Result<Option<RegistryWork>>;
    /// Best single match for a title.
    async fn fetch_by_title(&self, title: &str) -> Result<Option<RegistryWork>>;
}

/// Citation-graph service.
#[async_trait]
pub trait CitationSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_by_doi(&self, doi: &Doi) -> Result<Option<CitationInfo>>;
    /// Best single match for a title.
    async fn fetch_by_title(&self, title: &str) -> Result<Option<CitationInfo>>;
}

/// Open-access lookup.
#[async_trait]
pub trait OpenAccessSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn is_open_access(&self, doi: &Doi) -> Result<bool>;
}
