use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::identifiers::Doi;
use crate::resolvers::bounded;
use crate::sources::MetadataSource;
use crate::types::RegistryWork;

/// Flat registry view of one paper. `Default` means the registry had nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryMetadata {
    pub doi: Option<Doi>,
    pub title: Option<String>,
    pub venue: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub issued_year: Option<i32>,
    pub published_print_year: Option<i32>,
    pub num_authors: u32,
    pub authors_with_affiliation: u32,
    /// Unique affiliation names, first-seen order.
    pub affiliations: Vec<String>,
    pub funder_present: bool,
    matched: bool,
}

impl RegistryMetadata {
    pub fn from_work(work: &RegistryWork) -> Self {
        let mut affiliations: Vec<String> = Vec::new();
        let mut authors_with_affiliation = 0u32;
        for author in &work.authors {
            if author.affiliations.is_empty() {
                continue;
            }
            authors_with_affiliation += 1;
            for name in &author.affiliations {
                if !affiliations.contains(name) {
                    affiliations.push(name.clone());
                }
            }
        }

        Self {
            doi: work.doi.as_deref().and_then(|d| Doi::parse(d).ok()),
            title: work.first_title().map(ToOwned::to_owned),
            venue: work.first_container_title().map(ToOwned::to_owned),
            volume: work.volume.clone(),
            issue: work.issue.clone(),
            issued_year: work.issued_year,
            published_print_year: work.published_print_year,
            num_authors: u32::try_from(work.authors.len()).unwrap_or(u32::MAX),
            authors_with_affiliation,
            affiliations,
            funder_present: !work.funders.is_empty(),
            matched: true,
        }
    }

    /// Whether the registry returned a record at all.
    pub fn is_match(&self) -> bool {
        self.matched
    }
}

pub struct MetadataResolver {
    source: Arc<dyn MetadataSource>,
    timeout: Duration,
}

impl MetadataResolver {
    pub fn new(source: Arc<dyn MetadataSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// DOI lookup first, then best title match. Never fails.
    pub async fn resolve(&self, doi: Option<&Doi>, title: &str) -> RegistryMetadata {
        let name = self.source.name();

        if let Some(doi) = doi {
            let hit = bounded(name, "doi", self.timeout, self.source.fetch_by_doi(doi))
                .await
                .flatten();
            if let Some(work) = hit {
                return RegistryMetadata::from_work(&work);
            }
            debug!(%doi, source = name, "no registry record for DOI, trying title");
        }

        let title = title.trim();
        if title.is_empty() {
            return RegistryMetadata::default();
        }

        bounded(name, "title", self.timeout, self.source.fetch_by_title(title))
            .await
            .flatten()
            .map(|work| RegistryMetadata::from_work(&work))
            .unwrap_or_default()
    }
}
