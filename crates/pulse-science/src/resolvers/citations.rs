use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::identifiers::Doi;
use crate::resolvers::bounded;
use crate::sources::CitationSource;
use crate::types::CitationInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    Doi,
    Title,
}

/// What one citation-service query reported. A failed query reports nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct CitationAttempt {
    pub strategy: LookupStrategy,
    pub citations: u32,
    pub year: Option<i32>,
    pub retracted: bool,
    pub doi: Option<String>,
}

impl CitationAttempt {
    fn empty(strategy: LookupStrategy) -> Self {
        Self {
            strategy,
            citations: 0,
            year: None,
            retracted: false,
            doi: None,
        }
    }

    fn from_info(strategy: LookupStrategy, info: CitationInfo) -> Self {
        Self {
            strategy,
            citations: info.citation_count,
            year: info.year,
            retracted: info.is_retracted,
            doi: info.doi,
        }
    }

    /// A DOI answer this empty leaves room for a title search.
    fn is_inconclusive(&self) -> bool {
        self.citations == 0 && !self.retracted
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationOutcome {
    pub citations: u32,
    pub year: Option<i32>,
    pub retracted: bool,
    /// DOI surfaced by a title search when none was known beforehand.
    pub discovered_doi: Option<Doi>,
}

impl CitationOutcome {
    /// Fold attempts in query order, then fall back to the inline count.
    ///
    /// Retraction is sticky across attempts. A title answer only replaces the
    /// count when it is non-zero.
    pub fn fold(attempts: &[CitationAttempt], known_doi: bool, inline: Option<u32>) -> Self {
        let mut out = Self::default();
        for attempt in attempts {
            out.retracted |= attempt.retracted;
            match attempt.strategy {
                LookupStrategy::Doi => {
                    out.citations = attempt.citations;
                    out.year = attempt.year;
                }
                LookupStrategy::Title if attempt.citations > 0 => {
                    out.citations = attempt.citations;
                    out.year = out.year.or(attempt.year);
                    if !known_doi && out.discovered_doi.is_none() {
                        out.discovered_doi =
                            attempt.doi.as_deref().and_then(|d| Doi::parse(d).ok());
                    }
                }
                LookupStrategy::Title => {}
            }
        }

        if out.citations == 0 {
            out.citations = inline.unwrap_or(0);
        }
        out
    }
}

pub struct CitationResolver {
    source: Arc<dyn CitationSource>,
    timeout: Duration,
}

impl CitationResolver {
    pub fn new(source: Arc<dyn CitationSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Citation count, year and retraction for one paper. Never fails.
    pub async fn resolve(
        &self,
        doi: Option<&Doi>,
        title: &str,
        inline: Option<u32>,
    ) -> CitationOutcome {
        let attempts = self.attempts(doi, title).await;
        CitationOutcome::fold(&attempts, doi.is_some(), inline)
    }

    async fn attempts(&self, doi: Option<&Doi>, title: &str) -> Vec<CitationAttempt> {
        let name = self.source.name();
        let mut attempts = Vec::with_capacity(2);

        if let Some(doi) = doi {
            let attempt = bounded(name, "doi", self.timeout, self.source.fetch_by_doi(doi))
                .await
                .flatten()
                .map_or_else(
                    || CitationAttempt::empty(LookupStrategy::Doi),
                    |info| CitationAttempt::from_info(LookupStrategy::Doi, info),
                );
            attempts.push(attempt);
        }

        let needs_title = attempts.first().is_none_or(CitationAttempt::is_inconclusive);
        let title = title.trim();
        if needs_title && !title.is_empty() {
            debug!(title, source = name, "citation lookup by title");
            let attempt = bounded(name, "title", self.timeout, self.source.fetch_by_title(title))
                .await
                .flatten()
                .map_or_else(
                    || CitationAttempt::empty(LookupStrategy::Title),
                    |info| CitationAttempt::from_info(LookupStrategy::Title, info),
                );
            attempts.push(attempt);
        }

        attempts
    }
}
