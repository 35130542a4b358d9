use pulse_core::{CanonicalRecord, PublicationStub};

use crate::identifiers::Doi;
use crate::resolvers::{CitationOutcome, RegistryMetadata};
use crate::scoring::citations_per_year;

/// Where a text field may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    RegistryTitle,
    StubTitle,
    RegistryVenue,
    StubPublicationName,
    StubSource,
    RegistryVolume,
    RegistryIssue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSource {
    RegistryIssued,
    RegistryPublishedPrint,
    StubYear,
    StubPublicationYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorCountSource {
    Registry,
    Stub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoiSource {
    Registry,
    Stub,
    CitationService,
}

pub const TITLE_PRIORITY: &[TextSource] = &[TextSource::RegistryTitle, TextSource::StubTitle];
pub const VENUE_PRIORITY: &[TextSource] = &[
    TextSource::RegistryVenue,
    TextSource::StubPublicationName,
    TextSource::StubSource,
];
pub const VOLUME_PRIORITY: &[TextSource] = &[TextSource::RegistryVolume];
pub const ISSUE_PRIORITY: &[TextSource] = &[TextSource::RegistryIssue];
pub const YEAR_PRIORITY: &[YearSource] = &[
    YearSource::RegistryIssued,
    YearSource::RegistryPublishedPrint,
    YearSource::StubYear,
    YearSource::StubPublicationYear,
];
pub const AUTHOR_COUNT_PRIORITY: &[AuthorCountSource] =
    &[AuthorCountSource::Registry, AuthorCountSource::Stub];
/// Key for the citation lookup, before the citation service has answered.
pub const LOOKUP_DOI_PRIORITY: &[DoiSource] = &[DoiSource::Registry, DoiSource::Stub];
pub const DOI_PRIORITY: &[DoiSource] = &[
    DoiSource::Registry,
    DoiSource::Stub,
    DoiSource::CitationService,
];

/// Evaluate a priority table; the first candidate with a value wins.
pub fn first_match<C, T, F>(table: &[C], pick: F) -> Option<T>
where
    C: Copy,
    F: Fn(C) -> Option<T>,
{
    table.iter().copied().find_map(pick)
}

/// Partial views of one paper, gathered before merging.
#[derive(Debug, Clone, Copy)]
pub struct PaperViews<'a> {
    pub stub: &'a PublicationStub,
    pub stub_doi: Option<&'a Doi>,
    pub registry: &'a RegistryMetadata,
    /// Absent until the citation service has been consulted.
    pub citations: Option<&'a CitationOutcome>,
}

impl<'a> PaperViews<'a> {
    pub fn text(&self, source: TextSource) -> Option<&'a str> {
        let value = match source {
            TextSource::RegistryTitle => self.registry.title.as_deref(),
            TextSource::StubTitle => Some(self.stub.title.as_str()),
            TextSource::RegistryVenue => self.registry.venue.as_deref(),
            TextSource::StubPublicationName => self.stub.publication_name.as_deref(),
            TextSource::StubSource => self.stub.source_name.as_deref(),
            TextSource::RegistryVolume => self.registry.volume.as_deref(),
            TextSource::RegistryIssue => self.registry.issue.as_deref(),
        };
        value.map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn year(&self, source: YearSource) -> Option<i32> {
        match source {
            YearSource::RegistryIssued => self.registry.issued_year,
            YearSource::RegistryPublishedPrint => self.registry.published_print_year,
            YearSource::StubYear => self.stub.year,
            YearSource::StubPublicationYear => self.stub.publication_year,
        }
    }

    pub fn author_count(&self, source: AuthorCountSource) -> Option<u32> {
        let n = match source {
            AuthorCountSource::Registry => self.registry.num_authors,
            AuthorCountSource::Stub => u32::try_from(self.stub.authors.len()).unwrap_or(u32::MAX),
        };
        (n > 0).then_some(n)
    }

    pub fn doi(&self, source: DoiSource) -> Option<&'a Doi> {
        match source {
            DoiSource::Registry => self.registry.doi.as_ref(),
            DoiSource::Stub => self.stub_doi,
            DoiSource::CitationService => self.citations.and_then(|c| c.discovered_doi.as_ref()),
        }
    }

    pub fn resolve_doi(&self, table: &[DoiSource]) -> Option<&'a Doi> {
        first_match(table, |s| self.doi(s))
    }

    fn resolve_text(&self, table: &[TextSource]) -> String {
        first_match(table, |s| self.text(s))
            .unwrap_or_default()
            .to_string()
    }
}

/// Build the canonical record for one paper.
pub fn merge_record(
    views: &PaperViews<'_>,
    is_open_access: bool,
    reference_year: i32,
) -> CanonicalRecord {
    let doi = views.resolve_doi(DOI_PRIORITY);
    let year = first_match(YEAR_PRIORITY, |s| views.year(s));
    let num_authors = first_match(AUTHOR_COUNT_PRIORITY, |s| views.author_count(s)).unwrap_or(0);
    let authors_with_affiliation = views.registry.authors_with_affiliation.min(num_authors);
    let affiliation_completeness = if num_authors > 0 {
        f64::from(authors_with_affiliation) / f64::from(num_authors)
    } else {
        0.0
    };
    let (citations, is_retracted) = views
        .citations
        .map(|c| (c.citations, c.retracted))
        .unwrap_or_default();

    CanonicalRecord {
        title: views.resolve_text(TITLE_PRIORITY),
        doi: doi.map(|d| d.normalized.clone()),
        venue: views.resolve_text(VENUE_PRIORITY),
        volume: views.resolve_text(VOLUME_PRIORITY),
        issue: views.resolve_text(ISSUE_PRIORITY),
        year,
        num_authors,
        affiliations: views.registry.affiliations.clone(),
        authors_with_affiliation,
        affiliation_completeness,
        funder_present: views.registry.funder_present,
        citations,
        is_retracted,
        is_open_access: is_open_access && doi.is_some(),
        citations_per_year: citations_per_year(citations, year, reference_year),
    }
}
