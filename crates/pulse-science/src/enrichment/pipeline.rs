use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pulse_core::{AppConfig, BatchSummary, CanonicalRecord, PublicationStub, ScoredRecord};
use serde::Serialize;
use tracing::info;

use crate::enrichment::merge::{DOI_PRIORITY, LOOKUP_DOI_PRIORITY, PaperViews, merge_record};
use crate::error::Result;
use crate::identifiers::extract_doi;
use crate::resolvers::{CitationResolver, MetadataResolver, OpennessResolver};
use crate::scoring::score_batch;
use crate::sources::crossref::CrossRefSource;
use crate::sources::semantic_scholar::SemanticScholarSource;
use crate::sources::serpapi::SerpApiSource;
use crate::sources::unpaywall::UnpaywallSource;
use crate::sources::{CitationSource, MetadataSource, OpenAccessSource, ProfileSource};

/// Scored batch for one author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub author_name: String,
    pub records: Vec<ScoredRecord>,
    pub summary: BatchSummary,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Scored(BatchReport),
    /// The profile lists no publications; nothing was scored.
    NoPublications { author_name: String },
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub reference_year: i32,
    pub max_publications: usize,
    pub politeness_delay: Duration,
    pub resolver_timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            reference_year: config.batch.reference_year,
            max_publications: config.batch.max_publications,
            politeness_delay: config.politeness_delay(),
            resolver_timeout: config.resolver_timeout(),
        }
    }
}

/// Profile -> per-paper reconciliation -> batch scoring.
pub struct RimPipeline {
    profile: Arc<dyn ProfileSource>,
    metadata: MetadataResolver,
    citations: CitationResolver,
    openness: OpennessResolver,
    settings: PipelineSettings,
}

impl RimPipeline {
    pub fn new(
        profile: Arc<dyn ProfileSource>,
        registry: Arc<dyn MetadataSource>,
        citation_graph: Arc<dyn CitationSource>,
        open_access: Arc<dyn OpenAccessSource>,
        settings: PipelineSettings,
    ) -> Self {
        let timeout = settings.resolver_timeout;
        Self {
            profile,
            metadata: MetadataResolver::new(registry, timeout),
            citations: CitationResolver::new(citation_graph, timeout),
            openness: OpennessResolver::new(open_access, timeout),
            settings,
        }
    }

    /// Production pipeline wired to SerpAPI, Crossref, Semantic Scholar and Unpaywall.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(SerpApiSource::new(config)?),
            Arc::new(CrossRefSource::new(config)?),
            Arc::new(SemanticScholarSource::new(config)?),
            Arc::new(UnpaywallSource::new(config)?),
            PipelineSettings::from_config(config),
        ))
    }

    /// Analyze one author. Only a failed profile fetch is an error.
    pub async fn run(&self, author_id: &str) -> Result<BatchOutcome> {
        let profile = self.profile.fetch_author_profile(author_id).await?;
        let stubs: Vec<&PublicationStub> = profile
            .articles
            .iter()
            .take(self.settings.max_publications)
            .collect();

        if stubs.is_empty() {
            info!(author_id, author = %profile.name, "profile has no publications");
            return Ok(BatchOutcome::NoPublications {
                author_name: profile.name,
            });
        }

        let total = stubs.len();
        info!(author_id, author = %profile.name, papers = total, "analyzing publications");

        let mut records = Vec::with_capacity(total);
        for (idx, stub) in stubs.into_iter().enumerate() {
            if idx > 0 && !self.settings.politeness_delay.is_zero() {
                tokio::time::sleep(self.settings.politeness_delay).await;
            }
            let record = self.process(stub).await;
            info!(
                paper = idx + 1,
                total,
                title = %record.title,
                doi = record.doi_or_empty(),
                citations = record.citations,
                retracted = record.is_retracted,
                "processed paper"
            );
            records.push(record);
        }

        let records = score_batch(records);
        let summary = BatchSummary::from_records(&records);
        info!(
            papers = summary.paper_count,
            mean_rim = summary.mean_rim,
            "batch scored"
        );

        Ok(BatchOutcome::Scored(BatchReport {
            author_name: profile.name,
            records,
            summary,
            generated_at: Utc::now(),
        }))
    }

    /// Reconcile one stub into a canonical record. Never fails.
    pub async fn process(&self, stub: &PublicationStub) -> CanonicalRecord {
        let stub_doi = extract_doi(stub);
        let registry = self.metadata.resolve(stub_doi.as_ref(), &stub.title).await;

        let views = PaperViews {
            stub,
            stub_doi: stub_doi.as_ref(),
            registry: &registry,
            citations: None,
        };
        let citations = self
            .citations
            .resolve(views.resolve_doi(LOOKUP_DOI_PRIORITY), &stub.title, stub.cited_by)
            .await;

        let views = PaperViews {
            citations: Some(&citations),
            ..views
        };
        let is_open_access = self.openness.resolve(views.resolve_doi(DOI_PRIORITY)).await;

        merge_record(&views, is_open_access, self.settings.reference_year)
    }
}

#[cfg(test)]
mod tests {
    use pulse_core::AuthorProfile;
    use serde_json::json;

    use super::*;
    use crate::error::ScienceError;
    use crate::testing::{FixedOpenAccess, FixedProfile, Scripted};
    use crate::types::{CitationInfo, RegistryAuthor, RegistryWork};

    fn settings(max_publications: usize) -> PipelineSettings {
        PipelineSettings {
            reference_year: 2024,
            max_publications,
            politeness_delay: Duration::ZERO,
            resolver_timeout: Duration::from_secs(1),
        }
    }

    fn profile(articles: serde_json::Value) -> AuthorProfile {
        AuthorProfile::from_json(&json!({
            "author": {"name": "Ada Lovelace"},
            "articles": articles
        }))
    }

    fn pipeline(
        profile: Option<AuthorProfile>,
        registry: Scripted<RegistryWork>,
        citations: Scripted<CitationInfo>,
        open: FixedOpenAccess,
        max_publications: usize,
    ) -> RimPipeline {
        RimPipeline::new(
            Arc::new(FixedProfile(profile)),
            Arc::new(registry),
            Arc::new(citations),
            Arc::new(open),
            settings(max_publications),
        )
    }

    #[tokio::test]
    async fn undiscoverable_paper_keeps_inline_citations() {
        let p = pipeline(
            Some(profile(json!([{"title": "Lost paper", "cited_by": {"value": 12}}]))),
            Scripted::default(),
            Scripted::default(),
            FixedOpenAccess::open(&[]),
            10,
        );

        let BatchOutcome::Scored(report) = p.run("abc").await.unwrap() else {
            panic!("expected a scored batch");
        };
        let record = &report.records[0].record;
        assert_eq!(record.citations, 12);
        assert_eq!(record.doi_or_empty(), "");
        assert!(!record.is_open_access);
        assert_eq!(report.author_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn full_reconciliation_of_one_paper() {
        let registry = Scripted::default().with_doi(
            "10.1000/xyz",
            RegistryWork {
                doi: Some("10.1000/xyz".to_string()),
                title: vec!["Canonical title".to_string()],
                container_title: vec!["Nature".to_string()],
                issued_year: Some(2020),
                authors: ["A", "B", "C"]
                    .iter()
                    .map(|n| RegistryAuthor {
                        name: n.to_string(),
                        affiliations: vec![format!("{n} University")],
                    })
                    .collect(),
                funders: vec!["NSF".to_string(), "ERC".to_string()],
                ..Default::default()
            },
        );
        let citations = Scripted::default().with_doi(
            "10.1000/xyz",
            CitationInfo {
                citation_count: 50,
                ..Default::default()
            },
        );
        let p = pipeline(
            Some(profile(json!([{
                "title": "Profile title",
                "links": [{"link": "https://doi.org/10.1000/XYZ"}]
            }]))),
            registry,
            citations,
            FixedOpenAccess::open(&["10.1000/xyz"]),
            10,
        );

        let BatchOutcome::Scored(report) = p.run("abc").await.unwrap() else {
            panic!("expected a scored batch");
        };
        let scored = &report.records[0];
        assert_eq!(scored.record.title, "Canonical title");
        assert_eq!(scored.record.num_authors, 3);
        assert_eq!(scored.record.authors_with_affiliation, 3);
        assert_eq!(scored.record.affiliation_completeness, 1.0);
        assert!(scored.record.funder_present);
        assert!(scored.record.is_open_access);
        assert_eq!(scored.record.citations_per_year, 10.0);
        // Single paper: C = 1, every flag set.
        assert_eq!(scored.rim(), 85.0);
        assert_eq!(report.summary.total_citations, 50);
    }

    #[tokio::test]
    async fn title_search_doi_unlocks_open_access() {
        let citations = Scripted::default().with_title(
            "Found by title",
            CitationInfo {
                citation_count: 8,
                doi: Some("10.2000/found".to_string()),
                ..Default::default()
            },
        );
        let open = Arc::new(FixedOpenAccess::open(&["10.2000/found"]));
        let p = RimPipeline::new(
            Arc::new(FixedProfile(None)),
            Arc::new(Scripted::<RegistryWork>::default()),
            Arc::new(citations),
            open.clone(),
            settings(10),
        );

        let record = p.process(&PublicationStub::new("Found by title")).await;
        assert_eq!(record.doi.as_deref(), Some("10.2000/found"));
        assert_eq!(record.citations, 8);
        assert!(record.is_open_access);
        assert_eq!(open.calls(), 1);
    }

    #[tokio::test]
    async fn registry_doi_keys_later_lookups() {
        let registry = Scripted::default().with_title(
            "Registry keyed",
            RegistryWork {
                doi: Some("10.3000/reg".to_string()),
                title: vec!["Registry keyed".to_string()],
                ..Default::default()
            },
        );
        let citations = Arc::new(
            Scripted::default()
                .with_doi(
                    "10.3000/reg",
                    CitationInfo {
                        citation_count: 9,
                        ..Default::default()
                    },
                )
                .with_title(
                    "Registry keyed",
                    CitationInfo {
                        citation_count: 500,
                        doi: Some("10.9999/other".to_string()),
                        ..Default::default()
                    },
                ),
        );
        let open = Arc::new(FixedOpenAccess::open(&["10.3000/reg"]));
        let p = RimPipeline::new(
            Arc::new(FixedProfile(None)),
            Arc::new(registry),
            citations.clone(),
            open.clone(),
            settings(10),
        );

        let record = p.process(&PublicationStub::new("Registry keyed")).await;
        assert_eq!(record.doi.as_deref(), Some("10.3000/reg"));
        assert_eq!(record.citations, 9);
        assert!(record.is_open_access);
        assert_eq!(citations.doi_calls(), 1);
        assert_eq!(citations.title_calls(), 0);
        assert_eq!(open.calls(), 1);
    }

    #[tokio::test]
    async fn batch_is_capped_and_ordered() {
        let articles: Vec<_> = (0..15).map(|i| json!({"title": format!("P{i}")})).collect();
        let p = pipeline(
            Some(profile(json!(articles))),
            Scripted::default(),
            Scripted::default(),
            FixedOpenAccess::default(),
            10,
        );

        let BatchOutcome::Scored(report) = p.run("abc").await.unwrap() else {
            panic!("expected a scored batch");
        };
        assert_eq!(report.records.len(), 10);
        assert_eq!(report.summary.paper_count, 10);
        for (i, r) in report.records.iter().enumerate() {
            assert_eq!(r.record.title, format!("P{i}"));
        }
    }

    #[tokio::test]
    async fn empty_profile_skips_scoring() {
        let p = pipeline(
            Some(profile(json!([]))),
            Scripted::default(),
            Scripted::default(),
            FixedOpenAccess::default(),
            10,
        );
        assert!(matches!(
            p.run("abc").await.unwrap(),
            BatchOutcome::NoPublications { author_name } if author_name == "Ada Lovelace"
        ));
    }

    #[tokio::test]
    async fn profile_failure_aborts() {
        let p = pipeline(
            None,
            Scripted::default(),
            Scripted::default(),
            FixedOpenAccess::default(),
            10,
        );
        assert!(matches!(
            p.run("abc").await,
            Err(ScienceError::ProfileFetch(_))
        ));
    }

    #[tokio::test]
    async fn failing_sources_never_drop_records() {
        let p = pipeline(
            Some(profile(json!([
                {"title": "One", "cited_by": 3, "external_ids": {"DOI": "10.1000/one"}},
                {"title": "Two"}
            ]))),
            Scripted::failing(),
            Scripted::failing(),
            FixedOpenAccess::failing(),
            10,
        );

        let BatchOutcome::Scored(report) = p.run("abc").await.unwrap() else {
            panic!("expected a scored batch");
        };
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].record.citations, 3);
        assert_eq!(report.records[0].record.doi.as_deref(), Some("10.1000/one"));
        assert!(!report.records[0].record.is_open_access);
    }
}
