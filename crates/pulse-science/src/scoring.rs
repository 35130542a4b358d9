//! Research Integrity Measure: a weighted composite in [0, 100].
//!
//! Scoring runs in two passes over a batch. Each record's citations-per-year
//! is known from the merge step; the batch maximum is taken first, then every
//! record is scored against it.

use pulse_core::{CanonicalRecord, ScoredRecord};

pub const WEIGHT_CITATIONS: f64 = 0.25;
pub const WEIGHT_JOURNAL: f64 = 0.20;
pub const WEIGHT_OPENNESS: f64 = 0.15;
pub const WEIGHT_NON_RETRACTION: f64 = 0.20;
pub const WEIGHT_FUNDING: f64 = 0.10;
pub const WEIGHT_AFFILIATION: f64 = 0.05;
pub const WEIGHT_PROVENANCE: f64 = 0.05;

/// No journal-quality signal is collected; every paper gets the midpoint.
pub const JOURNAL_QUALITY_PLACEHOLDER: f64 = 0.5;
/// No provenance signal is collected.
pub const PROVENANCE_PLACEHOLDER: f64 = 0.0;

/// `citations / max(1, reference_year - year + 1)`; 0 when the year is unknown.
pub fn citations_per_year(citations: u32, year: Option<i32>, reference_year: i32) -> f64 {
    let Some(year) = year else {
        return 0.0;
    };
    let span = (i64::from(reference_year) - i64::from(year) + 1).max(1);
    f64::from(citations) / span as f64
}

/// Log-normalized citation velocity against the batch maximum.
pub fn citation_component(cpy: f64, max_cpy: f64) -> f64 {
    if max_cpy > 0.0 {
        (cpy.ln_1p() / max_cpy.ln_1p()).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// The seven components of one record, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub citations: f64,
    pub journal: f64,
    pub openness: f64,
    pub non_retraction: f64,
    pub funding: f64,
    pub affiliation: f64,
    pub provenance: f64,
}

impl SubScores {
    pub fn for_record(record: &CanonicalRecord, max_cpy: f64) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self {
            citations: citation_component(record.citations_per_year, max_cpy),
            journal: JOURNAL_QUALITY_PLACEHOLDER,
            openness: flag(record.is_open_access),
            non_retraction: flag(!record.is_retracted),
            funding: flag(record.funder_present),
            affiliation: record.affiliation_completeness.clamp(0.0, 1.0),
            provenance: PROVENANCE_PLACEHOLDER,
        }
    }

    pub fn weighted_sum(&self) -> f64 {
        WEIGHT_CITATIONS * self.citations
            + WEIGHT_JOURNAL * self.journal
            + WEIGHT_OPENNESS * self.openness
            + WEIGHT_NON_RETRACTION * self.non_retraction
            + WEIGHT_FUNDING * self.funding
            + WEIGHT_AFFILIATION * self.affiliation
            + WEIGHT_PROVENANCE * self.provenance
    }

    /// Composite score rounded to two decimals.
    pub fn rim(&self) -> f64 {
        round_to(100.0 * self.weighted_sum(), 2)
    }
}

/// Score a whole batch; order is preserved.
pub fn score_batch(records: Vec<CanonicalRecord>) -> Vec<ScoredRecord> {
    let max_cpy = records
        .iter()
        .map(|r| r.citations_per_year)
        .fold(0.0_f64, f64::max);

    records
        .into_iter()
        .map(|record| {
            let rim = SubScores::for_record(&record, max_cpy).rim();
            ScoredRecord::new(record, rim)
        })
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
