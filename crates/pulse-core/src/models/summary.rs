use serde::{Deserialize, Serialize};

use super::record::ScoredRecord;

/// Aggregates over one scored batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub paper_count: usize,
    pub mean_rim: f64,
    pub total_citations: u64,
    /// Fraction of papers that are open access, in [0, 1].
    pub open_access_share: f64,
}

impl BatchSummary {
    pub fn from_records(records: &[ScoredRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let n = records.len() as f64;
        let rim_sum: f64 = records.iter().map(ScoredRecord::rim).sum();
        let open = records.iter().filter(|r| r.record.is_open_access).count();

        Self {
            paper_count: records.len(),
            mean_rim: rim_sum / n,
            total_citations: records.iter().map(|r| u64::from(r.record.citations)).sum(),
            open_access_share: open as f64 / n,
        }
    }

    pub fn open_access_percent(&self) -> f64 {
        self.open_access_share * 100.0
    }
}
