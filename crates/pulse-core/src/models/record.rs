use std::fmt;

use serde::{Deserialize, Serialize};

/// One paper after every source has been reconciled. Scores are attached
/// later, once the whole batch is known (see [`ScoredRecord`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    pub venue: String,
    pub volume: String,
    pub issue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub num_authors: u32,
    pub affiliations: Vec<String>,
    pub authors_with_affiliation: u32,
    pub affiliation_completeness: f64,
    pub funder_present: bool,
    pub citations: u32,
    pub is_retracted: bool,
    pub is_open_access: bool,
    pub citations_per_year: f64,
}

impl CanonicalRecord {
    pub fn doi_or_empty(&self) -> &str {
        self.doi.as_deref().unwrap_or_default()
    }
}

/// A record with its batch-relative integrity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    rim: f64,
    risk_factor: f64,
}

impl ScoredRecord {
    /// Attach a RIM score; the risk factor is derived from it.
    pub fn new(record: CanonicalRecord, rim: f64) -> Self {
        let rim = rim.clamp(0.0, 100.0);
        Self {
            record,
            rim,
            risk_factor: (1.0 - rim / 100.0).clamp(0.0, 1.0),
        }
    }

    pub fn rim(&self) -> f64 {
        self.rim
    }

    pub fn risk_factor(&self) -> f64 {
        self.risk_factor
    }

    pub fn band(&self) -> RimBand {
        RimBand::from_score(self.rim)
    }
}

/// Qualitative label for a RIM score. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RimBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl RimBand {
    pub fn from_score(rim: f64) -> Self {
        if rim >= 80.0 {
            Self::Excellent
        } else if rim >= 60.0 {
            Self::Good
        } else if rim >= 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for RimBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
