use std::io::Write;
use std::path::Path;

use pulse_core::ScoredRecord;
use serde::Serialize;
use tracing::info;

use crate::error::{Result, ScienceError};
use crate::scoring::round_to;

/// One spreadsheet row per scored paper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Scholar Name")]
    pub scholar_name: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Journal/Conference")]
    pub venue: String,
    #[serde(rename = "Volume")]
    pub volume: String,
    #[serde(rename = "Issue")]
    pub issue: String,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Num_Authors")]
    pub num_authors: u32,
    #[serde(rename = "Affiliations")]
    pub affiliations: String,
    #[serde(rename = "DOI")]
    pub doi: String,
    #[serde(rename = "Citations")]
    pub citations: u32,
    #[serde(rename = "CPY")]
    pub cpy: f64,
    #[serde(rename = "is_OA")]
    pub is_open_access: bool,
    #[serde(rename = "Funder_present")]
    pub funder_present: bool,
    #[serde(rename = "Author_affil_completeness")]
    pub affiliation_completeness: f64,
    #[serde(rename = "Is_Retracted")]
    pub is_retracted: bool,
    #[serde(rename = "RIM")]
    pub rim: f64,
    #[serde(rename = "Risk_Factor")]
    pub risk_factor: f64,
}

impl ExportRow {
    pub fn from_scored(scholar_name: &str, scored: &ScoredRecord) -> Self {
        let r = &scored.record;
        let affiliations = if r.affiliations.is_empty() {
            "N/A".to_string()
        } else {
            r.affiliations.join("; ")
        };

        Self {
            scholar_name: scholar_name.to_string(),
            title: r.title.clone(),
            venue: r.venue.clone(),
            volume: r.volume.clone(),
            issue: r.issue.clone(),
            year: r.year,
            num_authors: r.num_authors,
            affiliations,
            doi: r.doi_or_empty().to_string(),
            citations: r.citations,
            cpy: round_to(r.citations_per_year, 3),
            is_open_access: r.is_open_access,
            funder_present: r.funder_present,
            affiliation_completeness: round_to(r.affiliation_completeness, 3),
            is_retracted: r.is_retracted,
            rim: scored.rim(),
            risk_factor: scored.risk_factor(),
        }
    }
}

pub fn rows(scholar_name: &str, records: &[ScoredRecord]) -> Vec<ExportRow> {
    records
        .iter()
        .map(|r| ExportRow::from_scored(scholar_name, r))
        .collect()
}

pub fn write_csv<W: Write>(writer: W, rows: &[ExportRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()
        .map_err(|e| ScienceError::Export(format!("failed to flush CSV: {e}")))?;
    Ok(())
}

/// Write `rows` to `path`, creating parent directories.
pub fn save_csv(path: &Path, rows: &[ExportRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ScienceError::Export(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    let file = std::fs::File::create(path)
        .map_err(|e| ScienceError::Export(format!("cannot create {}: {e}", path.display())))?;
    write_csv(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "saved CSV export");
    Ok(())
}
