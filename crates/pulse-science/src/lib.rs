//! Scholar Pulse science: source clients, per-paper reconciliation, RIM scoring, export.

pub mod enrichment;
pub mod error;
pub mod export;
pub mod http;
pub mod identifiers;
pub mod resolvers;
pub mod scoring;
pub mod sources;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use enrichment::{BatchOutcome, BatchReport, PipelineSettings, RimPipeline};
pub use error::{Result, ScienceError};
pub use export::{ExportRow, save_csv};
pub use identifiers::{Doi, extract_doi};
