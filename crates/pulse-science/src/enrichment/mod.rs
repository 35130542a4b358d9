pub mod merge;
pub mod pipeline;

pub use merge::{PaperViews, first_match, merge_record};
pub use pipeline::{BatchOutcome, BatchReport, PipelineSettings, RimPipeline};
