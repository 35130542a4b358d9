use std::sync::Arc;
use std::time::Duration;

use crate::identifiers::Doi;
use crate::resolvers::bounded;
use crate::sources::OpenAccessSource;

pub struct OpennessResolver {
    source: Arc<dyn OpenAccessSource>,
    timeout: Duration,
}

impl OpennessResolver {
    pub fn new(source: Arc<dyn OpenAccessSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Open-access flag for a DOI; `false` without a DOI or on any failure.
    pub async fn resolve(&self, doi: Option<&Doi>) -> bool {
        let Some(doi) = doi else {
            return false;
        };
        bounded(
            self.source.name(),
            "doi",
            self.timeout,
            self.source.is_open_access(doi),
        )
        .await
        .unwrap_or(false)
    }
}
