//! Per-paper lookups that never fail: every source error, timeout or empty
//! answer is folded into the documented "no data" value and logged.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{Result, ScienceError};

pub mod citations;
pub mod metadata;
pub mod openness;

pub use citations::{CitationAttempt, CitationOutcome, CitationResolver, LookupStrategy};
pub use metadata::{MetadataResolver, RegistryMetadata};
pub use openness::OpennessResolver;

/// Run one source call under `limit`. Errors and expiry become `None`.
pub(crate) async fn bounded<T, F>(source: &str, step: &str, limit: Duration, fut: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    let outcome = match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ScienceError::Timeout(
            format!("{source} {step}"),
            limit.as_secs(),
        )),
    };

    match outcome {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(source, step, error = %err, "lookup degraded to empty result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_passes_through() {
        let v = bounded("src", "step", Duration::from_secs(1), async { Ok(7u32) }).await;
        assert_eq!(v, Some(7));
    }

    #[tokio::test]
    async fn error_becomes_none() {
        let v: Option<u32> = bounded("src", "step", Duration::from_secs(1), async {
            Err(ScienceError::Parse("bad".to_string()))
        })
        .await;
        assert!(v.is_none());
    }

    #[tokio::test]
    async fn expiry_becomes_none() {
        let v: Option<u32> = bounded("src", "step", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .await;
        assert!(v.is_none());
    }
}
