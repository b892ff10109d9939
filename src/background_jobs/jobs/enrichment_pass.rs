//! Periodic enrichment pass job.

use crate::background_jobs::{BackgroundJob, HookEvent, JobContext, JobError, JobSchedule};
use crate::enrichment::{EnrichmentEngine, EnrichmentSettings};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs an enrichment pass on startup, whenever a new item lands in the
/// backlog, and on a fixed interval in between.
pub struct EnrichmentPassJob {
    interval: Duration,
    settings: EnrichmentSettings,
}

impl EnrichmentPassJob {
    pub fn new(interval: Duration, settings: EnrichmentSettings) -> Self {
        Self { interval, settings }
    }
}

#[async_trait]
impl BackgroundJob for EnrichmentPassJob {
    fn id(&self) -> &'static str {
        "enrichment_pass"
    }

    fn name(&self) -> &'static str {
        "Enrichment Pass"
    }

    fn description(&self) -> &'static str {
        "Fetches remote metadata and screenshots for items that are new or stale"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Combined {
            interval: Some(self.interval),
            hooks: vec![HookEvent::OnStartup, HookEvent::OnItemAdded],
        }
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let engine = EnrichmentEngine::new(
            Arc::clone(&ctx.catalog_store),
            Arc::clone(&ctx.remote),
            self.settings.clone(),
        );

        let summary = engine
            .run_pass(&ctx.cancellation_token)
            .await
            .map_err(|err| JobError::ExecutionFailed(format!("{err:#}")))?;

        if ctx.cancellation_token.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        info!(
            "Enrichment pass job finished ({} enriched, {} skipped, {} failed)",
            summary.enriched, summary.skipped, summary.failed
        );
        Ok(())
    }
}
