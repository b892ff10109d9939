//! Background enrichment of catalog items.
//!
//! A pass selects the items due for (re-)enrichment, fetches full detail and
//! screenshots from the remote catalog for each one sequentially, and writes
//! the merged fields back. Item failures are isolated; only an auth failure
//! aborts the pass, since every further request would fail the same way.

use super::resolver::IdentityResolver;
use crate::catalog_store::{CatalogItem, CatalogStore, EnrichmentFields, Screenshot};
use crate::rawg::{RemoteCatalog, RemoteError, RemoteGame};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    /// Max items per pass.
    pub batch_size: usize,
    /// Pause between items, to stay polite with the remote API.
    pub item_delay: Duration,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            item_delay: Duration::from_millis(500),
        }
    }
}

/// Counts for a completed (or aborted) pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub enriched: u32,
    pub skipped: u32,
    pub failed: u32,
}

enum ItemOutcome {
    Enriched,
    Skipped,
}

pub struct EnrichmentEngine {
    store: Arc<dyn CatalogStore>,
    remote: Arc<dyn RemoteCatalog>,
    settings: EnrichmentSettings,
}

impl EnrichmentEngine {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        remote: Arc<dyn RemoteCatalog>,
        settings: EnrichmentSettings,
    ) -> Self {
        Self {
            store,
            remote,
            settings,
        }
    }

    /// Run one enrichment pass. Returns early when `cancel` fires or the
    /// remote rejects our credentials.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<PassSummary> {
        let items = self
            .store
            .get_items_needing_enrichment(self.settings.batch_size)?;
        let mut summary = PassSummary::default();
        if items.is_empty() {
            return Ok(summary);
        }
        info!("Enrichment pass starting, {} item(s) due", items.len());

        let last_index = items.len() - 1;
        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Enrichment pass cancelled");
                break;
            }

            match self.enrich_item(item).await {
                Ok(ItemOutcome::Enriched) => summary.enriched += 1,
                Ok(ItemOutcome::Skipped) => summary.skipped += 1,
                Err(err) => {
                    if matches!(
                        err.downcast_ref::<RemoteError>(),
                        Some(RemoteError::Unauthorized)
                    ) {
                        warn!("Remote catalog rejected credentials, aborting pass");
                        summary.failed += 1;
                        break;
                    }
                    warn!("Failed to enrich '{}': {err:#}", item.title);
                    summary.failed += 1;
                }
            }

            if index < last_index {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.settings.item_delay) => {}
                }
            }
        }

        info!(
            "Enrichment pass done: {} enriched, {} skipped, {} failed",
            summary.enriched, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    async fn enrich_item(&self, item: &CatalogItem) -> Result<ItemOutcome> {
        let lookup_key = match (&item.rawg_slug, item.rawg_id) {
            (Some(slug), _) => slug.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => return Ok(ItemOutcome::Skipped),
        };

        let detail = match self.remote.get_game_detail(&lookup_key).await {
            Ok(detail) => detail,
            Err(RemoteError::NotFound) => {
                // Stale identity: fall back to a title search and repair
                // the stored slug/id so future lookups hit directly.
                debug!("'{}' not found by '{}', re-resolving", item.title, lookup_key);
                let resolver = IdentityResolver::new(self.remote.as_ref());
                match resolver.find_match(&item.title, item.platform).await? {
                    Some(matched) => {
                        self.store
                            .set_remote_identity(&item.id, &matched.slug, matched.id)?;
                        matched
                    }
                    None => {
                        warn!("No confident match found for '{}'", item.title);
                        return Ok(ItemOutcome::Skipped);
                    }
                }
            }
            Err(err) => return Err(err.into()),
        };

        self.store
            .update_enrichment_fields(&item.id, &fields_from_detail(&detail))?;

        let remote_screenshots = self.remote.get_game_screenshots(detail.id).await?;
        let screenshots: Vec<Screenshot> = remote_screenshots
            .into_iter()
            .map(|s| Screenshot {
                id: s.id.to_string(),
                item_id: item.id.clone(),
                image_url: s.image,
                width: s.width,
                height: s.height,
            })
            .collect();
        self.store.replace_screenshots(&item.id, &screenshots)?;

        debug!("Enriched '{}'", item.title);
        Ok(ItemOutcome::Enriched)
    }
}

fn fields_from_detail(detail: &RemoteGame) -> EnrichmentFields {
    let first_name = |entries: &Option<Vec<crate::rawg::NamedEntry>>| {
        entries
            .as_ref()
            .and_then(|e| e.first())
            .map(|e| e.name.clone())
    };
    let genre = detail
        .genres
        .as_ref()
        .map(|genres| {
            genres
                .iter()
                .map(|g| g.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty());

    EnrichmentFields {
        critic_score: detail.metacritic,
        user_rating: detail.rating,
        release_date: detail.released.clone(),
        background_image: detail.background_image.clone(),
        developer: first_name(&detail.developers),
        publisher: first_name(&detail.publishers),
        description: detail.description_raw.clone(),
        playtime: detail.playtime,
        esrb_rating: detail.esrb_rating.as_ref().map(|e| e.name.clone()),
        website: detail.website.clone(),
        detail_url: detail.metacritic_url.clone(),
        rawg_id: Some(detail.id),
        genre,
    }
}
