//! Read-through queries over the local catalog with remote fallback.
//!
//! Reads prefer the local store; only on a local miss is a single remote
//! detail fetch made. Every view is tagged with where its data came from so
//! callers can show freshness hints.

use crate::background_jobs::HookEvent;
use crate::catalog_store::{BacklogStatus, CatalogItem, CatalogStore};
use crate::platforms::Platform;
use crate::rawg::{RemoteCatalog, RemoteError, RemoteGame};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Where an `ItemView`'s data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSource {
    Local,
    Remote,
}

/// A display-ready item, merged from whatever sources were available.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub source: ViewSource,
    /// Local id, present only when the item exists in the store.
    pub id: Option<String>,
    pub rawg_id: Option<i64>,
    pub rawg_slug: Option<String>,
    pub title: String,
    pub platform: Platform,
    pub genre: Option<String>,
    pub critic_score: Option<i64>,
    pub user_rating: Option<f64>,
    pub release_date: Option<String>,
    pub background_image: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub playtime: Option<i64>,
    pub esrb_rating: Option<String>,
    pub website: Option<String>,
    pub detail_url: Option<String>,
    pub backlog_status: BacklogStatus,
}

impl ItemView {
    /// Build a view from a local item, a remote game, or both. Local values
    /// win whenever they are set; the remote only fills gaps. All field
    /// derivation lives here.
    pub fn merge(local: Option<&CatalogItem>, remote: Option<&RemoteGame>) -> Option<Self> {
        if local.is_none() && remote.is_none() {
            return None;
        }

        let source = if local.is_some() {
            ViewSource::Local
        } else {
            ViewSource::Remote
        };

        let first_name = |entries: &Option<Vec<crate::rawg::NamedEntry>>| {
            entries
                .as_ref()
                .and_then(|e| e.first())
                .map(|e| e.name.clone())
        };
        let remote_genre = remote.and_then(|r| {
            r.genres.as_ref().map(|genres| {
                genres
                    .iter()
                    .map(|g| g.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
        });

        let prefer = |local_value: Option<String>, remote_value: Option<String>| {
            local_value.or(remote_value)
        };

        Some(Self {
            source,
            id: local.map(|l| l.id.clone()),
            rawg_id: local.and_then(|l| l.rawg_id).or(remote.map(|r| r.id)),
            rawg_slug: prefer(
                local.and_then(|l| l.rawg_slug.clone()),
                remote.map(|r| r.slug.clone()),
            ),
            title: local
                .map(|l| l.title.clone())
                .or_else(|| remote.map(|r| r.name.clone()))
                .unwrap_or_default(),
            platform: local
                .map(|l| l.platform)
                .or_else(|| remote.map(platform_of))
                .unwrap_or(Platform::Unknown),
            genre: prefer(local.and_then(|l| l.genre.clone()), remote_genre),
            critic_score: local
                .and_then(|l| l.critic_score)
                .or(remote.and_then(|r| r.metacritic)),
            user_rating: local
                .and_then(|l| l.user_rating)
                .or(remote.and_then(|r| r.rating)),
            release_date: prefer(
                local.and_then(|l| l.release_date.clone()),
                remote.and_then(|r| r.released.clone()),
            ),
            background_image: prefer(
                local.and_then(|l| l.background_image.clone()),
                remote.and_then(|r| r.background_image.clone()),
            ),
            developer: prefer(
                local.and_then(|l| l.developer.clone()),
                remote.and_then(|r| first_name(&r.developers)),
            ),
            publisher: prefer(
                local.and_then(|l| l.publisher.clone()),
                remote.and_then(|r| first_name(&r.publishers)),
            ),
            description: prefer(
                local.and_then(|l| l.description.clone()),
                remote.and_then(|r| r.description_raw.clone()),
            ),
            playtime: local
                .and_then(|l| l.playtime)
                .or(remote.and_then(|r| r.playtime)),
            esrb_rating: prefer(
                local.and_then(|l| l.esrb_rating.clone()),
                remote.and_then(|r| r.esrb_rating.as_ref().map(|e| e.name.clone())),
            ),
            website: prefer(
                local.and_then(|l| l.website.clone()),
                remote.and_then(|r| r.website.clone()),
            ),
            detail_url: prefer(
                local.and_then(|l| l.detail_url.clone()),
                remote.and_then(|r| r.metacritic_url.clone()),
            ),
            backlog_status: local
                .map(|l| l.backlog_status)
                .unwrap_or(BacklogStatus::None),
        })
    }
}

/// First platform in the remote list we recognize, else `Unknown`.
fn platform_of(game: &RemoteGame) -> Platform {
    game.platforms
        .as_ref()
        .and_then(|wrappers| {
            wrappers
                .iter()
                .find_map(|w| Platform::from_rawg_id(w.platform.id as u32))
        })
        .unwrap_or(Platform::Unknown)
}

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    remote: Arc<dyn RemoteCatalog>,
    hook_sender: mpsc::Sender<HookEvent>,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        remote: Arc<dyn RemoteCatalog>,
        hook_sender: mpsc::Sender<HookEvent>,
    ) -> Self {
        Self {
            store,
            remote,
            hook_sender,
        }
    }

    /// Resolve `identity` (a slug or a local id) to a view. Local data is
    /// served without touching the network; a miss costs exactly one remote
    /// fetch. Remote 404 means the item does not exist anywhere.
    pub async fn get_item_view(&self, identity: &str) -> Result<Option<ItemView>> {
        let local = match self.store.get_item_by_slug(identity)? {
            Some(item) => Some(item),
            None => self.store.get_item_by_id(identity)?,
        };
        if let Some(local) = local {
            debug!("Serving '{}' from local store", identity);
            return Ok(ItemView::merge(Some(&local), None));
        }

        match self.remote.get_game_detail(identity).await {
            Ok(remote) => Ok(ItemView::merge(None, Some(&remote))),
            Err(RemoteError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Add a remote game to the backlog. If the game is already stored only
    /// its status changes; otherwise a new item is inserted and background
    /// enrichment is kicked off to fill in the rest.
    pub fn add_to_backlog(
        &self,
        game: &RemoteGame,
        status: BacklogStatus,
    ) -> Result<CatalogItem> {
        if let Some(existing) = self.store.get_item_by_slug(&game.slug)? {
            self.store.update_backlog_status(&existing.id, status)?;
            return Ok(CatalogItem {
                backlog_status: status,
                ..existing
            });
        }

        let mut item = CatalogItem::new(
            uuid::Uuid::new_v4().to_string(),
            game.name.clone(),
            platform_of(game),
        );
        item.rawg_id = Some(game.id);
        item.rawg_slug = Some(game.slug.clone());
        item.critic_score = game.metacritic;
        item.user_rating = game.rating;
        item.release_date = game.released.clone();
        item.background_image = game.background_image.clone();
        item.playtime = game.playtime;
        item.backlog_status = status;
        self.store.insert_or_replace_item(&item)?;

        // Fire and forget: enrichment runs in the background
        if let Err(err) = self.hook_sender.try_send(HookEvent::OnItemAdded) {
            warn!("Failed to signal background enrichment: {}", err);
        }

        self.store
            .get_item_by_id(&item.id)
            .map(|stored| stored.unwrap_or(item))
    }

    pub fn set_backlog_status(&self, id: &str, status: BacklogStatus) -> Result<()> {
        self.store.update_backlog_status(id, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::SqliteCatalogStore;
    use crate::rawg::{
        Paginated, PlatformWrapper, RemotePlatform, RemoteScreenshot, SearchOptions,
        TopGamesOptions,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockRemote {
        details: HashMap<String, RemoteGame>,
        detail_calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteCatalog for MockRemote {
        async fn search_games(
            &self,
            _: &str,
            _: &SearchOptions,
        ) -> Result<Paginated<RemoteGame>, RemoteError> {
            unimplemented!()
        }
        async fn get_top_games(
            &self,
            _: i64,
            _: &TopGamesOptions,
        ) -> Result<Paginated<RemoteGame>, RemoteError> {
            unimplemented!()
        }
        async fn get_game_detail(&self, id_or_slug: &str) -> Result<RemoteGame, RemoteError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            self.details
                .get(id_or_slug)
                .cloned()
                .ok_or(RemoteError::NotFound)
        }
        async fn get_game_screenshots(
            &self,
            _: i64,
        ) -> Result<Vec<RemoteScreenshot>, RemoteError> {
            unimplemented!()
        }
        async fn get_platforms(&self) -> Result<Vec<RemotePlatform>, RemoteError> {
            unimplemented!()
        }
    }

    fn game(id: i64, slug: &str, name: &str) -> RemoteGame {
        RemoteGame {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
            released: None,
            background_image: None,
            metacritic: None,
            rating: None,
            playtime: None,
            description_raw: None,
            developers: None,
            publishers: None,
            genres: None,
            platforms: None,
            esrb_rating: None,
            website: None,
            metacritic_url: None,
        }
    }

    fn service(
        store: Arc<SqliteCatalogStore>,
        remote: Arc<MockRemote>,
    ) -> (CatalogService, mpsc::Receiver<HookEvent>) {
        let (hook_sender, hook_receiver) = mpsc::channel(8);
        (
            CatalogService::new(store, remote, hook_sender),
            hook_receiver,
        )
    }

    #[tokio::test]
    async fn test_local_hit_makes_no_remote_calls() {
        let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let mut item =
            CatalogItem::new("i1".to_string(), "Celeste".to_string(), Platform::Unknown);
        item.rawg_slug = Some("celeste".to_string());
        item.critic_score = Some(92);
        store.insert_or_replace_item(&item).unwrap();
        let remote = Arc::new(MockRemote::default());
        let (service, _hooks) = service(store, remote.clone());

        let view = service.get_item_view("celeste").await.unwrap().unwrap();
        assert_eq!(view.source, ViewSource::Local);
        assert_eq!(view.id.as_deref(), Some("i1"));
        assert_eq!(view.critic_score, Some(92));
        assert_eq!(remote.detail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_miss_costs_exactly_one_remote_fetch() {
        let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let mut remote = MockRemote::default();
        let mut celeste = game(52, "celeste", "Celeste");
        celeste.metacritic = Some(92);
        remote.details.insert("celeste".to_string(), celeste);
        let remote = Arc::new(remote);
        let (service, _hooks) = service(store, remote.clone());

        let view = service.get_item_view("celeste").await.unwrap().unwrap();
        assert_eq!(view.source, ViewSource::Remote);
        assert!(view.id.is_none());
        assert_eq!(view.critic_score, Some(92));
        assert_eq!(remote.detail_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_everywhere_is_absence_not_error() {
        let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let remote = Arc::new(MockRemote::default());
        let (service, _hooks) = service(store, remote);

        let view = service.get_item_view("nowhere-to-be-found").await.unwrap();
        assert!(view.is_none());
    }

    #[tokio::test]
    async fn test_add_to_backlog_inserts_and_fires_hook() {
        let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let remote = Arc::new(MockRemote::default());
        let (service, mut hooks) = service(store.clone(), remote);

        let mut vice_city = game(432, "grand-theft-auto-vice-city", "Grand Theft Auto: Vice City");
        vice_city.platforms = Some(vec![PlatformWrapper {
            platform: RemotePlatform {
                id: 15,
                name: "PlayStation 2".to_string(),
                slug: Some("playstation2".to_string()),
            },
        }]);

        let item = service
            .add_to_backlog(&vice_city, BacklogStatus::WantToPlay)
            .unwrap();

        assert_eq!(item.platform, Platform::Ps2);
        assert_eq!(item.backlog_status, BacklogStatus::WantToPlay);
        assert_eq!(hooks.try_recv().unwrap(), HookEvent::OnItemAdded);

        // Never enriched yet, so the background pass will pick it up
        assert_eq!(store.get_items_needing_enrichment(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_to_backlog_twice_only_updates_status() {
        let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let remote = Arc::new(MockRemote::default());
        let (service, mut hooks) = service(store.clone(), remote);
        let celeste = game(52, "celeste", "Celeste");

        let first = service
            .add_to_backlog(&celeste, BacklogStatus::WantToPlay)
            .unwrap();
        let _ = hooks.try_recv();
        let second = service
            .add_to_backlog(&celeste, BacklogStatus::Playing)
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.backlog_status, BacklogStatus::Playing);
        assert_eq!(store.count_items().unwrap(), 1);
        // No new item, no new enrichment trigger
        assert!(hooks.try_recv().is_err());
    }

    #[test]
    fn test_merge_prefers_local_fields_over_remote() {
        let mut local =
            CatalogItem::new("i1".to_string(), "Celeste".to_string(), Platform::Unknown);
        local.developer = Some("Matt Makes Games".to_string());
        let mut remote = game(52, "celeste", "Celeste: Remote Name");
        remote.developers = Some(vec![crate::rawg::NamedEntry {
            name: "Someone Else".to_string(),
        }]);
        remote.description_raw = Some("A platformer.".to_string());

        let view = ItemView::merge(Some(&local), Some(&remote)).unwrap();
        assert_eq!(view.title, "Celeste");
        assert_eq!(view.developer.as_deref(), Some("Matt Makes Games"));
        // Remote fills what the local item lacks
        assert_eq!(view.description.as_deref(), Some("A platformer."));
        assert_eq!(view.rawg_id, Some(52));
    }
}
