//! Local catalog storage.
//!
//! SQLite-backed storage for catalog items and their cached screenshots.
//! Owns schema creation, validation and forward-only migration.

use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use crate::platforms::Platform;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// The freshness window: items enriched longer ago than this are re-selected.
pub const FRESHNESS_WINDOW_DAYS: u32 = 7;

/// Trait for local catalog storage operations.
pub trait CatalogStore: Send + Sync {
    // === Item queries ===

    /// Items on a platform, optionally narrowed to a curated vibe,
    /// ordered by descending critic score.
    fn get_items_by_platform(
        &self,
        platform: Platform,
        vibe: Option<CuratedVibe>,
    ) -> Result<Vec<CatalogItem>>;

    fn get_item_by_id(&self, id: &str) -> Result<Option<CatalogItem>>;

    fn get_item_by_slug(&self, slug: &str) -> Result<Option<CatalogItem>>;

    // === Item mutations ===

    /// Upsert keyed by local id. `created_at` is stamped by the database.
    fn insert_or_replace_item(&self, item: &CatalogItem) -> Result<()>;

    fn update_backlog_status(&self, id: &str, status: BacklogStatus) -> Result<()>;

    /// Partial update that only touches the fields set on `fields`,
    /// always also stamping `last_enriched` with the current time.
    fn update_enrichment_fields(&self, id: &str, fields: &EnrichmentFields) -> Result<()>;

    /// Persist a corrected remote identity (resolver outcome). Written
    /// immediately, independent of any subsequent enrichment write.
    fn set_remote_identity(&self, id: &str, slug: &str, rawg_id: i64) -> Result<()>;

    /// Delete an item (explicit user action; screenshots cascade).
    fn delete_item(&self, id: &str) -> Result<()>;

    // === Backlog ===

    /// Items with a backlog status other than `none`, filters applied
    /// conjunctively, ordered by descending creation time.
    fn get_backlog_items(
        &self,
        status: Option<BacklogStatus>,
        platform: Option<Platform>,
    ) -> Result<Vec<CatalogItem>>;

    fn get_backlog_stats(&self) -> Result<BacklogStats>;

    // === Enrichment selection ===

    /// Items with a remote identity whose `last_enriched` is missing or
    /// older than the freshness window, capped at `limit`.
    fn get_items_needing_enrichment(&self, limit: usize) -> Result<Vec<CatalogItem>>;

    // === Screenshots ===

    fn get_screenshots(&self, item_id: &str) -> Result<Vec<Screenshot>>;

    /// Replace an item's screenshot set wholesale. All-or-nothing: on any
    /// failure the previous set is kept.
    fn replace_screenshots(&self, item_id: &str, screenshots: &[Screenshot]) -> Result<()>;

    // === Maintenance ===

    fn count_items(&self) -> Result<u64>;

    fn count_screenshots(&self) -> Result<u64>;

    /// Reset all freshness stamps and drop all cached screenshots, forcing
    /// re-enrichment on the next pass.
    fn clear_enrichment_cache(&self) -> Result<()>;
}

/// SQLite-backed catalog store.
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Open an existing catalog database or create a new one with the
    /// current schema.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                &db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(&db_path)?;
            CATALOG_VERSIONED_SCHEMAS
                .last()
                .context("No schemas defined")?
                .create(&conn)?;
            info!("Created new catalog database at {:?}", db_path.as_ref());
            conn
        };

        // Durability/consistency policy: WAL journaling + enforced foreign keys
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!(
                "Catalog database version {} is too old, does not contain base db version {}",
                db_version,
                BASE_DB_VERSION
            );
        }
        let version = db_version as usize;

        let schema_count = CATALOG_VERSIONED_SCHEMAS.len();
        if version >= schema_count {
            bail!(
                "Catalog database version {} is too new (max supported: {})",
                version,
                schema_count - 1
            );
        }

        CATALOG_VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get schema")?
            .validate(&conn)?;

        Self::migrate_if_needed(&conn, version)?;

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store for testing.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        CATALOG_VERSIONED_SCHEMAS
            .last()
            .context("No schemas defined")?
            .create(&conn)?;
        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run any pending migrations, one incremental step per version.
    fn migrate_if_needed(conn: &Connection, current_version: usize) -> Result<()> {
        let target_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
        if current_version >= target_version {
            return Ok(());
        }

        info!(
            "Migrating catalog database from version {} to {}",
            current_version, target_version
        );

        for schema in CATALOG_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!("Running catalog migration to version {}", schema.version);
                migration_fn(conn)?;
            }
        }

        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + target_version),
            [],
        )?;
        Ok(())
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<CatalogItem> {
        Ok(CatalogItem {
            id: row.get("id")?,
            rawg_id: row.get("rawg_id")?,
            rawg_slug: row.get("rawg_slug")?,
            title: row.get("title")?,
            platform: Platform::from_str(&row.get::<_, String>("platform")?),
            genre: row.get("genre")?,
            curated_vibe: row
                .get::<_, Option<String>>("curated_vibe")?
                .and_then(|s| CuratedVibe::from_str(&s)),
            curated_desc: row.get("curated_desc")?,
            critic_score: row.get("critic_score")?,
            user_rating: row.get("user_rating")?,
            release_date: row.get("release_date")?,
            background_image: row.get("background_image")?,
            developer: row.get("developer")?,
            publisher: row.get("publisher")?,
            description: row.get("description")?,
            playtime: row.get("playtime")?,
            esrb_rating: row.get("esrb_rating")?,
            website: row.get("website")?,
            detail_url: row.get("detail_url")?,
            backlog_status: BacklogStatus::from_str(&row.get::<_, String>("backlog_status")?)
                .unwrap_or(BacklogStatus::None),
            last_enriched: row.get("last_enriched")?,
            created_at: row.get("created_at")?,
        })
    }

    fn row_to_screenshot(row: &rusqlite::Row) -> rusqlite::Result<Screenshot> {
        Ok(Screenshot {
            id: row.get("id")?,
            item_id: row.get("item_id")?,
            image_url: row.get("image_url")?,
            width: row.get("width")?,
            height: row.get("height")?,
        })
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn get_items_by_platform(
        &self,
        platform: Platform,
        vibe: Option<CuratedVibe>,
    ) -> Result<Vec<CatalogItem>> {
        let conn = self.conn.lock().unwrap();
        let items = match vibe {
            Some(vibe) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM items WHERE platform = ?1 AND curated_vibe = ?2
                     ORDER BY critic_score DESC",
                )?;
                let rows = stmt
                    .query_map(params![platform.as_str(), vibe.as_str()], Self::row_to_item)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM items WHERE platform = ?1 ORDER BY critic_score DESC",
                )?;
                let rows = stmt
                    .query_map(params![platform.as_str()], Self::row_to_item)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(items)
    }

    fn get_item_by_id(&self, id: &str) -> Result<Option<CatalogItem>> {
        let conn = self.conn.lock().unwrap();
        let item = conn
            .query_row("SELECT * FROM items WHERE id = ?1", params![id], Self::row_to_item)
            .optional()?;
        Ok(item)
    }

    fn get_item_by_slug(&self, slug: &str) -> Result<Option<CatalogItem>> {
        let conn = self.conn.lock().unwrap();
        let item = conn
            .query_row(
                "SELECT * FROM items WHERE rawg_slug = ?1",
                params![slug],
                Self::row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn insert_or_replace_item(&self, item: &CatalogItem) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT OR REPLACE INTO items (
                id, rawg_id, rawg_slug, title, platform, genre, curated_vibe,
                curated_desc, critic_score, user_rating, release_date,
                background_image, developer, publisher, description, playtime,
                esrb_rating, website, detail_url, backlog_status, last_enriched
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
            )"#,
            params![
                item.id,
                item.rawg_id,
                item.rawg_slug,
                item.title,
                item.platform.as_str(),
                item.genre,
                item.curated_vibe.map(|v| v.as_str()),
                item.curated_desc,
                item.critic_score,
                item.user_rating,
                item.release_date,
                item.background_image,
                item.developer,
                item.publisher,
                item.description,
                item.playtime,
                item.esrb_rating,
                item.website,
                item.detail_url,
                item.backlog_status.as_str(),
                item.last_enriched,
            ],
        )?;
        Ok(())
    }

    fn update_backlog_status(&self, id: &str, status: BacklogStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE items SET backlog_status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            bail!("No item with id {}", id);
        }
        Ok(())
    }

    fn update_enrichment_fields(&self, id: &str, fields: &EnrichmentFields) -> Result<()> {
        let set_columns = fields.set_columns();

        let mut assignments: Vec<String> = set_columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", name, i + 1))
            .collect();
        assignments.push("last_enriched = datetime('now')".to_string());

        let mut values: Vec<Value> = set_columns.into_iter().map(|(_, v)| v).collect();
        values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE items SET {} WHERE id = ?{}",
            assignments.join(", "),
            values.len()
        );

        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(&sql, params_from_iter(values))?;
        if updated == 0 {
            bail!("No item with id {}", id);
        }
        Ok(())
    }

    fn set_remote_identity(&self, id: &str, slug: &str, rawg_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE items SET rawg_slug = ?1, rawg_id = ?2 WHERE id = ?3",
            params![slug, rawg_id, id],
        )?;
        Ok(())
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn get_backlog_items(
        &self,
        status: Option<BacklogStatus>,
        platform: Option<Platform>,
    ) -> Result<Vec<CatalogItem>> {
        let mut sql = "SELECT * FROM items WHERE backlog_status != 'none'".to_string();
        let mut filters: Vec<Value> = Vec::new();

        if let Some(status) = status {
            filters.push(Value::Text(status.as_str().to_string()));
            sql.push_str(&format!(" AND backlog_status = ?{}", filters.len()));
        }
        if let Some(platform) = platform {
            filters.push(Value::Text(platform.as_str().to_string()));
            sql.push_str(&format!(" AND platform = ?{}", filters.len()));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(filters), Self::row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn get_backlog_stats(&self) -> Result<BacklogStats> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT backlog_status, COUNT(*) FROM items
             WHERE backlog_status != 'none' GROUP BY backlog_status",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stats = BacklogStats::default();
        for (status, count) in rows {
            match BacklogStatus::from_str(&status) {
                Some(BacklogStatus::WantToPlay) => stats.want_to_play = count,
                Some(BacklogStatus::Playing) => stats.playing = count,
                Some(BacklogStatus::Completed) => stats.completed = count,
                Some(BacklogStatus::Dropped) => stats.dropped = count,
                _ => continue,
            }
            stats.total += count;
        }
        Ok(stats)
    }

    fn get_items_needing_enrichment(&self, limit: usize) -> Result<Vec<CatalogItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM items
             WHERE (rawg_slug IS NOT NULL OR rawg_id IS NOT NULL)
             AND (last_enriched IS NULL
                  OR datetime(last_enriched, '+{} days') < datetime('now'))
             LIMIT ?1",
            FRESHNESS_WINDOW_DAYS
        ))?;
        let items = stmt
            .query_map(params![limit], Self::row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn get_screenshots(&self, item_id: &str) -> Result<Vec<Screenshot>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM screenshots WHERE item_id = ?1")?;
        let screenshots = stmt
            .query_map(params![item_id], Self::row_to_screenshot)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(screenshots)
    }

    fn replace_screenshots(&self, item_id: &str, screenshots: &[Screenshot]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM screenshots WHERE item_id = ?1", params![item_id])?;
        for screenshot in screenshots {
            tx.execute(
                "INSERT INTO screenshots (id, item_id, image_url, width, height)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    screenshot.id,
                    item_id,
                    screenshot.image_url,
                    screenshot.width,
                    screenshot.height,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn count_items(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_screenshots(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM screenshots", [], |row| row.get(0))?;
        Ok(count)
    }

    fn clear_enrichment_cache(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("UPDATE items SET last_enriched = NULL", [])?;
        tx.execute("DELETE FROM screenshots", [])?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(id: &str, title: &str, platform: Platform) -> CatalogItem {
        CatalogItem::new(id.to_string(), title.to_string(), platform)
    }

    fn screenshot(id: &str, item_id: &str) -> Screenshot {
        Screenshot {
            id: id.to_string(),
            item_id: item_id.to_string(),
            image_url: format!("https://media.example/{}.jpg", id),
            width: Some(1920),
            height: Some(1080),
        }
    }

    #[test]
    fn test_open_creates_and_reopens_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        {
            let store = SqliteCatalogStore::new(&db_path).unwrap();
            store
                .insert_or_replace_item(&item("i1", "Celeste", Platform::Unknown))
                .unwrap();
        }

        // Reopen: schema is current, migration is a no-op, data survives
        let store = SqliteCatalogStore::new(&db_path).unwrap();
        assert!(store.get_item_by_id("i1").unwrap().is_some());
    }

    #[test]
    fn test_open_rejects_foreign_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("other.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute("CREATE TABLE unrelated (id INTEGER)", []).unwrap();
        drop(conn);

        assert!(SqliteCatalogStore::new(&db_path).is_err());
    }

    #[test]
    fn test_insert_and_point_lookups() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let mut celeste = item("i1", "Celeste", Platform::Unknown);
        celeste.rawg_slug = Some("celeste".to_string());
        store.insert_or_replace_item(&celeste).unwrap();

        let by_id = store.get_item_by_id("i1").unwrap().unwrap();
        assert_eq!(by_id.title, "Celeste");
        assert!(!by_id.created_at.is_empty());

        let by_slug = store.get_item_by_slug("celeste").unwrap().unwrap();
        assert_eq!(by_slug.id, "i1");

        assert!(store.get_item_by_id("missing").unwrap().is_none());
        assert!(store.get_item_by_slug("missing").unwrap().is_none());
    }

    #[test]
    fn test_insert_or_replace_is_an_upsert() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_or_replace_item(&item("i1", "Celeste", Platform::Unknown))
            .unwrap();

        let mut renamed = item("i1", "Celeste (Updated)", Platform::Unknown);
        renamed.rawg_id = Some(52);
        store.insert_or_replace_item(&renamed).unwrap();

        assert_eq!(store.count_items().unwrap(), 1);
        let stored = store.get_item_by_id("i1").unwrap().unwrap();
        assert_eq!(stored.title, "Celeste (Updated)");
        assert_eq!(stored.rawg_id, Some(52));
    }

    #[test]
    fn test_get_items_by_platform_orders_by_critic_score() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let mut low = item("low", "Bubsy 3D", Platform::Ps1);
        low.critic_score = Some(30);
        let mut high = item("high", "Metal Gear Solid", Platform::Ps1);
        high.critic_score = Some(94);
        let other = item("other", "Chrono Trigger", Platform::Snes);
        store.insert_or_replace_item(&low).unwrap();
        store.insert_or_replace_item(&high).unwrap();
        store.insert_or_replace_item(&other).unwrap();

        let ps1 = store.get_items_by_platform(Platform::Ps1, None).unwrap();
        let ids: Vec<&str> = ps1.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low"]);
    }

    #[test]
    fn test_get_items_by_platform_vibe_filter() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let mut essential = item("e", "Ico", Platform::Ps2);
        essential.curated_vibe = Some(CuratedVibe::Essential);
        let gem = item("g", "Haunting Ground", Platform::Ps2);
        store.insert_or_replace_item(&essential).unwrap();
        store.insert_or_replace_item(&gem).unwrap();

        let items = store
            .get_items_by_platform(Platform::Ps2, Some(CuratedVibe::Essential))
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "e");
    }

    #[test]
    fn test_update_backlog_status() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_or_replace_item(&item("i1", "Celeste", Platform::Unknown))
            .unwrap();

        store
            .update_backlog_status("i1", BacklogStatus::Playing)
            .unwrap();
        let stored = store.get_item_by_id("i1").unwrap().unwrap();
        assert_eq!(stored.backlog_status, BacklogStatus::Playing);

        assert!(store
            .update_backlog_status("missing", BacklogStatus::Playing)
            .is_err());
    }

    #[test]
    fn test_partial_enrichment_update_leaves_other_fields_untouched() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let mut celeste = item("i1", "Celeste", Platform::Unknown);
        celeste.developer = Some("Matt Makes Games".to_string());
        store.insert_or_replace_item(&celeste).unwrap();

        store
            .update_enrichment_fields(
                "i1",
                &EnrichmentFields {
                    critic_score: Some(92),
                    ..Default::default()
                },
            )
            .unwrap();

        let stored = store.get_item_by_id("i1").unwrap().unwrap();
        assert_eq!(stored.critic_score, Some(92));
        assert_eq!(stored.developer.as_deref(), Some("Matt Makes Games"));
        assert!(stored.last_enriched.is_some(), "freshness stamp expected");
    }

    #[test]
    fn test_enrichment_update_with_no_fields_still_stamps_freshness() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_or_replace_item(&item("i1", "Celeste", Platform::Unknown))
            .unwrap();

        store
            .update_enrichment_fields("i1", &EnrichmentFields::default())
            .unwrap();

        let stored = store.get_item_by_id("i1").unwrap().unwrap();
        assert!(stored.last_enriched.is_some());
    }

    #[test]
    fn test_set_remote_identity() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_or_replace_item(&item("i1", "GTA Vice City", Platform::Ps2))
            .unwrap();

        store
            .set_remote_identity("i1", "grand-theft-auto-vice-city", 432)
            .unwrap();

        let stored = store.get_item_by_id("i1").unwrap().unwrap();
        assert_eq!(
            stored.rawg_slug.as_deref(),
            Some("grand-theft-auto-vice-city")
        );
        assert_eq!(stored.rawg_id, Some(432));
    }

    #[test]
    fn test_backlog_items_filters_conjunctively() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let mut a = item("a", "Ico", Platform::Ps2);
        a.backlog_status = BacklogStatus::Playing;
        let mut b = item("b", "Chrono Trigger", Platform::Snes);
        b.backlog_status = BacklogStatus::Playing;
        let mut c = item("c", "Okami", Platform::Ps2);
        c.backlog_status = BacklogStatus::Completed;
        let d = item("d", "Not in backlog", Platform::Ps2);
        for i in [&a, &b, &c, &d] {
            store.insert_or_replace_item(i).unwrap();
        }

        let all = store.get_backlog_items(None, None).unwrap();
        assert_eq!(all.len(), 3);

        let playing = store
            .get_backlog_items(Some(BacklogStatus::Playing), None)
            .unwrap();
        assert_eq!(playing.len(), 2);

        let playing_ps2 = store
            .get_backlog_items(Some(BacklogStatus::Playing), Some(Platform::Ps2))
            .unwrap();
        assert_eq!(playing_ps2.len(), 1);
        assert_eq!(playing_ps2[0].id, "a");
    }

    #[test]
    fn test_backlog_stats_empty_is_all_zero() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        assert_eq!(store.get_backlog_stats().unwrap(), BacklogStats::default());
    }

    #[test]
    fn test_backlog_stats_total_is_sum_of_counts() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let statuses = [
            BacklogStatus::WantToPlay,
            BacklogStatus::WantToPlay,
            BacklogStatus::Playing,
            BacklogStatus::Completed,
            BacklogStatus::None,
        ];
        for (i, status) in statuses.iter().enumerate() {
            let mut it = item(&format!("i{}", i), "Game", Platform::Nes);
            it.backlog_status = *status;
            store.insert_or_replace_item(&it).unwrap();
        }

        let stats = store.get_backlog_stats().unwrap();
        assert_eq!(stats.want_to_play, 2);
        assert_eq!(stats.playing, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.dropped, 0);
        assert_eq!(
            stats.total,
            stats.want_to_play + stats.playing + stats.completed + stats.dropped
        );
    }

    #[test]
    fn test_needing_enrichment_selection_and_cap() {
        let store = SqliteCatalogStore::in_memory().unwrap();

        // Never enriched, has slug: selected
        let mut never = item("never", "Celeste", Platform::Unknown);
        never.rawg_slug = Some("celeste".to_string());
        store.insert_or_replace_item(&never).unwrap();

        // Stale, has numeric id only: selected
        let mut stale = item("stale", "Ico", Platform::Ps2);
        stale.rawg_id = Some(1001);
        stale.last_enriched = Some("2020-01-01 00:00:00".to_string());
        store.insert_or_replace_item(&stale).unwrap();

        // No remote identity: never selected
        let anonymous = item("anon", "Homebrew Thing", Platform::Gba);
        store.insert_or_replace_item(&anonymous).unwrap();

        let due = store.get_items_needing_enrichment(10).unwrap();
        let ids: Vec<&str> = due.iter().map(|i| i.id.as_str()).collect();
        assert!(ids.contains(&"never"));
        assert!(ids.contains(&"stale"));
        assert!(!ids.contains(&"anon"));

        let capped = store.get_items_needing_enrichment(1).unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn test_freshly_enriched_items_are_not_selected() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let mut fresh = item("fresh", "Celeste", Platform::Unknown);
        fresh.rawg_slug = Some("celeste".to_string());
        store.insert_or_replace_item(&fresh).unwrap();
        store
            .update_enrichment_fields("fresh", &EnrichmentFields::default())
            .unwrap();

        assert!(store.get_items_needing_enrichment(10).unwrap().is_empty());
    }

    #[test]
    fn test_replace_screenshots_swaps_the_full_set() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_or_replace_item(&item("i1", "Celeste", Platform::Unknown))
            .unwrap();

        store
            .replace_screenshots(
                "i1",
                &[screenshot("s1", "i1"), screenshot("s2", "i1"), screenshot("s3", "i1")],
            )
            .unwrap();
        assert_eq!(store.get_screenshots("i1").unwrap().len(), 3);

        store
            .replace_screenshots("i1", &[screenshot("s4", "i1"), screenshot("s5", "i1")])
            .unwrap();

        let after = store.get_screenshots("i1").unwrap();
        assert_eq!(after.len(), 2);
        let ids: Vec<&str> = after.iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&"s4") && ids.contains(&"s5"));
        assert!(!ids.contains(&"s1"));
    }

    // The replace is wrapped in a transaction, strengthening the observed
    // delete-then-insert behavior of the reference: readers can never see an
    // empty set mid-replace, and a failed replace keeps the previous set.
    #[test]
    fn test_replace_screenshots_is_all_or_nothing() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_or_replace_item(&item("i1", "Celeste", Platform::Unknown))
            .unwrap();
        store
            .replace_screenshots("i1", &[screenshot("s1", "i1")])
            .unwrap();

        // Duplicate primary key in the new set fails the insert; the old
        // set must survive the rolled-back replace.
        let result = store.replace_screenshots(
            "i1",
            &[screenshot("dup", "i1"), screenshot("dup", "i1")],
        );
        assert!(result.is_err());

        let kept = store.get_screenshots("i1").unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "s1");
    }

    #[test]
    fn test_delete_item_cascades_to_screenshots() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_or_replace_item(&item("i1", "Celeste", Platform::Unknown))
            .unwrap();
        store
            .replace_screenshots("i1", &[screenshot("s1", "i1")])
            .unwrap();

        store.delete_item("i1").unwrap();
        assert_eq!(store.count_items().unwrap(), 0);
        assert_eq!(store.count_screenshots().unwrap(), 0);
    }

    #[test]
    fn test_clear_enrichment_cache() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let mut celeste = item("i1", "Celeste", Platform::Unknown);
        celeste.rawg_slug = Some("celeste".to_string());
        store.insert_or_replace_item(&celeste).unwrap();
        store
            .update_enrichment_fields("i1", &EnrichmentFields::default())
            .unwrap();
        store
            .replace_screenshots("i1", &[screenshot("s1", "i1")])
            .unwrap();

        store.clear_enrichment_cache().unwrap();

        let stored = store.get_item_by_id("i1").unwrap().unwrap();
        assert!(stored.last_enriched.is_none());
        assert_eq!(store.count_screenshots().unwrap(), 0);
        // Item is due again
        assert_eq!(store.get_items_needing_enrichment(10).unwrap().len(), 1);
    }
}
