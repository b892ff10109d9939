//! Data models for the local catalog.

use crate::platforms::Platform;
use serde::{Deserialize, Serialize};

/// Where an item sits in the user's backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacklogStatus {
    None,
    WantToPlay,
    Playing,
    Completed,
    Dropped,
}

impl BacklogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BacklogStatus::None => "none",
            BacklogStatus::WantToPlay => "want_to_play",
            BacklogStatus::Playing => "playing",
            BacklogStatus::Completed => "completed",
            BacklogStatus::Dropped => "dropped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(BacklogStatus::None),
            "want_to_play" => Some(BacklogStatus::WantToPlay),
            "playing" => Some(BacklogStatus::Playing),
            "completed" => Some(BacklogStatus::Completed),
            "dropped" => Some(BacklogStatus::Dropped),
            _ => None,
        }
    }
}

/// Curated editorial tag carried by seed-imported items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuratedVibe {
    Essential,
    HiddenGem,
}

impl CuratedVibe {
    pub fn as_str(&self) -> &'static str {
        match self {
            CuratedVibe::Essential => "essential",
            CuratedVibe::HiddenGem => "hidden_gem",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "essential" => Some(CuratedVibe::Essential),
            "hidden_gem" => Some(CuratedVibe::HiddenGem),
            _ => None,
        }
    }
}

/// A locally persisted catalog item, the system's core entity.
///
/// Created on explicit user action (adding to the backlog) or by seed import,
/// then progressively enriched with remote metadata. Never deleted by the
/// enrichment engine, only by explicit user action.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItem {
    /// Locally generated opaque id, stable for the life of the record.
    pub id: String,
    /// Remote provider's numeric id, if known.
    pub rawg_id: Option<i64>,
    /// Remote provider's slug, if known. Either slug or id suffices as a
    /// remote lookup key.
    pub rawg_slug: Option<String>,
    pub title: String,
    pub platform: Platform,
    /// Comma-joined genre names for display.
    pub genre: Option<String>,
    pub curated_vibe: Option<CuratedVibe>,
    pub curated_desc: Option<String>,
    pub critic_score: Option<i64>,
    pub user_rating: Option<f64>,
    pub release_date: Option<String>,
    pub background_image: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    /// Average playtime in hours.
    pub playtime: Option<i64>,
    pub esrb_rating: Option<String>,
    pub website: Option<String>,
    pub detail_url: Option<String>,
    pub backlog_status: BacklogStatus,
    /// ISO-8601 timestamp of the last successful enrichment; None means never.
    pub last_enriched: Option<String>,
    pub created_at: String,
}

impl CatalogItem {
    /// A bare item with only identity and required fields, everything else unset.
    pub fn new(id: String, title: String, platform: Platform) -> Self {
        Self {
            id,
            rawg_id: None,
            rawg_slug: None,
            title,
            platform,
            genre: None,
            curated_vibe: None,
            curated_desc: None,
            critic_score: None,
            user_rating: None,
            release_date: None,
            background_image: None,
            developer: None,
            publisher: None,
            description: None,
            playtime: None,
            esrb_rating: None,
            website: None,
            detail_url: None,
            backlog_status: BacklogStatus::None,
            last_enriched: None,
            created_at: String::new(),
        }
    }

    /// True when the item has a remote identity to enrich against.
    pub fn has_remote_identity(&self) -> bool {
        self.rawg_id.is_some() || self.rawg_slug.is_some()
    }
}

/// A cached screenshot belonging to exactly one catalog item.
///
/// The id is externally sourced (the remote provider's screenshot id) and the
/// full set is replaced wholesale on each successful enrichment pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Screenshot {
    pub id: String,
    pub item_id: String,
    pub image_url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// The set of fields an enrichment merge may touch.
///
/// All fields are optional; the partial update writes only the `Some` fields
/// and always stamps `last_enriched`. Fields absent from the struct are never
/// touched by enrichment.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentFields {
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
    pub rawg_id: Option<i64>,
    pub genre: Option<String>,
}

impl EnrichmentFields {
    /// Explicit (column, value) pairs for the fields that are set.
    ///
    /// This is the single list of columns enrichment is allowed to write;
    /// the store builds its partial UPDATE from it.
    pub fn set_columns(&self) -> Vec<(&'static str, rusqlite::types::Value)> {
        use rusqlite::types::Value;
        let mut columns = Vec::new();
        if let Some(v) = self.critic_score {
            columns.push(("critic_score", Value::Integer(v)));
        }
        if let Some(v) = self.user_rating {
            columns.push(("user_rating", Value::Real(v)));
        }
        if let Some(v) = &self.release_date {
            columns.push(("release_date", Value::Text(v.clone())));
        }
        if let Some(v) = &self.background_image {
            columns.push(("background_image", Value::Text(v.clone())));
        }
        if let Some(v) = &self.developer {
            columns.push(("developer", Value::Text(v.clone())));
        }
        if let Some(v) = &self.publisher {
            columns.push(("publisher", Value::Text(v.clone())));
        }
        if let Some(v) = &self.description {
            columns.push(("description", Value::Text(v.clone())));
        }
        if let Some(v) = self.playtime {
            columns.push(("playtime", Value::Integer(v)));
        }
        if let Some(v) = &self.esrb_rating {
            columns.push(("esrb_rating", Value::Text(v.clone())));
        }
        if let Some(v) = &self.website {
            columns.push(("website", Value::Text(v.clone())));
        }
        if let Some(v) = &self.detail_url {
            columns.push(("detail_url", Value::Text(v.clone())));
        }
        if let Some(v) = self.rawg_id {
            columns.push(("rawg_id", Value::Integer(v)));
        }
        if let Some(v) = &self.genre {
            columns.push(("genre", Value::Text(v.clone())));
        }
        columns
    }
}

/// Aggregate backlog counts grouped by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BacklogStats {
    pub total: u32,
    pub want_to_play: u32,
    pub playing: u32,
    pub completed: u32,
    pub dropped: u32,
}
