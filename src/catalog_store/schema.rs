//! Database schema for catalog.db.
//!
//! Defines versioned schema migrations for the local catalog database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

/// Catalog items table
const ITEMS_TABLE_V1: Table = Table {
    name: "items",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("rawg_id", &SqlType::Integer),
        sqlite_column!("rawg_slug", &SqlType::Text),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("platform", &SqlType::Text, non_null = true),
        sqlite_column!("genre", &SqlType::Text),
        sqlite_column!("curated_vibe", &SqlType::Text),
        sqlite_column!("curated_desc", &SqlType::Text),
        sqlite_column!("critic_score", &SqlType::Integer),
        sqlite_column!("user_rating", &SqlType::Real),
        sqlite_column!("release_date", &SqlType::Text),
        sqlite_column!("background_image", &SqlType::Text),
        sqlite_column!("developer", &SqlType::Text),
        sqlite_column!("publisher", &SqlType::Text),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("playtime", &SqlType::Integer),
        sqlite_column!("esrb_rating", &SqlType::Text),
        sqlite_column!("website", &SqlType::Text),
        sqlite_column!("detail_url", &SqlType::Text),
        sqlite_column!(
            "backlog_status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'none'")
        ),
        sqlite_column!("last_enriched", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("(datetime('now'))")
        ),
    ],
    indices: &[
        ("idx_items_platform", "platform"),
        ("idx_items_backlog", "backlog_status"),
        ("idx_items_rawg_slug", "rawg_slug"),
    ],
};

/// Cached screenshots, replaced wholesale on each enrichment pass
const SCREENSHOTS_TABLE_V1: Table = Table {
    name: "screenshots",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "item_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "items",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("image_url", &SqlType::Text, non_null = true),
        sqlite_column!("width", &SqlType::Integer),
        sqlite_column!("height", &SqlType::Integer),
    ],
    indices: &[("idx_screenshots_item", "item_id")],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ITEMS_TABLE_V1, SCREENSHOTS_TABLE_V1],
    migration: None,
}];
