mod models;
mod schema;
mod store;

pub use models::*;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::{CatalogStore, SqliteCatalogStore};
