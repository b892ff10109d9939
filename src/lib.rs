//! Local-first game catalog with background metadata enrichment.
//!
//! Items live in a local SQLite store and are progressively enriched with
//! metadata and screenshots from the RAWG API. Reads go through the local
//! store first; the network is only touched on a miss.

pub mod background_jobs;
pub mod catalog_store;
pub mod config;
pub mod enrichment;
pub mod platforms;
pub mod query;
pub mod rawg;
pub mod sqlite_persistence;
