mod engine;
mod resolver;

pub use engine::{EnrichmentEngine, EnrichmentSettings, PassSummary};
pub use resolver::{normalize_title, IdentityResolver};
