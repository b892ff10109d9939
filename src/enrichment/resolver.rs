//! Identity resolution for items whose stored remote identity has gone stale.
//!
//! RAWG occasionally renames slugs, so a cached slug can start returning 404.
//! The resolver falls back to a platform-scoped title search and picks the
//! first candidate whose normalized title matches the item's.

use crate::platforms::Platform;
use crate::rawg::{RemoteCatalog, RemoteError, RemoteGame, SearchOptions};

const CANDIDATE_PAGE_SIZE: u32 = 5;

/// Lowercase and strip everything non-alphanumeric, so punctuation and
/// spacing differences don't prevent a match.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

pub struct IdentityResolver<'a> {
    remote: &'a dyn RemoteCatalog,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(remote: &'a dyn RemoteCatalog) -> Self {
        Self { remote }
    }

    /// Search the remote catalog for a game matching `title` on `platform`.
    /// Candidates are checked in remote relevance order; a candidate matches
    /// when the normalized titles are equal or one contains the other.
    pub async fn find_match(
        &self,
        title: &str,
        platform: Platform,
    ) -> Result<Option<RemoteGame>, RemoteError> {
        let options = SearchOptions {
            platforms: platform.rawg_id().map(|id| id as i64),
            page_size: Some(CANDIDATE_PAGE_SIZE),
            ..Default::default()
        };
        let page = self.remote.search_games(title, &options).await?;

        let target = normalize_title(title);
        let matched = page.results.into_iter().find(|candidate| {
            let normalized = normalize_title(&candidate.name);
            normalized.contains(&target) || target.contains(&normalized)
        });
        Ok(matched)
    }
}
