//! RAWG API client.
//!
//! The client talks either directly to api.rawg.io with an API key, or to a
//! proxy that injects the key server-side. Non-2xx responses are mapped to
//! typed errors so callers can distinguish a stale identity (404) from an
//! auth problem or an outage.

use super::types::*;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const RAWG_API_BASE: &str = "https://api.rawg.io/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("No API key configured and no proxy base URL set")]
    MissingApiKey,
    #[error("Remote catalog rejected the API key")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("Remote catalog failed with status {status}")]
    Server { status: u16 },
    #[error("Request failed")]
    Transport(#[source] reqwest::Error),
    #[error("Failed to decode response")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub platforms: Option<i64>,
    pub ordering: Option<String>,
    pub metacritic: Option<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct TopGamesOptions {
    pub ordering: Option<String>,
    pub metacritic: Option<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
}

/// Remote metadata source for catalog items.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    async fn search_games(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Paginated<RemoteGame>, RemoteError>;

    async fn get_top_games(
        &self,
        platform_rawg_id: i64,
        options: &TopGamesOptions,
    ) -> Result<Paginated<RemoteGame>, RemoteError>;

    /// Full detail by numeric id or slug.
    async fn get_game_detail(&self, id_or_slug: &str) -> Result<RemoteGame, RemoteError>;

    async fn get_game_screenshots(
        &self,
        rawg_id: i64,
    ) -> Result<Vec<RemoteScreenshot>, RemoteError>;

    async fn get_platforms(&self) -> Result<Vec<RemotePlatform>, RemoteError>;

    /// Cross-platform leaderboard: fetch top games per platform with the
    /// given ordering (defaults to descending critic score), merge and dedupe
    /// by id. A platform that fails with a transient error is skipped; an
    /// unauthorized response aborts the whole aggregation.
    async fn get_aggregated_top_games(
        &self,
        platform_ids: &[i64],
        ordering: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<RemoteGame>, RemoteError> {
        let ordering = ordering.unwrap_or("-metacritic");
        let options = TopGamesOptions {
            ordering: Some(ordering.to_string()),
            page_size: Some(page_size),
            ..Default::default()
        };

        let mut merged: Vec<RemoteGame> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        for &platform_id in platform_ids {
            let page = match self.get_top_games(platform_id, &options).await {
                Ok(page) => page,
                Err(RemoteError::Unauthorized) => return Err(RemoteError::Unauthorized),
                Err(err) => {
                    warn!("Failed to fetch top games for platform {platform_id}: {err}");
                    continue;
                }
            };
            for game in page.results {
                if seen.insert(game.id) {
                    merged.push(game);
                }
            }
        }

        Ok(rank_top_games(merged, ordering, page_size))
    }
}

pub struct RawgClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RawgClient {
    /// When `proxy_base` is set, requests go through the proxy and no key is
    /// appended. Otherwise the key is mandatory.
    pub fn new(
        api_key: Option<String>,
        proxy_base: Option<String>,
    ) -> Result<Self, RemoteError> {
        let (base_url, api_key) = match proxy_base {
            Some(base) => (base.trim_end_matches('/').to_string(), None),
            None => match api_key {
                Some(key) if !key.is_empty() => (RAWG_API_BASE.to_string(), Some(key)),
                _ => return Err(RemoteError::MissingApiKey),
            },
        };

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RemoteError::Transport)?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn build_url(&self, path: &str, params: &[(&str, Option<String>)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        let mut separator = '?';

        if let Some(key) = &self.api_key {
            url.push_str(&format!("{}key={}", separator, urlencoding::encode(key)));
            separator = '&';
        }
        for (name, value) in params {
            if let Some(value) = value {
                url.push_str(&format!(
                    "{}{}={}",
                    separator,
                    name,
                    urlencoding::encode(value)
                ));
                separator = '&';
            }
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, RemoteError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(RemoteError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        response.json::<T>().await.map_err(RemoteError::Decode)
    }
}

fn status_error(status: StatusCode) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized,
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        other => RemoteError::Server {
            status: other.as_u16(),
        },
    }
}

#[async_trait]
impl RemoteCatalog for RawgClient {
    async fn search_games(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Paginated<RemoteGame>, RemoteError> {
        let url = self.build_url(
            "/games",
            &[
                ("search", Some(query.to_string())),
                ("search_precise", Some("true".to_string())),
                (
                    "page_size",
                    Some(options.page_size.unwrap_or(20).to_string()),
                ),
                ("platforms", options.platforms.map(|p| p.to_string())),
                ("ordering", options.ordering.clone()),
                ("metacritic", options.metacritic.clone()),
                ("page", options.page.map(|p| p.to_string())),
            ],
        );
        self.get_json(&url).await
    }

    async fn get_top_games(
        &self,
        platform_rawg_id: i64,
        options: &TopGamesOptions,
    ) -> Result<Paginated<RemoteGame>, RemoteError> {
        let ordering = options
            .ordering
            .clone()
            .unwrap_or_else(|| "-metacritic".to_string());
        let url = self.build_url(
            "/games",
            &[
                ("platforms", Some(platform_rawg_id.to_string())),
                ("ordering", Some(ordering)),
                ("metacritic", options.metacritic.clone()),
                (
                    "page_size",
                    Some(options.page_size.unwrap_or(40).to_string()),
                ),
                ("page", options.page.map(|p| p.to_string())),
            ],
        );
        self.get_json(&url).await
    }

    async fn get_game_detail(&self, id_or_slug: &str) -> Result<RemoteGame, RemoteError> {
        let url = self.build_url(&format!("/games/{}", id_or_slug), &[]);
        self.get_json(&url).await
    }

    async fn get_game_screenshots(
        &self,
        rawg_id: i64,
    ) -> Result<Vec<RemoteScreenshot>, RemoteError> {
        let url = self.build_url(&format!("/games/{}/screenshots", rawg_id), &[]);
        let page: Paginated<RemoteScreenshot> = self.get_json(&url).await?;
        Ok(page.results)
    }

    async fn get_platforms(&self) -> Result<Vec<RemotePlatform>, RemoteError> {
        let url = self.build_url("/platforms", &[("page_size", Some("50".to_string()))]);
        let page: Paginated<RemotePlatform> = self.get_json(&url).await?;
        Ok(page.results)
    }

}

/// Cap a merged cross-platform result set at `page_size`. For the critic
/// score ordering the merged set is re-sorted (unscored games last); any
/// other ordering keeps the order the platforms were fetched in, since each
/// page already arrives sorted by the remote.
fn rank_top_games(
    mut games: Vec<RemoteGame>,
    ordering: &str,
    page_size: u32,
) -> Vec<RemoteGame> {
    if ordering == "-metacritic" {
        games.sort_by(|a, b| {
            b.metacritic
                .unwrap_or(i64::MIN)
                .cmp(&a.metacritic.unwrap_or(i64::MIN))
        });
    }
    games.truncate(page_size as usize);
    games
}
