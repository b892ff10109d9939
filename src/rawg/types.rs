//! Wire types for the RAWG API.

use serde::Deserialize;

/// A game as returned by RAWG, both in list results and detail responses.
/// Detail-only fields are optional so the same type covers both shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteGame {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub metacritic: Option<i64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub playtime: Option<i64>,
    #[serde(default)]
    pub description_raw: Option<String>,
    #[serde(default)]
    pub developers: Option<Vec<NamedEntry>>,
    #[serde(default)]
    pub publishers: Option<Vec<NamedEntry>>,
    #[serde(default)]
    pub genres: Option<Vec<NamedEntry>>,
    #[serde(default)]
    pub platforms: Option<Vec<PlatformWrapper>>,
    #[serde(default)]
    pub esrb_rating: Option<NamedEntry>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub metacritic_url: Option<String>,
}

/// A `{ "name": ... }` object, used for developers, publishers, genres
/// and ESRB ratings.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

/// Platform entries in game payloads are nested one level deeper than
/// everywhere else in the API.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformWrapper {
    pub platform: RemotePlatform,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemotePlatform {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteScreenshot {
    pub id: i64,
    pub image: String,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
}

/// RAWG's standard paginated envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub count: i64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}
