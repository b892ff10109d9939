mod client;
mod types;

pub use client::{RawgClient, RemoteCatalog, RemoteError, SearchOptions, TopGamesOptions};
pub use types::*;
