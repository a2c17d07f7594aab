//! # Music Providers
//!
//! Every streaming service radiosync writes to implements [`MusicProvider`],
//! the small set of capabilities the resolver and the reconciler need:
//! search, playlist creation, paginated listing, and batched add and remove.
//!
//! Provider quirks stay behind the trait:
//!
//! - [`deezer`] searches strictly on title and artist, pages playlists with
//!   an index cursor and removes tracks by id.
//! - [`tidal`] searches with one keyword query on the official API, uses a
//!   separate user session for playlists, and removes tracks by their
//!   position, guarded by the playlist's `ETag`.
//!
//! Both use [`http::send`] for requests, which retries `502 Bad Gateway` and
//! honours `Retry-After` on `429 Too Many Requests`.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::ProviderError,
    types::{ProviderKind, TrackPage},
};

pub mod deezer;
pub mod http;
pub mod tidal;

pub use deezer::DeezerProvider;
pub use tidal::TidalProvider;

#[async_trait]
pub trait MusicProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Pause to keep between two consecutive network searches.
    fn search_delay(&self) -> Option<Duration> {
        None
    }

    /// Ranked track ids matching a sanitized title and artist.
    ///
    /// An empty list is a well-formed "no match"; an unreadable response is
    /// [`ProviderError::MalformedResponse`].
    async fn search(&self, title: &str, artist: &str) -> Result<Vec<String>, ProviderError>;

    /// Creates a playlist and returns its id.
    async fn create_playlist(&self, name: &str, description: &str)
    -> Result<String, ProviderError>;

    /// Whether a playlist with this id still exists.
    async fn playlist_exists(&self, playlist_id: &str) -> Result<bool, ProviderError>;

    /// The page of track ids starting at `offset`.
    async fn list_tracks(&self, playlist_id: &str, offset: u32)
    -> Result<TrackPage, ProviderError>;

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String])
    -> Result<(), ProviderError>;

    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError>;
}
