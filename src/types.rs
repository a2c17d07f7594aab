use std::fmt;

use chrono::Utc;
use clap::ValueEnum;
use tabled::Tabled;

/// The streaming services a station playlist can be mirrored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum ProviderKind {
    Deezer,
    Tidal,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Deezer, ProviderKind::Tidal];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Deezer => "deezer",
            ProviderKind::Tidal => "tidal",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scraped (title, artist) pair before resolution.
///
/// Ordering and equality are by value so a `BTreeSet<TrackMention>` collapses
/// repeated plays of the same song within one scrape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackMention {
    pub title: String,
    pub artist: String,
}

impl TrackMention {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

impl fmt::Display for TrackMention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// An opaque track identifier within one provider's catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderTrackId {
    pub provider: ProviderKind,
    pub id: String,
}

impl ProviderTrackId {
    pub fn new(provider: ProviderKind, id: impl Into<String>) -> Self {
        Self {
            provider,
            id: id.into(),
        }
    }
}

/// A persisted access token.
///
/// `expires_at` is a unix timestamp in seconds; `None` means the provider
/// issued a token without expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
}

impl Token {
    /// Seconds before the real expiry at which a token is already treated as expired.
    pub const EXPIRY_MARGIN: i64 = 240;

    pub fn from_expires_in(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| Utc::now().timestamp() + secs),
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - Self::EXPIRY_MARGIN,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

/// One page of a remote playlist listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackPage {
    pub track_ids: Vec<String>,
    /// Offset of the following page, `None` once the listing is exhausted.
    pub next_offset: Option<u32>,
}

#[derive(Tabled)]
pub struct StationTableRow {
    pub key: String,
    pub name: String,
    pub url: String,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub station: String,
    pub provider: String,
    pub playlist_id: String,
}

#[derive(Tabled)]
pub struct ProviderTableRow {
    pub provider: String,
    pub configured: String,
    pub user_token: String,
    pub cached_tracks: usize,
}

#[derive(Tabled)]
pub struct SyncTableRow {
    pub station: String,
    pub provider: String,
    pub mentions: usize,
    pub resolved: usize,
    pub unmatched: usize,
    pub removed: usize,
    pub added: usize,
}
