//! # Station Sources
//!
//! A station is a radio programme whose public website lists what was played
//! recently. [`SourceReader`] turns one station page into the set of
//! (title, artist) mentions a sync run mirrors; [`html::HtmlSourceReader`]
//! does so by fetching the page and applying the station's CSS selectors.
//!
//! The built-in registry is [`STATIONS`].

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{error::ScrapeError, types::TrackMention};

pub mod html;

pub use html::HtmlSourceReader;

/// A radio station and how to read its playlist page.
#[derive(Debug, Clone)]
pub struct Station {
    /// Stable identifier, also part of the persisted playlist property name.
    pub key: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    /// Selects one element per played track.
    pub entry_selector: &'static str,
    /// Selects the title inside an entry.
    pub title_selector: &'static str,
    /// Selects the artist inside an entry.
    pub artist_selector: &'static str,
    /// Number of entries read from the top of the page.
    pub limit: usize,
}

impl Station {
    pub fn playlist_name(&self) -> String {
        format!("{} Playlist", self.name)
    }

    pub fn playlist_description(&self) -> String {
        format!(
            "The latest songs played on {}, kept up to date by radiosync. Source: {}",
            self.name, self.url
        )
    }
}

pub const STATIONS: &[Station] = &[Station {
    key: "dlf_nova",
    name: "Deutschlandfunk Nova",
    url: "https://www.deutschlandfunknova.de/playlist",
    entry_selector: "figcaption.playlist__title",
    title_selector: "div.title",
    artist_selector: "div.artist",
    limit: 50,
}];

pub fn find_station(key: &str) -> Option<&'static Station> {
    STATIONS.iter().find(|station| station.key == key)
}

/// Reads the current playlist of a station.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// The distinct mentions currently listed by the station. Repeated plays
    /// of one song collapse into a single mention.
    async fn read(&self, station: &Station) -> Result<BTreeSet<TrackMention>, ScrapeError>;
}
