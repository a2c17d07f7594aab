#![allow(dead_code)]

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use radiosync::{
    error::{ProviderError, ScrapeError},
    providers::MusicProvider,
    source::{SourceReader, Station},
    sync::ReconcileOptions,
    types::{ProviderKind, ProviderTrackId, TrackMention, TrackPage},
};

/// Recorded calls and remote state of a [`FakeProvider`].
#[derive(Debug, Default)]
pub struct FakeState {
    pub catalog: HashMap<(String, String), Vec<String>>,
    pub malformed: HashSet<(String, String)>,
    pub search_calls: Vec<(String, String)>,
    pub playlists: BTreeMap<String, Vec<String>>,
    pub created: Vec<(String, String)>,
    pub list_calls: usize,
    pub add_calls: Vec<Vec<String>>,
    pub remove_calls: Vec<Vec<String>>,
    /// Zero-based index of the add call that fails.
    pub fail_add_call: Option<usize>,
    /// Every request fails with a rejected token.
    pub reject_token: bool,
}

/// An in-memory provider with a fixed catalog.
pub struct FakeProvider {
    kind: ProviderKind,
    page_size: usize,
    search_delay: Option<Duration>,
    state: Mutex<FakeState>,
}

impl FakeProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            page_size: 4,
            search_delay: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_track(self, title: &str, artist: &str, id: &str) -> Self {
        self.state()
            .catalog
            .insert((title.to_string(), artist.to_string()), vec![id.to_string()]);
        self
    }

    pub fn with_results(self, title: &str, artist: &str, ids: &[&str]) -> Self {
        self.state().catalog.insert(
            (title.to_string(), artist.to_string()),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }

    pub fn with_malformed(self, title: &str, artist: &str) -> Self {
        self.state()
            .malformed
            .insert((title.to_string(), artist.to_string()));
        self
    }

    pub fn with_playlist(self, id: &str, tracks: &[&str]) -> Self {
        self.state().playlists.insert(
            id.to_string(),
            tracks.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn tracks_of(&self, playlist_id: &str) -> BTreeSet<String> {
        self.state()
            .playlists
            .get(playlist_id)
            .map(|tracks| tracks.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check_token(&self) -> Result<(), ProviderError> {
        if self.state().reject_token {
            return Err(ProviderError::AuthExpired {
                provider: self.kind,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MusicProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn search_delay(&self) -> Option<Duration> {
        self.search_delay
    }

    async fn search(&self, title: &str, artist: &str) -> Result<Vec<String>, ProviderError> {
        self.check_token()?;
        let mut state = self.state();
        let key = (title.to_string(), artist.to_string());
        state.search_calls.push(key.clone());

        if state.malformed.contains(&key) {
            return Err(ProviderError::malformed(
                self.kind,
                format!("{title} {artist}"),
                "expected value at line 1 column 1",
                "<html>busy</html>",
            ));
        }
        Ok(state.catalog.get(&key).cloned().unwrap_or_default())
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, ProviderError> {
        self.check_token()?;
        let mut state = self.state();
        state
            .created
            .push((name.to_string(), description.to_string()));
        let id = format!("pl-{}", state.created.len());
        state.playlists.insert(id.clone(), Vec::new());
        Ok(id)
    }

    async fn playlist_exists(&self, playlist_id: &str) -> Result<bool, ProviderError> {
        self.check_token()?;
        Ok(self.state().playlists.contains_key(playlist_id))
    }

    async fn list_tracks(&self, playlist_id: &str, offset: u32) -> Result<TrackPage, ProviderError> {
        self.check_token()?;
        let mut state = self.state();
        state.list_calls += 1;

        let tracks = state.playlists.get(playlist_id).cloned().unwrap_or_default();
        let start = (offset as usize).min(tracks.len());
        let end = (start + self.page_size).min(tracks.len());

        Ok(TrackPage {
            track_ids: tracks[start..end].to_vec(),
            next_offset: (end < tracks.len()).then_some(end as u32),
        })
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ProviderError> {
        self.check_token()?;
        let mut state = self.state();
        let call = state.add_calls.len();
        state.add_calls.push(track_ids.to_vec());

        if state.fail_add_call == Some(call) {
            return Err(ProviderError::HttpStatus {
                provider: self.kind,
                status: 500,
                body: "internal error".to_string(),
            });
        }

        state
            .playlists
            .entry(playlist_id.to_string())
            .or_default()
            .extend(track_ids.iter().cloned());
        Ok(())
    }

    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError> {
        self.check_token()?;
        let mut state = self.state();
        state.remove_calls.push(track_ids.to_vec());

        if let Some(tracks) = state.playlists.get_mut(playlist_id) {
            tracks.retain(|id| !track_ids.contains(id));
        }
        Ok(())
    }
}

/// Serves fixed mentions per station key; unknown stations fail to load.
#[derive(Default)]
pub struct FakeReader {
    pages: HashMap<String, BTreeSet<TrackMention>>,
}

impl FakeReader {
    pub fn with_page(mut self, station: &str, mentions: &[(&str, &str)]) -> Self {
        self.pages.insert(
            station.to_string(),
            mentions
                .iter()
                .map(|(title, artist)| TrackMention::new(*title, *artist))
                .collect(),
        );
        self
    }
}

#[async_trait]
impl SourceReader for FakeReader {
    async fn read(&self, station: &Station) -> Result<BTreeSet<TrackMention>, ScrapeError> {
        self.pages
            .get(station.key)
            .cloned()
            .ok_or_else(|| ScrapeError::HttpStatus {
                url: station.url.to_string(),
                status: 503,
            })
    }
}

pub const TEST_STATION: Station = Station {
    key: "test_fm",
    name: "Test FM",
    url: "https://radio.example/playlist",
    entry_selector: "li.entry",
    title_selector: "span.title",
    artist_selector: "span.artist",
    limit: 5,
};

pub const OTHER_STATION: Station = Station {
    key: "other_fm",
    name: "Other FM",
    url: "https://radio.example/other",
    entry_selector: "li.entry",
    title_selector: "span.title",
    artist_selector: "span.artist",
    limit: 5,
};

pub fn mentions(pairs: &[(&str, &str)]) -> BTreeSet<TrackMention> {
    pairs
        .iter()
        .map(|(title, artist)| TrackMention::new(*title, *artist))
        .collect()
}

pub fn track_ids(provider: ProviderKind, ids: &[&str]) -> BTreeSet<ProviderTrackId> {
    ids.iter().map(|id| ProviderTrackId::new(provider, *id)).collect()
}

pub fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn no_delay() -> ReconcileOptions {
    ReconcileOptions {
        batch_size: 10,
        removal_cooldown: Duration::ZERO,
    }
}
