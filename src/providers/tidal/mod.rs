//! Tidal search and playlist management.
//!
//! Search runs against the official JSON:API (`openapi.tidal.com/v2`) with an
//! application token. Playlists are changed through the user API
//! (`api.tidal.com/v1`) with the operator's token. That API removes items by
//! position and rejects writes without the playlist's current `ETag`.

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode, Url,
    header::{ACCEPT, ETAG, IF_NONE_MATCH},
};
use serde::Deserialize;

use crate::{
    config::TidalSettings,
    error::ProviderError,
    providers::{MusicProvider, http},
    types::{ProviderKind, TrackPage},
};

pub mod auth;

const PROVIDER: ProviderKind = ProviderKind::Tidal;

pub const PAGE_SIZE: u32 = 50;

/// Tidal throttles searches aggressively.
pub const SEARCH_DELAY: Duration = Duration::from_secs(5);

const JSON_API: &str = "application/vnd.api+json";

#[derive(Debug, Deserialize)]
struct SearchDocument {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    relationships: SearchRelationships,
}

#[derive(Debug, Deserialize)]
struct SearchRelationships {
    tracks: RelationshipList,
}

#[derive(Debug, Deserialize)]
struct RelationshipList {
    data: Vec<ResourceRef>,
}

#[derive(Debug, Deserialize)]
struct ResourceRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemsPage {
    total_number_of_items: u32,
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    item: ItemRef,
}

#[derive(Debug, Deserialize)]
struct ItemRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    uuid: String,
}

/// An authenticated Tidal session.
pub struct TidalSession {
    pub app_token: String,
    pub user_token: String,
    pub user_id: String,
}

pub struct TidalProvider {
    client: Client,
    api_url: Url,
    openapi_url: Url,
    country_code: String,
    session: TidalSession,
}

impl TidalProvider {
    pub fn new(client: Client, settings: &TidalSettings, session: TidalSession) -> Self {
        Self {
            client,
            api_url: settings.api_url.clone(),
            openapi_url: settings.openapi_url.clone(),
            country_code: settings.country_code.clone(),
            session,
        }
    }

    fn api(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = http::endpoint(PROVIDER, &self.api_url, segments)?;
        url.query_pairs_mut()
            .append_pair("countryCode", &self.country_code);
        Ok(url)
    }

    /// Current `ETag` of a playlist, required for every write.
    async fn etag(&self, playlist_id: &str) -> Result<String, ProviderError> {
        let request = self
            .client
            .get(self.api(&["playlists", playlist_id])?)
            .bearer_auth(&self.session.user_token);

        let response = http::send(PROVIDER, request).await?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(etag.unwrap_or_else(|| "*".to_string()))
    }

    /// Every item of the playlist in order, one entry per position.
    async fn all_items(&self, playlist_id: &str) -> Result<Vec<String>, ProviderError> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.list_tracks(playlist_id, offset).await?;
            items.extend(page.track_ids);
            match page.next_offset {
                Some(next) if next > offset => offset = next,
                _ => return Ok(items),
            }
        }
    }
}

#[async_trait]
impl MusicProvider for TidalProvider {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    fn search_delay(&self) -> Option<Duration> {
        Some(SEARCH_DELAY)
    }

    async fn search(&self, title: &str, artist: &str) -> Result<Vec<String>, ProviderError> {
        let query = keyword_query(title, artist);
        let mut url = http::endpoint(PROVIDER, &self.openapi_url, &["searchResults", &query])?;
        url.query_pairs_mut()
            .append_pair("countryCode", &self.country_code)
            .append_pair("include", "tracks");

        let request = self
            .client
            .get(url)
            .header(ACCEPT, JSON_API)
            .bearer_auth(&self.session.app_token);

        let body = http::send_for_text(PROVIDER, request).await?;
        parse_search_response(&query, &body)
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, ProviderError> {
        let request = self
            .client
            .post(self.api(&["users", &self.session.user_id, "playlists"])?)
            .bearer_auth(&self.session.user_token)
            .form(&[("title", name), ("description", description)]);

        let body = http::send_for_text(PROVIDER, request).await?;
        let created: CreatedPlaylist = serde_json::from_str(&body).map_err(|e| {
            ProviderError::malformed(PROVIDER, format!("create playlist {name}"), e, body.as_str())
        })?;
        Ok(created.uuid)
    }

    async fn playlist_exists(&self, playlist_id: &str) -> Result<bool, ProviderError> {
        let request = self
            .client
            .get(self.api(&["playlists", playlist_id])?)
            .bearer_auth(&self.session.user_token);

        match http::send(PROVIDER, request).await {
            Ok(_) => Ok(true),
            Err(ProviderError::HttpStatus { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn list_tracks(&self, playlist_id: &str, offset: u32) -> Result<TrackPage, ProviderError> {
        let mut url = self.api(&["playlists", playlist_id, "items"])?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &PAGE_SIZE.to_string());

        let request = self
            .client
            .get(url)
            .bearer_auth(&self.session.user_token);

        let body = http::send_for_text(PROVIDER, request).await?;
        parse_track_page(playlist_id, offset, &body)
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ProviderError> {
        let etag = self.etag(playlist_id).await?;
        let track_ids = track_ids.join(",");
        let request = self
            .client
            .post(self.api(&["playlists", playlist_id, "items"])?)
            .bearer_auth(&self.session.user_token)
            .header(IF_NONE_MATCH, etag)
            .form(&[
                ("trackIds", track_ids.as_str()),
                ("onDupes", "SKIP"),
                ("onArtifactNotFound", "SKIP"),
            ]);

        http::send(PROVIDER, request).await?;
        Ok(())
    }

    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError> {
        let items = self.all_items(playlist_id).await?;
        let indices = item_indices(&items, track_ids);
        if indices.is_empty() {
            return Ok(());
        }

        let etag = self.etag(playlist_id).await?;
        let request = self
            .client
            .delete(self.api(&["playlists", playlist_id, "items", &indices])?)
            .bearer_auth(&self.session.user_token)
            .header(IF_NONE_MATCH, etag);

        http::send(PROVIDER, request).await?;
        Ok(())
    }
}

/// Tidal's search takes one free-text query.
pub fn keyword_query(title: &str, artist: &str) -> String {
    format!("{title} {artist}")
}

pub fn parse_search_response(query: &str, body: &str) -> Result<Vec<String>, ProviderError> {
    let document: SearchDocument =
        serde_json::from_str(body).map_err(|e| ProviderError::malformed(PROVIDER, query, e, body))?;

    Ok(document
        .data
        .relationships
        .tracks
        .data
        .into_iter()
        .map(|track| track.id)
        .collect())
}

pub fn parse_track_page(
    playlist_id: &str,
    offset: u32,
    body: &str,
) -> Result<TrackPage, ProviderError> {
    let page: ItemsPage = serde_json::from_str(body).map_err(|e| {
        ProviderError::malformed(PROVIDER, format!("playlist {playlist_id} items"), e, body)
    })?;

    let count = page.items.len() as u32;
    let next_offset = if count > 0 && offset + count < page.total_number_of_items {
        Some(offset + count)
    } else {
        None
    };

    Ok(TrackPage {
        track_ids: page
            .items
            .into_iter()
            .map(|entry| entry.item.id.to_string())
            .collect(),
        next_offset,
    })
}

/// Comma-separated positions of every item whose id is in `track_ids`.
pub fn item_indices(items: &[String], track_ids: &[String]) -> String {
    let wanted: HashSet<&str> = track_ids.iter().map(String::as_str).collect();
    items
        .iter()
        .enumerate()
        .filter(|(_, id)| wanted.contains(id.as_str()))
        .map(|(index, _)| index.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
