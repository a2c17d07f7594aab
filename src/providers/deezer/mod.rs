//! Deezer catalog search and playlist management.
//!
//! Deezer reports most errors as `200 OK` with an `{"error": {...}}` body, so
//! every response goes through [`parse`] before it is trusted.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    config::DeezerSettings,
    error::ProviderError,
    providers::{MusicProvider, http},
    types::{ProviderKind, TrackPage},
};

pub mod auth;

const PROVIDER: ProviderKind = ProviderKind::Deezer;

pub const PAGE_SIZE: u32 = 25;

/// Deezer error code for a resource that does not exist.
pub const ERROR_CODE_NO_DATA: i64 = 800;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    data: Vec<Item>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: u64,
}

pub struct DeezerProvider {
    client: Client,
    api_url: Url,
    access_token: String,
}

impl DeezerProvider {
    pub fn new(client: Client, settings: &DeezerSettings, access_token: String) -> Self {
        Self {
            client,
            api_url: settings.api_url.clone(),
            access_token,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        http::endpoint(PROVIDER, &self.api_url, segments)
    }

    async fn mutate_tracks(
        &self,
        method: reqwest::Method,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError> {
        let songs = track_ids.join(",");
        let request = self
            .client
            .request(method, self.url(&["playlist", playlist_id, "tracks"])?)
            .query(&[
                ("songs", songs.as_str()),
                ("access_token", self.access_token.as_str()),
            ]);

        let body = http::send_for_text(PROVIDER, request).await?;
        parse_mutation_response(&format!("playlist {playlist_id} tracks {songs}"), &body)
    }
}

#[async_trait]
impl MusicProvider for DeezerProvider {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn search(&self, title: &str, artist: &str) -> Result<Vec<String>, ProviderError> {
        let query = strict_query(title, artist);
        let request = self.client.get(self.url(&["search"])?).query(&[
            ("q", query.as_str()),
            ("strict", "on"),
            ("access_token", self.access_token.as_str()),
        ]);

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
            .post(self.url(&["user", "me", "playlists"])?)
            .query(&[("title", name), ("access_token", self.access_token.as_str())]);

        let body = http::send_for_text(PROVIDER, request).await?;
        let created: CreatedPlaylist = parse(&format!("create playlist {name}"), &body)?;
        let playlist_id = created.id.to_string();

        // Deezer takes no description on creation.
        if !description.is_empty() {
            let request = self
                .client
                .post(self.url(&["playlist", &playlist_id])?)
                .query(&[
                    ("description", description),
                    ("access_token", self.access_token.as_str()),
                ]);
            let body = http::send_for_text(PROVIDER, request).await?;
            parse_mutation_response(&format!("describe playlist {playlist_id}"), &body)?;
        }

        Ok(playlist_id)
    }

    async fn playlist_exists(&self, playlist_id: &str) -> Result<bool, ProviderError> {
        let request = self
            .client
            .get(self.url(&["playlist", playlist_id])?)
            .query(&[("access_token", self.access_token.as_str())]);

        let body = http::send_for_text(PROVIDER, request).await?;
        match parse::<Value>(&format!("playlist {playlist_id}"), &body) {
            Ok(_) => Ok(true),
            Err(ProviderError::Api { code, .. }) if code == ERROR_CODE_NO_DATA => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_tracks(&self, playlist_id: &str, offset: u32) -> Result<TrackPage, ProviderError> {
        let request = self
            .client
            .get(self.url(&["playlist", playlist_id, "tracks"])?)
            .query(&[
                ("index", offset.to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("access_token", self.access_token.clone()),
            ]);

        let body = http::send_for_text(PROVIDER, request).await?;
        parse_track_page(playlist_id, offset, &body)
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ProviderError> {
        self.mutate_tracks(reqwest::Method::POST, playlist_id, track_ids)
            .await
    }

    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError> {
        self.mutate_tracks(reqwest::Method::DELETE, playlist_id, track_ids)
            .await
    }
}

/// The strict advanced-search query for a title and artist.
///
/// Double quotes would end the quoted terms early, so they are dropped.
pub fn strict_query(title: &str, artist: &str) -> String {
    let unquote = |s: &str| s.replace('"', "");
    format!(
        "track:\"{}\" artist:\"{}\"",
        unquote(title),
        unquote(artist)
    )
}

pub fn parse_search_response(query: &str, body: &str) -> Result<Vec<String>, ProviderError> {
    let list: ItemList = parse(query, body)?;
    Ok(list.data.into_iter().map(|item| item.id.to_string()).collect())
}

pub fn parse_track_page(
    playlist_id: &str,
    offset: u32,
    body: &str,
) -> Result<TrackPage, ProviderError> {
    let list: ItemList = parse(&format!("playlist {playlist_id} tracks"), body)?;
    let count = list.data.len() as u32;
    let next_offset = match list.next {
        Some(_) if count > 0 => Some(offset + count),
        _ => None,
    };

    Ok(TrackPage {
        track_ids: list.data.into_iter().map(|item| item.id.to_string()).collect(),
        next_offset,
    })
}

/// Playlist mutations answer with a bare `true`.
pub fn parse_mutation_response(context: &str, body: &str) -> Result<(), ProviderError> {
    match parse::<Value>(context, body)? {
        Value::Bool(true) => Ok(()),
        Value::Bool(false) => Err(ProviderError::Api {
            provider: PROVIDER,
            code: 0,
            message: format!("{context} was refused"),
        }),
        _ => Err(ProviderError::malformed(
            PROVIDER,
            context,
            "expected a boolean",
            body,
        )),
    }
}

/// Decodes a Deezer response, turning an error envelope into a typed error.
fn parse<T: DeserializeOwned>(query: &str, body: &str) -> Result<T, ProviderError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProviderError::malformed(PROVIDER, query, e, body))?;

    if value.get("error").is_some() {
        let envelope: ErrorEnvelope = serde_json::from_value(value)
            .map_err(|e| ProviderError::malformed(PROVIDER, query, e, body))?;
        return Err(api_error(envelope.error));
    }

    serde_json::from_value(value).map_err(|e| ProviderError::malformed(PROVIDER, query, e, body))
}

fn api_error(error: ApiErrorBody) -> ProviderError {
    if error.kind == "OAuthException" {
        return ProviderError::AuthExpired { provider: PROVIDER };
    }

    ProviderError::Api {
        provider: PROVIDER,
        code: error.code,
        message: error.message,
    }
}
