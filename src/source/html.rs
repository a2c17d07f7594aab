use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::{
    error::ScrapeError,
    source::{SourceReader, Station},
    types::TrackMention,
    utils,
};

/// Scrapes station pages over HTTP.
pub struct HtmlSourceReader {
    client: Client,
}

impl HtmlSourceReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceReader for HtmlSourceReader {
    async fn read(&self, station: &Station) -> Result<BTreeSet<TrackMention>, ScrapeError> {
        let response = self
            .client
            .get(station.url)
            .send()
            .await
            .map_err(|source| ScrapeError::FetchFailed {
                url: station.url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: station.url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ScrapeError::FetchFailed {
                url: station.url.to_string(),
                source,
            })?;

        parse_station_page(station, &body)
    }
}

/// Extracts the mentions from a station page.
///
/// Only the first `station.limit` entries are read. Cell text is trimmed and
/// inner whitespace collapsed; entries without a title or an artist are
/// skipped.
pub fn parse_station_page(
    station: &Station,
    html: &str,
) -> Result<BTreeSet<TrackMention>, ScrapeError> {
    let entries = selector(station, station.entry_selector)?;
    let titles = selector(station, station.title_selector)?;
    let artists = selector(station, station.artist_selector)?;

    let document = Html::parse_document(html);
    let mentions = document
        .select(&entries)
        .take(station.limit)
        .filter_map(|entry| {
            let title = cell_text(entry, &titles)?;
            let artist = cell_text(entry, &artists)?;
            Some(TrackMention::new(title, artist))
        })
        .collect();

    Ok(mentions)
}

fn selector(station: &Station, css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
        station: station.key.to_string(),
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

fn cell_text(entry: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let cell = entry.select(selector).next()?;
    let text = utils::normalize_whitespace(&cell.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}
