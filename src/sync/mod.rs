//! # Sync
//!
//! A run mirrors every selected station onto every selected provider:
//!
//! 1. The station page is scraped once per run. A failed scrape is logged
//!    and treated as an empty playlist, which empties the mirror.
//! 2. For each provider, [`resolver::TrackResolver`] turns the mentions into
//!    provider track ids through the search cache.
//! 3. [`reconciler::PlaylistReconciler`] replaces the content of the managed
//!    playlist with the resolved tracks.
//!
//! Everything runs in sequence; the first fatal error ends the run.

use std::{collections::BTreeSet, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    error::SyncError,
    info,
    management::{Store, TrackCache, playlist_property_key},
    providers::MusicProvider,
    source::{SourceReader, Station},
    types::{ProviderKind, TrackMention},
    warning,
};

pub mod reconciler;
pub mod resolver;
pub mod session;

pub use reconciler::{PlaylistReconciler, PlaylistTarget, ReconcileOptions, ReconcileReport};
pub use resolver::{Resolution, ResolveReport, SearchPacer, TrackResolver};
pub use session::SyncContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub reconcile: ReconcileOptions,
}

/// The outcome of mirroring one station onto one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReport {
    pub station: String,
    pub provider: ProviderKind,
    pub mentions: usize,
    pub resolution: ResolveReport,
    pub playlist: ReconcileReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub pairs: Vec<PairReport>,
}

/// Mirrors each station onto each provider.
pub async fn run_sync(
    store: &Store,
    reader: &dyn SourceReader,
    stations: &[&Station],
    providers: &[&dyn MusicProvider],
    options: SyncOptions,
) -> Result<SyncSummary, SyncError> {
    let mut summary = SyncSummary::default();
    let mut pacer = SearchPacer::default();

    for station in stations {
        let mentions = match reader.read(station).await {
            Ok(mentions) => {
                info!("{} lists {} tracks", station.name, mentions.len());
                mentions
            }
            Err(e) => {
                warning!("Failed to read the playlist of {}: {}", station.name, e);
                BTreeSet::new()
            }
        };

        for provider in providers {
            let report =
                sync_pair(store, station, &mentions, *provider, options, &mut pacer).await?;
            summary.pairs.push(report);
        }
    }

    Ok(summary)
}

/// Resolves the mentions of one station on one provider and reconciles the
/// managed playlist. `pacer` carries the provider's last search time over
/// from earlier pairs.
pub async fn sync_pair(
    store: &Store,
    station: &Station,
    mentions: &BTreeSet<TrackMention>,
    provider: &dyn MusicProvider,
    options: SyncOptions,
    pacer: &mut SearchPacer,
) -> Result<PairReport, SyncError> {
    let kind = provider.kind();

    let mut resolver = TrackResolver::new(provider, TrackCache::new(store, kind))
        .with_pacer(std::mem::take(pacer));
    let resolution = resolver.resolve_all(mentions).await;
    *pacer = resolver.into_pacer();
    let resolution = resolution?;

    let reconciler = PlaylistReconciler::new(provider, store, options.reconcile);
    let playlist = reconciler
        .reconcile(&playlist_target(station, kind), &resolution.tracks)
        .await?;

    Ok(PairReport {
        station: station.key.to_string(),
        provider: kind,
        mentions: mentions.len(),
        resolution,
        playlist,
    })
}

pub fn playlist_target(station: &Station, provider: ProviderKind) -> PlaylistTarget {
    PlaylistTarget {
        name: station.playlist_name(),
        description: station.playlist_description(),
        property_key: playlist_property_key(provider, station.key),
    }
}

pub(crate) fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
