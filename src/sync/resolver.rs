use std::collections::{BTreeSet, HashMap};

use tokio::time::{Instant, sleep};

use crate::{
    error::{ProviderError, SyncError},
    info,
    management::TrackCache,
    providers::MusicProvider,
    sync::spinner,
    types::{ProviderKind, ProviderTrackId, TrackMention},
    utils, warning,
};

/// The outcome for one mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Served from the search cache, no request was made.
    Cached(String),
    /// The provider's first search result, now cached.
    Found(String),
    /// The provider returned no result.
    NoMatch,
    /// The provider's answer could not be read. The mention is dropped.
    Malformed {
        query: String,
        reason: String,
        body: String,
    },
}

impl Resolution {
    pub fn track_id(&self) -> Option<&str> {
        match self {
            Resolution::Cached(id) | Resolution::Found(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub tracks: BTreeSet<ProviderTrackId>,
    pub cached: usize,
    pub found: usize,
    pub unmatched: usize,
    pub malformed: usize,
}

impl ResolveReport {
    pub fn resolved(&self) -> usize {
        self.cached + self.found
    }
}

/// Remembers when each provider was last searched, so that a provider's
/// search delay holds across every station of a run.
#[derive(Debug, Default)]
pub struct SearchPacer {
    last_search: HashMap<ProviderKind, Instant>,
}

impl SearchPacer {
    /// Waits out what is left of the provider's search delay, then records
    /// the search about to be made.
    pub async fn pace(&mut self, provider: &dyn MusicProvider) {
        let kind = provider.kind();
        if let (Some(delay), Some(last)) = (provider.search_delay(), self.last_search.get(&kind)) {
            let remaining = delay.saturating_sub(last.elapsed());
            if !remaining.is_zero() {
                sleep(remaining).await;
            }
        }
        self.last_search.insert(kind, Instant::now());
    }
}

/// Resolves mentions to track ids of one provider, consulting its search
/// cache first.
pub struct TrackResolver<'a> {
    provider: &'a dyn MusicProvider,
    cache: TrackCache<'a>,
    pacer: SearchPacer,
}

impl<'a> TrackResolver<'a> {
    pub fn new(provider: &'a dyn MusicProvider, cache: TrackCache<'a>) -> Self {
        Self {
            provider,
            cache,
            pacer: SearchPacer::default(),
        }
    }

    /// Continues the pacing of an earlier resolver.
    pub fn with_pacer(mut self, pacer: SearchPacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn into_pacer(self) -> SearchPacer {
        self.pacer
    }

    pub async fn resolve(&mut self, mention: &TrackMention) -> Result<Resolution, SyncError> {
        let title = utils::sanitize(&mention.title);
        let artist = utils::sanitize(&mention.artist);
        let key = utils::query_key(&title, &artist);

        if let Some(track_id) = self.cache.lookup(&key)? {
            return Ok(Resolution::Cached(track_id));
        }

        // Only network searches are spaced out.
        self.pacer.pace(self.provider).await;

        match self.provider.search(&title, &artist).await {
            Ok(ids) => match ids.into_iter().next() {
                Some(track_id) => {
                    self.cache.store(&key, &track_id)?;
                    Ok(Resolution::Found(track_id))
                }
                None => Ok(Resolution::NoMatch),
            },
            Err(ProviderError::MalformedResponse {
                query,
                reason,
                body,
                ..
            }) => Ok(Resolution::Malformed {
                query,
                reason,
                body,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn resolve_all(
        &mut self,
        mentions: &BTreeSet<TrackMention>,
    ) -> Result<ResolveReport, SyncError> {
        let provider = self.provider.kind();
        let total = mentions.len();
        let mut report = ResolveReport::default();

        let pb = spinner(format!("Resolving {total} tracks on {provider}..."));

        for (index, mention) in mentions.iter().enumerate() {
            pb.set_message(format!(
                "Resolving {mention} on {provider} ({current}/{total})",
                current = index + 1
            ));

            let resolution = match self.resolve(mention).await {
                Ok(resolution) => resolution,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };

            match &resolution {
                Resolution::Cached(id) => {
                    report.cached += 1;
                    pb.suspend(|| info!("{}: {} (cached {})", provider, mention, id));
                }
                Resolution::Found(id) => {
                    report.found += 1;
                    pb.suspend(|| info!("{}: {} (found {})", provider, mention, id));
                }
                Resolution::NoMatch => {
                    report.unmatched += 1;
                    pb.suspend(|| warning!("{}: no match for {}", provider, mention));
                }
                Resolution::Malformed { query, reason, body } => {
                    report.malformed += 1;
                    pb.suspend(|| {
                        warning!(
                            "{}: unreadable search response for '{}': {}\n{}",
                            provider,
                            query,
                            reason,
                            body
                        )
                    });
                }
            }

            if let Some(id) = resolution.track_id() {
                report.tracks.insert(ProviderTrackId::new(provider, id));
            }
        }

        pb.finish_and_clear();
        Ok(report)
    }
}
