use std::{collections::BTreeSet, time::Duration};

use tokio::time::sleep;

use crate::{
    error::{BatchStep, SyncError},
    info,
    management::Store,
    providers::MusicProvider,
    success,
    types::ProviderTrackId,
    warning,
};

/// Tuning of the remote mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Track ids sent per add or remove request.
    pub batch_size: usize,
    /// Pause after a removal step before tracks are added again.
    pub removal_cooldown: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            removal_cooldown: Duration::from_secs(10),
        }
    }
}

/// The managed playlist a target set is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistTarget {
    pub name: String,
    pub description: String,
    /// Property holding the playlist id between runs.
    pub property_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub playlist_id: String,
    pub created: bool,
    pub removed: usize,
    pub added: usize,
}

/// Makes a remote playlist contain exactly a target set of tracks.
///
/// Every run removes all current tracks and adds the target set again. The
/// result does not depend on what the playlist held before, so a run that
/// was interrupted is repaired by the next one.
pub struct PlaylistReconciler<'a> {
    provider: &'a dyn MusicProvider,
    store: &'a Store,
    options: ReconcileOptions,
}

impl<'a> PlaylistReconciler<'a> {
    pub fn new(provider: &'a dyn MusicProvider, store: &'a Store, options: ReconcileOptions) -> Self {
        Self {
            provider,
            store,
            options,
        }
    }

    pub async fn reconcile(
        &self,
        target: &PlaylistTarget,
        tracks: &BTreeSet<ProviderTrackId>,
    ) -> Result<ReconcileReport, SyncError> {
        let (playlist_id, created) = self.ensure_playlist(target).await?;

        let current = if created {
            Vec::new()
        } else {
            self.current_tracks(&playlist_id).await?
        };

        let removed = current.len();
        if removed > 0 {
            info!(
                "Removing {} tracks from {} playlist {}",
                removed,
                self.provider.kind(),
                target.name
            );
            self.apply(BatchStep::Remove, &playlist_id, &current).await?;
            sleep(self.options.removal_cooldown).await;
        }

        let provider = self.provider.kind();
        let additions: Vec<String> = tracks
            .iter()
            .filter_map(|track| {
                if track.provider == provider {
                    Some(track.id.clone())
                } else {
                    warning!(
                        "Skipping {} track {} for {} playlist {}",
                        track.provider,
                        track.id,
                        provider,
                        target.name
                    );
                    None
                }
            })
            .collect();

        let added = additions.len();
        if added > 0 {
            info!("Adding {} tracks to {} playlist {}", added, provider, target.name);
            self.apply(BatchStep::Add, &playlist_id, &additions).await?;
        }

        success!(
            "{} playlist {} ({}) holds {} tracks",
            provider,
            target.name,
            playlist_id,
            added
        );

        Ok(ReconcileReport {
            playlist_id,
            created,
            removed,
            added,
        })
    }

    /// The id of the managed playlist, creating and persisting a new one when
    /// none is known or the known one no longer exists. The flag tells whether
    /// the playlist was created.
    pub async fn ensure_playlist(&self, target: &PlaylistTarget) -> Result<(String, bool), SyncError> {
        if let Some(playlist_id) = self.store.property(&target.property_key)? {
            if self.provider.playlist_exists(&playlist_id).await? {
                return Ok((playlist_id, false));
            }
            warning!(
                "{} playlist {} no longer exists, creating a new one",
                self.provider.kind(),
                playlist_id
            );
        }

        let playlist_id = self
            .provider
            .create_playlist(&target.name, &target.description)
            .await?;
        self.store.set_property(&target.property_key, &playlist_id)?;
        info!(
            "Created {} playlist {} ({})",
            self.provider.kind(),
            target.name,
            playlist_id
        );

        Ok((playlist_id, true))
    }

    /// Every track id currently in the playlist, each listed once, in playlist
    /// order.
    pub async fn current_tracks(&self, playlist_id: &str) -> Result<Vec<String>, SyncError> {
        let mut seen = BTreeSet::new();
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.provider.list_tracks(playlist_id, offset).await?;
            for id in page.track_ids {
                if seen.insert(id.clone()) {
                    tracks.push(id);
                }
            }

            match page.next_offset {
                Some(next) if next > offset => offset = next,
                _ => return Ok(tracks),
            }
        }
    }

    async fn apply(&self, step: BatchStep, playlist_id: &str, ids: &[String]) -> Result<(), SyncError> {
        let total = ids.len();
        let mut applied = 0;

        for batch in ids.chunks(self.options.batch_size.max(1)) {
            let result = match step {
                BatchStep::Remove => self.provider.remove_tracks(playlist_id, batch).await,
                BatchStep::Add => self.provider.add_tracks(playlist_id, batch).await,
            };

            if let Err(source) = result {
                return Err(SyncError::Batch {
                    step,
                    playlist_id: playlist_id.to_string(),
                    applied,
                    total,
                    source,
                });
            }

            applied += batch.len();
            info!(
                "{} {}: {} {}/{} tracks",
                self.provider.kind(),
                playlist_id,
                step,
                applied,
                total
            );
        }

        Ok(())
    }
}
