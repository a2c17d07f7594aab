use crate::{error::StoreError, management::Store, types::ProviderKind};

/// The search cache of one provider.
///
/// Maps a normalized query key to the track id the provider returned for it.
/// Entries are never updated or evicted.
pub struct TrackCache<'a> {
    store: &'a Store,
    provider: ProviderKind,
}

impl<'a> TrackCache<'a> {
    pub fn new(store: &'a Store, provider: ProviderKind) -> Self {
        Self { store, provider }
    }

    pub fn lookup(&self, query_key: &str) -> Result<Option<String>, StoreError> {
        self.store.cached_track(self.provider, query_key)
    }

    /// Stores a resolution. A key that is already cached is a no-op, which
    /// keeps two racing runs from failing each other.
    pub fn store(&self, query_key: &str, track_id: &str) -> Result<(), StoreError> {
        self.store.cache_track(self.provider, query_key, track_id)?;
        Ok(())
    }

    pub fn entry_count(&self) -> Result<usize, StoreError> {
        self.store.cached_track_count(self.provider)
    }
}
