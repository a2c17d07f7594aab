mod auth;
mod cache;
mod store;

pub use auth::TokenManager;
pub use auth::TokenSlot;
pub use cache::TrackCache;
pub use store::Store;

/// Name of the property holding the id of a managed playlist.
pub fn playlist_property_key(
    provider: crate::types::ProviderKind,
    station_key: &str,
) -> String {
    format!("{provider}_{station_key}_playlist_id")
}

pub const PLAYLIST_PROPERTY_SUFFIX: &str = "_playlist_id";
