use tabled::Table;

use crate::{
    Res,
    config::Settings,
    error,
    management::{PLAYLIST_PROPERTY_SUFFIX, Store, TokenManager, TokenSlot, TrackCache},
    types::{PlaylistTableRow, ProviderKind, ProviderTableRow},
};

/// Prints the managed playlists and the state of every provider.
pub async fn status(settings: Settings) {
    let store = match Store::open(settings.db_path()).await {
        Ok(store) => store,
        Err(e) => error!("Cannot open the store: {}", e),
    };

    if let Err(e) = print_status(&settings, &store) {
        error!("Cannot read the status: {}", e);
    }
}

fn print_status(settings: &Settings, store: &Store) -> Res<()> {
    let playlists = playlist_rows(store)?;
    if playlists.is_empty() {
        println!("No managed playlists yet. Run radiosync sync.\n");
    } else {
        println!("Playlists:\n{}\n", Table::new(playlists));
    }

    let mut providers = Vec::new();
    for provider in ProviderKind::ALL {
        let user_token = match TokenManager::new(store, provider, TokenSlot::User).load()? {
            Some(token) if token.is_expired() => "expired",
            Some(_) => "valid",
            None => "missing",
        };

        providers.push(ProviderTableRow {
            provider: provider.to_string(),
            configured: if settings.is_configured(provider) { "yes" } else { "no" }.to_string(),
            user_token: user_token.to_string(),
            cached_tracks: TrackCache::new(store, provider).entry_count()?,
        });
    }
    println!("Providers:\n{}", Table::new(providers));

    Ok(())
}

/// Splits `<provider>_<station>_playlist_id` properties into table rows.
fn playlist_rows(store: &Store) -> Res<Vec<PlaylistTableRow>> {
    let rows = store
        .properties_ending_with(PLAYLIST_PROPERTY_SUFFIX)?
        .into_iter()
        .filter_map(|(name, playlist_id)| {
            let scope = name.strip_suffix(PLAYLIST_PROPERTY_SUFFIX)?;
            let (provider, station) = scope.split_once('_')?;
            Some(PlaylistTableRow {
                station: station.to_string(),
                provider: provider.to_string(),
                playlist_id,
            })
        })
        .collect();

    Ok(rows)
}
