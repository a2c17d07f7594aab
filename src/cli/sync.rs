use tabled::Table;

use crate::{
    config::Settings,
    error, info,
    providers::MusicProvider,
    source::{self, HtmlSourceReader, Station},
    success,
    sync::{self, SyncContext, SyncOptions},
    types::{ProviderKind, SyncTableRow},
    warning,
};

/// Mirrors the selected stations onto the selected providers.
///
/// Empty selections mean every built-in station and every configured
/// provider. If a provider rejects its stored token, the token is deleted so
/// the next run asks for a new authorization.
pub async fn sync(settings: Settings, station_keys: Vec<String>, providers: Vec<ProviderKind>) {
    let stations = select_stations(&station_keys);
    let providers = select_providers(&settings, providers);

    let ctx = match SyncContext::open(settings).await {
        Ok(ctx) => ctx,
        Err(e) => error!("Cannot open the store: {}", e),
    };

    let mut clients: Vec<Box<dyn MusicProvider>> = Vec::new();
    for provider in &providers {
        match ctx.connect(*provider).await {
            Ok(client) => clients.push(client),
            Err(e) => error!("Cannot connect to {}: {}", provider, e),
        }
    }
    let clients: Vec<&dyn MusicProvider> = clients.iter().map(|c| c.as_ref()).collect();

    let reader = HtmlSourceReader::new(ctx.client().clone());
    let summary = match sync::run_sync(
        ctx.store(),
        &reader,
        &stations,
        &clients,
        SyncOptions::default(),
    )
    .await
    {
        Ok(summary) => summary,
        Err(e) => {
            if let Some(provider) = e.rejected_provider() {
                match ctx.invalidate(provider) {
                    Ok(_) => warning!(
                        "{} rejected the stored token. Run radiosync auth {} before the next sync.",
                        provider,
                        provider
                    ),
                    Err(store_error) => warning!(
                        "Cannot remove the rejected {} token: {}",
                        provider,
                        store_error
                    ),
                }
            }
            error!("Sync failed: {}", e);
        }
    };

    let rows: Vec<SyncTableRow> = summary
        .pairs
        .iter()
        .map(|pair| SyncTableRow {
            station: pair.station.clone(),
            provider: pair.provider.to_string(),
            mentions: pair.mentions,
            resolved: pair.resolution.resolved(),
            unmatched: pair.resolution.unmatched + pair.resolution.malformed,
            removed: pair.playlist.removed,
            added: pair.playlist.added,
        })
        .collect();

    println!("{}", Table::new(rows));
    success!("Synchronized {} playlists", summary.pairs.len());
}

fn select_stations(keys: &[String]) -> Vec<&'static Station> {
    if keys.is_empty() {
        return source::STATIONS.iter().collect();
    }

    keys.iter()
        .map(|key| match source::find_station(key) {
            Some(station) => station,
            None => error!("Unknown station {}. Run radiosync stations for the list.", key),
        })
        .collect()
}

fn select_providers(settings: &Settings, requested: Vec<ProviderKind>) -> Vec<ProviderKind> {
    if requested.is_empty() {
        let configured = settings.configured_providers();
        if configured.is_empty() {
            error!(
                "No provider is configured. Add credentials to the .env file in {}",
                crate::config::data_dir().display()
            );
        }
        info!(
            "Syncing to {}",
            configured
                .iter()
                .map(ProviderKind::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        return configured;
    }

    let mut providers = requested;
    providers.sort();
    providers.dedup();

    for provider in &providers {
        if !settings.is_configured(*provider) {
            error!("{} is not configured", provider);
        }
    }
    providers
}
