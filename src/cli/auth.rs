use crate::{config::Settings, error, info, success, sync::SyncContext, types::ProviderKind};

/// Makes sure radiosync holds working credentials for `provider`.
///
/// Persisted tokens that are still valid are kept unless `reset` is set, in
/// which case they are deleted first and the operator authorizes again.
pub async fn auth(settings: Settings, provider: ProviderKind, reset: bool) {
    if !settings.is_configured(provider) {
        error!(
            "{} is not configured. Add its credentials to the .env file in {}",
            provider,
            crate::config::data_dir().display()
        );
    }

    let ctx = match SyncContext::open(settings).await {
        Ok(ctx) => ctx,
        Err(e) => error!("Cannot open the store: {}", e),
    };

    if reset {
        match ctx.invalidate(provider) {
            Ok(true) => info!("Removed the stored {} authorization", provider),
            Ok(false) => info!("No stored {} authorization to remove", provider),
            Err(e) => error!("Cannot remove the stored {} authorization: {}", provider, e),
        }

        if let Err(e) = ctx.authorize(provider).await {
            error!("Authorization with {} failed: {}", provider, e);
        }
    } else if let Err(e) = ctx.connect(provider).await {
        error!("Authorization with {} failed: {}", provider, e);
    }

    success!("radiosync is authorized with {}", provider);
}
