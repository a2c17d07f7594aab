//! Configuration management for radiosync.
//!
//! Settings come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Environment variables that are already
//! set take precedence over the file.
//!
//! A provider only takes part in a sync when all of its required credentials
//! are present. Setting some but not all of them is reported as an error so a
//! typo does not silently disable a provider.

use std::{
    env,
    path::{Path, PathBuf},
};

use reqwest::Url;

use crate::{error::ConfigError, types::ProviderKind};

const APP_DIR: &str = "radiosync";

const DEFAULT_DEEZER_API_URL: &str = "https://api.deezer.com";
const DEFAULT_DEEZER_CONNECT_URL: &str = "https://connect.deezer.com";
const DEFAULT_TIDAL_API_URL: &str = "https://api.tidal.com/v1";
const DEFAULT_TIDAL_OPENAPI_URL: &str = "https://openapi.tidal.com/v2";
const DEFAULT_TIDAL_AUTH_URL: &str = "https://auth.tidal.com/v1";
const DEFAULT_TIDAL_LOGIN_URL: &str = "https://login.tidal.com";
const DEFAULT_TIDAL_COUNTRY_CODE: &str = "DE";
const DEFAULT_TIDAL_SCOPE: &str = "r_usr w_usr";

/// Returns the radiosync directory inside the platform's local data directory.
///
/// - Linux: `~/.local/share/radiosync`
/// - macOS: `~/Library/Application Support/radiosync`
/// - Windows: `%LOCALAPPDATA%/radiosync`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads environment variables from `<data_dir>/.env`.
///
/// Creates the data directory if needed. A missing `.env` file is not an
/// error: all settings may come from the process environment instead.
pub async fn load_env() -> Result<(), ConfigError> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir)
        .await
        .map_err(|source| ConfigError::CreateDirectoryFailed {
            path: dir.clone(),
            source,
        })?;

    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| ConfigError::EnvFileFailed {
        path,
        reason: e.to_string(),
    })
}

/// Deezer application credentials and endpoints.
#[derive(Debug, Clone)]
pub struct DeezerSettings {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: String,
    pub api_url: Url,
    pub connect_url: Url,
}

/// Tidal application credentials and endpoints.
#[derive(Debug, Clone)]
pub struct TidalSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub country_code: String,
    pub scope: String,
    pub api_url: Url,
    pub openapi_url: Url,
    pub auth_url: Url,
    pub login_url: Url,
}

/// Everything a run needs to know about its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub deezer: Option<DeezerSettings>,
    pub tidal: Option<TidalSettings>,
}

impl Settings {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let db_path = get("RADIOSYNC_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("radiosync.db"));

        let deezer = match required(
            ProviderKind::Deezer,
            [
                ("DEEZER_APP_ID", get("DEEZER_APP_ID")),
                ("DEEZER_APP_SECRET", get("DEEZER_APP_SECRET")),
                ("DEEZER_REDIRECT_URI", get("DEEZER_REDIRECT_URI")),
            ],
        )? {
            Some([app_id, app_secret, redirect_uri]) => Some(DeezerSettings {
                app_id,
                app_secret,
                redirect_uri,
                api_url: url_setting(
                    "DEEZER_API_URL",
                    get("DEEZER_API_URL"),
                    DEFAULT_DEEZER_API_URL,
                )?,
                connect_url: url_setting(
                    "DEEZER_CONNECT_URL",
                    get("DEEZER_CONNECT_URL"),
                    DEFAULT_DEEZER_CONNECT_URL,
                )?,
            }),
            None => None,
        };

        let tidal = match required(
            ProviderKind::Tidal,
            [
                ("TIDAL_CLIENT_ID", get("TIDAL_CLIENT_ID")),
                ("TIDAL_CLIENT_SECRET", get("TIDAL_CLIENT_SECRET")),
                ("TIDAL_REDIRECT_URI", get("TIDAL_REDIRECT_URI")),
            ],
        )? {
            Some([client_id, client_secret, redirect_uri]) => Some(TidalSettings {
                client_id,
                client_secret,
                redirect_uri,
                country_code: get("TIDAL_COUNTRY_CODE")
                    .unwrap_or_else(|| DEFAULT_TIDAL_COUNTRY_CODE.to_string()),
                scope: get("TIDAL_SCOPE").unwrap_or_else(|| DEFAULT_TIDAL_SCOPE.to_string()),
                api_url: url_setting("TIDAL_API_URL", get("TIDAL_API_URL"), DEFAULT_TIDAL_API_URL)?,
                openapi_url: url_setting(
                    "TIDAL_OPENAPI_URL",
                    get("TIDAL_OPENAPI_URL"),
                    DEFAULT_TIDAL_OPENAPI_URL,
                )?,
                auth_url: url_setting(
                    "TIDAL_AUTH_URL",
                    get("TIDAL_AUTH_URL"),
                    DEFAULT_TIDAL_AUTH_URL,
                )?,
                login_url: url_setting(
                    "TIDAL_LOGIN_URL",
                    get("TIDAL_LOGIN_URL"),
                    DEFAULT_TIDAL_LOGIN_URL,
                )?,
            }),
            None => None,
        };

        Ok(Self {
            db_path,
            deezer,
            tidal,
        })
    }

    pub fn is_configured(&self, provider: ProviderKind) -> bool {
        match provider {
            ProviderKind::Deezer => self.deezer.is_some(),
            ProviderKind::Tidal => self.tidal.is_some(),
        }
    }

    /// The providers whose credentials are complete, in a stable order.
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// All or nothing: returns the values when every variable is set, `None` when
/// none is, and an error naming the first missing one otherwise.
fn required<const N: usize>(
    provider: ProviderKind,
    vars: [(&'static str, Option<String>); N],
) -> Result<Option<[String; N]>, ConfigError> {
    if vars.iter().all(|(_, value)| value.is_none()) {
        return Ok(None);
    }

    if let Some((var, _)) = vars.iter().find(|(_, value)| value.is_none()) {
        return Err(ConfigError::Incomplete {
            provider,
            var: *var,
        });
    }

    Ok(Some(vars.map(|(_, value)| value.unwrap_or_default())))
}

fn url_setting(
    var: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<Url, ConfigError> {
    let raw = value.unwrap_or_else(|| default.to_string());
    Url::parse(raw.trim_end_matches('/')).map_err(|_| ConfigError::InvalidUrl { var, value: raw })
}
