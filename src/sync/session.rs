//! Per-run context and credential bootstrap.

use reqwest::{Client, Url};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::{
    config::{DeezerSettings, Settings, TidalSettings},
    error::{AuthError, StoreError},
    info,
    management::{Store, TokenManager, TokenSlot},
    providers::{
        DeezerProvider, MusicProvider, TidalProvider, deezer,
        tidal::{self, TidalSession},
    },
    success,
    types::{ProviderKind, Token},
    utils, warning,
};

const TIDAL_USER_ID: &str = "tidal_user_id";

/// Everything one run shares: settings, the store and one HTTP client.
pub struct SyncContext {
    settings: Settings,
    store: Store,
    client: Client,
}

impl SyncContext {
    pub async fn open(settings: Settings) -> Result<Self, StoreError> {
        let store = Store::open(settings.db_path()).await?;
        Ok(Self::with_store(settings, store))
    }

    pub fn with_store(settings: Settings, store: Store) -> Self {
        Self {
            settings,
            store,
            client: Client::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A ready provider client, reusing persisted tokens where they are still
    /// valid and asking the operator to authorize otherwise.
    pub async fn connect(&self, kind: ProviderKind) -> Result<Box<dyn MusicProvider>, AuthError> {
        match kind {
            ProviderKind::Deezer => {
                let settings = self.deezer_settings()?;
                let tokens = TokenManager::new(&self.store, kind, TokenSlot::User);
                let token = match tokens.valid_token()? {
                    Some(token) => token,
                    None => self.authorize_deezer(settings).await?,
                };

                Ok(Box::new(DeezerProvider::new(
                    self.client.clone(),
                    settings,
                    token.access_token,
                )))
            }
            ProviderKind::Tidal => {
                let settings = self.tidal_settings()?;
                let app_token = self.tidal_app_token(settings).await?;
                let (user_token, user_id) = self.tidal_user(settings).await?;

                Ok(Box::new(TidalProvider::new(
                    self.client.clone(),
                    settings,
                    TidalSession {
                        app_token: app_token.access_token,
                        user_token: user_token.access_token,
                        user_id,
                    },
                )))
            }
        }
    }

    /// Runs the interactive authorization of a provider, replacing any
    /// persisted user token.
    pub async fn authorize(&self, kind: ProviderKind) -> Result<(), AuthError> {
        match kind {
            ProviderKind::Deezer => {
                self.authorize_deezer(self.deezer_settings()?).await?;
            }
            ProviderKind::Tidal => {
                let settings = self.tidal_settings()?;
                self.tidal_app_token(settings).await?;
                self.authorize_tidal(settings).await?;
            }
        }
        Ok(())
    }

    /// Forgets the persisted user credentials of a provider. Returns whether
    /// a token existed.
    pub fn invalidate(&self, kind: ProviderKind) -> Result<bool, StoreError> {
        let existed = TokenManager::new(&self.store, kind, TokenSlot::User).invalidate()?;
        if kind == ProviderKind::Tidal {
            self.store.remove_property(TIDAL_USER_ID)?;
        }
        Ok(existed)
    }

    fn deezer_settings(&self) -> Result<&DeezerSettings, AuthError> {
        self.settings
            .deezer
            .as_ref()
            .ok_or(AuthError::NotConfigured(ProviderKind::Deezer))
    }

    fn tidal_settings(&self) -> Result<&TidalSettings, AuthError> {
        self.settings
            .tidal
            .as_ref()
            .ok_or(AuthError::NotConfigured(ProviderKind::Tidal))
    }

    async fn authorize_deezer(&self, settings: &DeezerSettings) -> Result<Token, AuthError> {
        let url = deezer::auth::authorize_url(settings)?;
        let code = prompt_for_code(&url, &mut BufReader::new(tokio::io::stdin())).await?;

        let token = deezer::auth::exchange_code(&self.client, settings, &code).await?;
        TokenManager::new(&self.store, ProviderKind::Deezer, TokenSlot::User).persist(&token)?;
        success!("Deezer authorization saved");
        Ok(token)
    }

    async fn tidal_app_token(&self, settings: &TidalSettings) -> Result<Token, AuthError> {
        let tokens = TokenManager::new(&self.store, ProviderKind::Tidal, TokenSlot::App);
        if let Some(token) = tokens.valid_token()? {
            return Ok(token);
        }

        let token = tidal::auth::client_credentials(&self.client, settings).await?;
        tokens.persist(&token)?;
        Ok(token)
    }

    async fn tidal_user(&self, settings: &TidalSettings) -> Result<(Token, String), AuthError> {
        let tokens = TokenManager::new(&self.store, ProviderKind::Tidal, TokenSlot::User);
        let user_id = self.store.property(TIDAL_USER_ID)?;

        match (tokens.load()?, user_id) {
            (Some(token), Some(user_id)) if !token.is_expired() => Ok((token, user_id)),
            (Some(Token {
                refresh_token: Some(refresh_token),
                ..
            }), Some(user_id)) => {
                match tidal::auth::refresh_token(&self.client, settings, &refresh_token).await {
                    Ok(login) => {
                        tokens.persist(&login.token)?;
                        if let Some(renewed) = &login.user_id {
                            self.store.set_property(TIDAL_USER_ID, renewed)?;
                        }
                        Ok((login.token, login.user_id.unwrap_or(user_id)))
                    }
                    Err(e) => {
                        warning!("Failed to renew the Tidal session: {}", e);
                        self.authorize_tidal(settings).await
                    }
                }
            }
            _ => self.authorize_tidal(settings).await,
        }
    }

    async fn authorize_tidal(&self, settings: &TidalSettings) -> Result<(Token, String), AuthError> {
        let verifier = utils::generate_code_verifier();
        let challenge = utils::generate_code_challenge(&verifier);
        let url = tidal::auth::authorize_url(settings, &challenge)?;
        let code = prompt_for_code(&url, &mut BufReader::new(tokio::io::stdin())).await?;

        let login = tidal::auth::exchange_code(&self.client, settings, &code, &verifier).await?;
        TokenManager::new(&self.store, ProviderKind::Tidal, TokenSlot::User).persist(&login.token)?;
        let user_id = self.tidal_user_id(settings, &login).await?;
        success!("Tidal authorization saved");
        Ok((login.token, user_id))
    }

    /// The account id from the login, or from the session endpoint when the
    /// token response does not carry it. Persisted either way.
    async fn tidal_user_id(
        &self,
        settings: &TidalSettings,
        login: &tidal::auth::UserLogin,
    ) -> Result<String, AuthError> {
        let user_id = match &login.user_id {
            Some(user_id) => user_id.clone(),
            None => {
                tidal::auth::session_user_id(&self.client, settings, &login.token.access_token)
                    .await?
            }
        };
        self.store.set_property(TIDAL_USER_ID, &user_id)?;
        Ok(user_id)
    }
}

/// Shows the authorization page and reads the operator's answer: the code
/// itself or the whole URL the browser was redirected to.
pub async fn prompt_for_code<R>(url: &Url, input: &mut R) -> Result<String, AuthError>
where
    R: AsyncBufRead + Unpin,
{
    info!("Open the following URL and authorize radiosync:\n{}", url);
    if webbrowser::open(url.as_str()).is_err() {
        warning!("Failed to open browser. Please navigate to the URL above manually.");
    }
    info!("Paste the code or the URL you were redirected to:");

    let mut line = String::new();
    input.read_line(&mut line).await?;
    utils::extract_code(&line).ok_or(AuthError::MissingCode)
}
