use std::fmt;

use crate::{
    error::StoreError,
    management::Store,
    types::{ProviderKind, Token},
};

/// Which of a provider's tokens is meant.
///
/// Tidal searches with an application token and mutates playlists with a
/// user token; Deezer only has a user token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSlot {
    App,
    User,
}

impl fmt::Display for TokenSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSlot::App => f.write_str("app"),
            TokenSlot::User => f.write_str("user"),
        }
    }
}

/// Persists one token as a group of properties named
/// `<provider>_<slot>_{access_token,refresh_token,expires_at}`.
pub struct TokenManager<'a> {
    store: &'a Store,
    provider: ProviderKind,
    slot: TokenSlot,
}

impl<'a> TokenManager<'a> {
    pub fn new(store: &'a Store, provider: ProviderKind, slot: TokenSlot) -> Self {
        Self {
            store,
            provider,
            slot,
        }
    }

    pub fn load(&self) -> Result<Option<Token>, StoreError> {
        let Some(access_token) = self.store.property(&self.key("access_token"))? else {
            return Ok(None);
        };

        let refresh_token = self.store.property(&self.key("refresh_token"))?;
        let expires_at = self
            .store
            .property(&self.key("expires_at"))?
            .and_then(|v| v.parse::<i64>().ok());

        Ok(Some(Token {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    /// The persisted token, unless it is missing or expired.
    pub fn valid_token(&self) -> Result<Option<Token>, StoreError> {
        Ok(self.load()?.filter(|token| !token.is_expired()))
    }

    pub fn persist(&self, token: &Token) -> Result<(), StoreError> {
        self.store
            .set_property(&self.key("access_token"), &token.access_token)?;

        match &token.refresh_token {
            Some(refresh_token) => self
                .store
                .set_property(&self.key("refresh_token"), refresh_token)?,
            None => {
                self.store.remove_property(&self.key("refresh_token"))?;
            }
        }

        match token.expires_at {
            Some(expires_at) => self
                .store
                .set_property(&self.key("expires_at"), &expires_at.to_string())?,
            None => {
                self.store.remove_property(&self.key("expires_at"))?;
            }
        }

        Ok(())
    }

    /// Deletes the persisted token. Returns whether one existed.
    pub fn invalidate(&self) -> Result<bool, StoreError> {
        let existed = self.store.remove_property(&self.key("access_token"))?;
        self.store.remove_property(&self.key("refresh_token"))?;
        self.store.remove_property(&self.key("expires_at"))?;
        Ok(existed)
    }

    fn key(&self, field: &str) -> String {
        format!("{}_{}_{}", self.provider, self.slot, field)
    }
}
