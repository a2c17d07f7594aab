use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::types::ProviderKind;

/// Errors raised while loading settings from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{provider} is partially configured: {var} must be set")]
    Incomplete {
        provider: ProviderKind,
        var: &'static str,
    },

    #[error("{var} is not a valid URL: {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load {path}: {reason}")]
    EnvFileFailed { path: PathBuf, reason: String },
}

/// Errors of the persisted property and search cache store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Errors of a station page scrape. Never fatal to a run.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to fetch {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid selector '{selector}' for station {station}: {reason}")]
    InvalidSelector {
        station: String,
        selector: String,
        reason: String,
    },
}

/// Errors returned by a music provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request to {provider} failed: {source}")]
    Transport {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} responded with HTTP {status}: {body}")]
    HttpStatus {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    #[error("{provider} API error {code}: {message}")]
    Api {
        provider: ProviderKind,
        code: i64,
        message: String,
    },

    #[error("{provider} rejected the access token")]
    AuthExpired { provider: ProviderKind },

    #[error("Malformed {provider} response for '{query}': {reason}")]
    MalformedResponse {
        provider: ProviderKind,
        query: String,
        reason: String,
        body: String,
    },

    #[error("Invalid {provider} URL: {url}")]
    InvalidUrl { provider: ProviderKind, url: String },
}

impl ProviderError {
    pub fn malformed(
        provider: ProviderKind,
        query: impl Into<String>,
        reason: impl fmt::Display,
        body: impl Into<String>,
    ) -> Self {
        ProviderError::MalformedResponse {
            provider,
            query: query.into(),
            reason: reason.to_string(),
            body: body.into(),
        }
    }
}

/// Errors of the credential bootstrap and renewal flows.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0} is not configured; set its credentials in the .env file")]
    NotConfigured(ProviderKind),

    #[error("Failed to read the authorization code: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("No authorization code was entered")]
    MissingCode,

    #[error("{provider} refused the authorization: {reason}")]
    Rejected {
        provider: ProviderKind,
        reason: String,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The step of a reconciliation a failed batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStep {
    Remove,
    Add,
}

impl fmt::Display for BatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStep::Remove => f.write_str("remove"),
            BatchStep::Add => f.write_str("add"),
        }
    }
}

/// Top-level errors of a sync run. Every variant is fatal to the run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(
        "Failed to {step} tracks on playlist {playlist_id} after {applied} of {total}: {source}"
    )]
    Batch {
        step: BatchStep,
        playlist_id: String,
        applied: usize,
        total: usize,
        #[source]
        source: ProviderError,
    },
}

impl SyncError {
    /// The provider whose token was rejected, if that is what failed the run.
    pub fn rejected_provider(&self) -> Option<ProviderKind> {
        let source = match self {
            SyncError::Provider(e) => e,
            SyncError::Batch { source, .. } => source,
            SyncError::Auth(AuthError::Provider(e)) => e,
            _ => return None,
        };
        match source {
            ProviderError::AuthExpired { provider } => Some(*provider),
            _ => None,
        }
    }
}
