//! # CLI Module
//!
//! The command layer of radiosync. Each command loads what it needs from the
//! settings, reports progress on the console, and terminates the process with
//! exit code 1 through [`crate::error!`] when it cannot finish.
//!
//! ## Commands
//!
//! - [`auth`] - Authorizes radiosync with a provider, or renews the authorization
//! - [`sync`] - Mirrors station playlists onto provider playlists
//! - [`status`] - Shows managed playlists, cached tracks and token state
//! - [`stations`] - Lists the built-in stations
//!
//! ## Usage Patterns
//!
//! ### Initial Setup
//! ```bash
//! radiosync auth deezer            # Authorize Deezer
//! radiosync auth tidal             # Authorize Tidal
//! ```
//!
//! ### Regular Usage
//! ```bash
//! radiosync sync                   # Every station onto every configured provider
//! radiosync sync --provider tidal  # Only Tidal
//! radiosync status                 # What radiosync manages
//! ```
//!
//! Runs are meant to be scheduled externally, e.g. with cron.

mod auth;
mod stations;
mod status;
mod sync;

pub use auth::auth;
pub use stations::stations;
pub use status::status;
pub use sync::sync;
