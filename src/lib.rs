//! Radio Station Playlist Mirror Library
//!
//! This library keeps streaming-service playlists in step with what radio
//! stations currently broadcast. Each run scrapes a station's public playlist
//! page, resolves every (title, artist) pair to a provider track through a
//! persistent search cache, and then replaces the content of a managed remote
//! playlist with the resolved tracks.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error types for every layer
//! - `management` - Persisted properties, tokens and the search cache
//! - `providers` - Deezer and Tidal API clients behind one capability trait
//! - `source` - Station registry and playlist page scraping
//! - `sync` - Track resolution, playlist reconciliation and the run orchestrator
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod providers;
pub mod source;
pub mod sync;
pub mod types;
pub mod utils;

/// A convenient Result type alias for the command layer.
///
/// Boxes any error so command implementations can mix the library's typed
/// errors with I/O or formatting failures.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Resolving {} tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Playlist {} synchronized", name);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the process with exit code 1. Only the command layer uses it;
/// library code returns errors instead.
///
/// # Example
///
/// ```
/// error!("Failed to open the store: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues such as an unmatched track or a failed scrape.
///
/// # Example
///
/// ```
/// warning!("No match for {}", mention);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
