//! Spotify True-Shuffle CLI Library
//!
//! This library keeps a remote Spotify playlist converged with a desired
//! track list and then reshuffles it into a genuinely random order, on top
//! of an API that is paginated, rate limited and only offers small
//! incremental mutation primitives.
//!
//! # Modules
//!
//! - `cache` - Time-boxed, invalidation-aware caching of remote data
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `diff` - Multiset reconciliation between current and desired tracks
//! - `jobs` - Shuffle jobs and their status reporting
//! - `management` - Per-playlist mutation surface and the user library index
//! - `paging` - Aggregation of cursor-based remote listings
//! - `requests` - Request execution, failure classification, retry policy
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `users` - Authorized user registry
//!
//! # Example
//!
//! ```
//! use sposhcli::{config, users::UserRegistry};
//!
//! #[tokio::main]
//! async fn main() -> sposhcli::Res<()> {
//!     config::load_env().await?;
//!     let registry = UserRegistry::new();
//!     // Register a user and run shuffle jobs...
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod diff;
pub mod jobs;
pub mod management;
pub mod paging;
pub mod requests;
pub mod spotify;
pub mod types;
pub mod users;

/// A convenient Result type alias for operations that may fail.
///
/// Provides a standard error handling pattern for the CLI and bootstrap
/// layers using a boxed dynamic error trait object. The core modules use
/// their own typed errors; this alias is for the outermost plumbing where
/// flexibility beats precision.
///
/// # Type Parameters
///
/// - `T` - The success type returned on successful operations
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Example
///
/// ```
/// info!("Resolving playlist...");
/// info!("Found {} playlists", count);
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
/// Creates a formatted output line with a green "✓" indicator to signify
/// successful completion of operations.
///
/// # Example
///
/// ```
/// success!("Playlist shuffled");
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
/// Creates a formatted error output with a red "!" indicator and immediately
/// terminates the program with exit code 1. Used for unrecoverable errors
/// that require immediate program termination.
///
/// # Behavior
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It should only be used for fatal errors where
/// recovery is not possible.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
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
/// Creates a formatted output line with a yellow "!" indicator to highlight
/// potential issues or important notices that don't require program
/// termination.
///
/// # Example
///
/// ```
/// warning!("Credentials file not found, will create new one");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
