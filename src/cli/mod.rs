//! # CLI Module
//!
//! This module provides the command-line interface layer: it implements all
//! user-facing commands and coordinates between the stored credentials, the
//! user registry and the shuffle jobs.
//!
//! ## Command Categories
//!
//! ### Playlist Operations
//!
//! - [`list_playlists`] - Displays the user's playlists as a table
//! - [`shuffle`] - Shuffles one playlist, resolved by id or exact name
//! - [`shuffle_liked`] - Converges and shuffles the user's liked songs
//!
//! ## Data Flow
//!
//! 1. **Credentials**: Load the stored access/refresh token pair
//! 2. **Registration**: Register the user with an isolated registry
//! 3. **Job Execution**: Run the shuffle job, streaming status updates
//! 4. **Persistence**: Write back credentials refreshed along the way
//!
//! Authentication itself (the authorization-code flow producing the first
//! token pair) is external; the CLI expects its output in the credentials
//! file and refreshes tokens from there on.

mod playlists;
mod shuffle;

use std::sync::{Arc, Mutex};

use crate::{
    error,
    jobs::{JobState, JobStatusSink, ShuffleJobStatus},
    management::CredentialsStore,
    success,
    users::{ShuffleUser, UserRegistry},
    warning,
};

pub use playlists::list_playlists;
pub use shuffle::shuffle;
pub use shuffle::shuffle_liked;

/// Load stored credentials and register the user with the registry.
///
/// Exits the process with a helpful message when no usable credentials are
/// found or Spotify rejects them.
pub(crate) async fn authorized_user(registry: &UserRegistry) -> Arc<ShuffleUser> {
    let store = match CredentialsStore::load().await {
        Ok(store) => store,
        Err(e) => {
            error!(
                "Failed to load credentials. Authorize externally and place the token pair at {}\n Error: {}",
                crate::config::credentials_path().display(),
                e
            );
        }
    };

    match registry.register(store.credentials().clone()).await {
        Ok(user) => user,
        Err(e) => {
            error!("Failed to authorize with Spotify: {}", e);
        }
    }
}

/// Write the user's possibly-refreshed credentials back to disk.
pub(crate) async fn persist_credentials(user: &ShuffleUser) {
    let store = CredentialsStore::new(user.api().credentials());
    if let Err(e) = store.persist().await {
        warning!("Failed to persist refreshed credentials: {}", e);
    }
}

/// Prints job state transitions as they happen.
pub(crate) struct PrintStatus {
    last: Mutex<Option<JobState>>,
}

impl PrintStatus {
    pub(crate) fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }
}

impl JobStatusSink for PrintStatus {
    fn update(&self, status: &ShuffleJobStatus) {
        let mut last = self.last.lock().expect("status lock poisoned");
        if *last == Some(status.state) {
            return;
        }
        *last = Some(status.state);

        if status.state == JobState::Executing {
            match &status.target_playlist {
                Some(target) => crate::info!("Shuffling into '{}'...", target.name),
                None => crate::info!("Shuffling..."),
            }
        }
    }
}

/// Print the terminal status of a job and exit non-zero on failure.
pub(crate) fn report(registry: &UserRegistry, user: &ShuffleUser, status: &ShuffleJobStatus) {
    if status.authorization_revoked {
        registry.deauthorize(user.user_id());
        warning!("Authorization was revoked, stored credentials are no longer valid.");
    }

    match status.state {
        JobState::Finished => {
            let name = status
                .target_playlist
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or("playlist");
            success!("Shuffled '{}'", name);
        }
        JobState::Skipped => {
            warning!(
                "Shuffle skipped: {}",
                status.message.as_deref().unwrap_or("precondition not met")
            );
        }
        _ => {
            error!(
                "Shuffle terminated: {}",
                status.message.as_deref().unwrap_or("unexpected error")
            );
        }
    }
}
