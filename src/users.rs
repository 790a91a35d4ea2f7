//! Registry of authorized users.
//!
//! Each authorized user gets one [`ShuffleUser`] wrapping their API client
//! and library. The registry is an explicit, constructor-injected object
//! owned by whoever bootstraps the process, never a global, so tests and
//! embedders can instantiate isolated instances.

use std::{collections::HashMap, sync::Arc};

use tracing::info;

use crate::{
    jobs::{ShuffleLikedJob, ShufflePlaylistJob},
    management::UserLibrary,
    requests::RequestError,
    spotify::SpotifyClient,
    types::{Credentials, UserProfile},
};

/// A Spotify user with an authorized API client and library access.
///
/// All of the user's playlist mutations funnel through the one client held
/// here, which serializes token refreshes; callers must additionally keep
/// mutations of a single playlist sequential.
pub struct ShuffleUser {
    api: Arc<SpotifyClient>,
    library: UserLibrary,
    profile: UserProfile,
}

impl ShuffleUser {
    /// Build a user from initial credentials, fetching their profile.
    pub async fn new(credentials: Credentials) -> Result<Arc<Self>, RequestError> {
        let api = Arc::new(SpotifyClient::new(credentials));
        let profile = api.current_user_profile().await?;
        let library = UserLibrary::new(Arc::clone(&api), profile.id.clone());
        Ok(Arc::new(Self {
            api,
            library,
            profile,
        }))
    }

    pub fn user_id(&self) -> &str {
        &self.profile.id
    }

    pub fn display_name(&self) -> &str {
        self.profile.name()
    }

    pub fn api(&self) -> &Arc<SpotifyClient> {
        &self.api
    }

    pub fn library(&self) -> &UserLibrary {
        &self.library
    }

    /// Job that shuffles one of the user's playlists.
    pub fn shuffle_playlist_job(self: &Arc<Self>, playlist_id: String) -> ShufflePlaylistJob {
        ShufflePlaylistJob::new(Arc::clone(self), playlist_id)
    }

    /// Job that converges and shuffles the user's liked songs.
    pub fn shuffle_liked_job(self: &Arc<Self>) -> ShuffleLikedJob {
        ShuffleLikedJob::new(Arc::clone(self))
    }
}

/// Maps external user identifiers to their in-process [`ShuffleUser`].
pub trait UserResolver: Send + Sync {
    fn resolve(&self, user_id: &str) -> Option<Arc<ShuffleUser>>;
}

/// In-memory registry of authorized users.
pub struct UserRegistry {
    users: std::sync::Mutex<HashMap<String, Arc<ShuffleUser>>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self {
            users: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Register a user from freshly issued credentials.
    ///
    /// If the user is already registered, the credentials are offered to
    /// the existing client (the recency gate decides whether they stick)
    /// and the existing instance is returned.
    pub async fn register(&self, credentials: Credentials) -> Result<Arc<ShuffleUser>, RequestError> {
        let user = ShuffleUser::new(credentials.clone()).await?;

        let mut users = self.lock();
        if let Some(existing) = users.get(user.user_id()) {
            existing.api().assign_credentials(credentials);
            return Ok(Arc::clone(existing));
        }

        info!("registered user {}", user.user_id());
        users.insert(user.user_id().to_string(), Arc::clone(&user));
        Ok(user)
    }

    /// Remove a user, e.g. after their authorization was revoked.
    pub fn deauthorize(&self, user_id: &str) -> Option<Arc<ShuffleUser>> {
        self.lock().remove(user_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<ShuffleUser>>> {
        self.users.lock().expect("user registry lock poisoned")
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UserResolver for UserRegistry {
    fn resolve(&self, user_id: &str) -> Option<Arc<ShuffleUser>> {
        self.lock().get(user_id).cloned()
    }
}
