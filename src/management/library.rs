use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::{
    cache::ExpiringCache,
    management::playlist::PlaylistHandle,
    requests::RequestError,
    spotify::{SpotifyClient, client::MAXIMUM_PLAYLIST_SIZE},
    types::Playlist,
};

/// Number of playlists pulled from the listing when the index is built.
pub const LIBRARY_INDEX_LIMIT: usize = 128;

/// Bound on remote exact-name search results.
pub const NAME_SEARCH_LIMIT: usize = 4;

/// A Spotify user's library: liked tracks plus an indexed view of their
/// playlists.
///
/// Both the index and the liked-tracks listing are read-through cached.
/// The index itself answers id lookups with a lazy single-playlist fetch
/// on miss and name lookups with a bounded remote search on miss.
pub struct UserLibrary {
    api: Arc<SpotifyClient>,
    user_id: String,
    liked_track_uris: ExpiringCache<Vec<String>>,
    index: ExpiringCache<Arc<PlaylistIndex>>,
}

impl UserLibrary {
    pub fn new(api: Arc<SpotifyClient>, user_id: String) -> Self {
        let liked_track_uris = {
            let api = Arc::clone(&api);
            ExpiringCache::new(Box::new(move || {
                let api = Arc::clone(&api);
                Box::pin(async move { api.saved_track_uris(MAXIMUM_PLAYLIST_SIZE).await })
            }))
            .stale_when(|uris: &Vec<String>| uris.is_empty())
        };

        let index = {
            let api = Arc::clone(&api);
            let user_id = user_id.clone();
            ExpiringCache::new(Box::new(move || {
                let api = Arc::clone(&api);
                let user_id = user_id.clone();
                Box::pin(async move { PlaylistIndex::build(api, user_id).await })
            }))
        };

        Self {
            api,
            user_id,
            liked_track_uris,
            index,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// URIs of the user's saved (liked) tracks.
    pub async fn liked_track_uris(&self) -> Result<Vec<String>, RequestError> {
        self.liked_track_uris.get_data(false).await
    }

    /// The most recently played/created playlists, up to `limit` of them.
    pub async fn most_recent_playlists(&self, limit: usize) -> Result<Vec<Playlist>, RequestError> {
        Ok(self.index().await?.most_recent(limit))
    }

    /// Retrieve a playlist by its unique identifier. Playlists missing from
    /// the indexed listing are fetched individually.
    pub async fn playlist_by_id(
        &self,
        playlist_id: &str,
    ) -> Result<Arc<PlaylistHandle>, RequestError> {
        self.index().await?.by_id(playlist_id).await
    }

    /// Retrieve playlists by exact name, optionally only those owned by
    /// this user. Name lookups are cached; a playlist renamed remotely is
    /// not re-resolved until the whole index expires or is invalidated.
    pub async fn playlists_by_name(
        &self,
        name: &str,
        owned_only: bool,
    ) -> Result<Vec<Arc<PlaylistHandle>>, RequestError> {
        let mut handles = self.index().await?.by_name(name).await?;
        if owned_only {
            handles.retain(|handle| handle.owner_id() == self.user_id);
        }
        Ok(handles)
    }

    /// Create a new playlist and make it immediately visible at the front
    /// of the index, without another remote round-trip.
    pub async fn create_playlist(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Arc<PlaylistHandle>, RequestError> {
        let playlist = self
            .api
            .create_playlist(&self.user_id, name, description)
            .await?;
        self.index().await?.insert_front(playlist).await
    }

    /// Whether this library's user owns the given playlist.
    pub fn is_owner(&self, playlist: &Playlist) -> bool {
        playlist.owner.id == self.user_id
    }

    /// Drop the cached index and liked tracks; the next access rebuilds
    /// them from the remote listing.
    pub async fn invalidate(&self) {
        self.index.invalidate().await;
        self.liked_track_uris.invalidate().await;
    }

    async fn index(&self) -> Result<Arc<PlaylistIndex>, RequestError> {
        self.index.get_data(false).await
    }
}

struct IndexInner {
    /// Listing order of the remote playlists, front = most recently touched.
    listing: Vec<Playlist>,
    by_id: HashMap<String, Arc<PlaylistHandle>>,
    by_name: HashMap<String, Vec<Arc<PlaylistHandle>>>,
}

/// Lookup structure over the user's playlist listing.
///
/// The search-by-name results are only resolved once per name and may grow
/// inconsistent with remote renames; that staleness is accepted until the
/// index is rebuilt.
struct PlaylistIndex {
    api: Arc<SpotifyClient>,
    user_id: String,
    inner: std::sync::Mutex<IndexInner>,
}

impl PlaylistIndex {
    async fn build(api: Arc<SpotifyClient>, user_id: String) -> Result<Arc<Self>, RequestError> {
        let listing = api.user_playlists(LIBRARY_INDEX_LIMIT).await?;
        debug!(
            "indexing {} playlists for user {}",
            listing.len(),
            user_id
        );

        let mut by_id = HashMap::new();
        let mut by_name: HashMap<String, Vec<Arc<PlaylistHandle>>> = HashMap::new();
        for playlist in &listing {
            let mutable = playlist.owner.id == user_id;
            let handle =
                Arc::new(PlaylistHandle::new(Arc::clone(&api), playlist.clone(), mutable).await);
            by_id.insert(playlist.id.clone(), Arc::clone(&handle));
            by_name
                .entry(playlist.name.clone())
                .or_default()
                .push(handle);
        }

        Ok(Arc::new(Self {
            api,
            user_id,
            inner: std::sync::Mutex::new(IndexInner {
                listing,
                by_id,
                by_name,
            }),
        }))
    }

    fn most_recent(&self, limit: usize) -> Vec<Playlist> {
        let inner = self.lock();
        inner.listing[..limit.min(inner.listing.len())].to_vec()
    }

    async fn by_id(&self, playlist_id: &str) -> Result<Arc<PlaylistHandle>, RequestError> {
        if let Some(handle) = self.lock().by_id.get(playlist_id) {
            return Ok(Arc::clone(handle));
        }
        let playlist = self.api.playlist(playlist_id).await?;
        self.insert_front(playlist).await
    }

    async fn by_name(&self, name: &str) -> Result<Vec<Arc<PlaylistHandle>>, RequestError> {
        if let Some(handles) = self.lock().by_name.get(name) {
            return Ok(handles.clone());
        }

        let found = self
            .api
            .search_playlists_by_exact_name(name, NAME_SEARCH_LIMIT)
            .await?;
        let mut handles = Vec::with_capacity(found.len());
        for playlist in found {
            handles.push(self.insert_front(playlist).await?);
        }

        // cache the result under the queried name, even when empty
        self.lock().by_name.insert(name.to_string(), handles.clone());
        Ok(handles)
    }

    /// Insert a playlist at the front of the listing and both maps. An
    /// already indexed playlist is returned as-is.
    async fn insert_front(&self, playlist: Playlist) -> Result<Arc<PlaylistHandle>, RequestError> {
        if let Some(handle) = self.lock().by_id.get(&playlist.id) {
            return Ok(Arc::clone(handle));
        }

        let mutable = playlist.owner.id == self.user_id;
        let handle = Arc::new(
            PlaylistHandle::new(Arc::clone(&self.api), playlist.clone(), mutable).await,
        );

        let mut inner = self.lock();
        // re-check, another task may have inserted it while we built the handle
        if let Some(existing) = inner.by_id.get(&playlist.id) {
            return Ok(Arc::clone(existing));
        }
        inner.listing.insert(0, playlist.clone());
        inner.by_id.insert(playlist.id.clone(), Arc::clone(&handle));
        inner
            .by_name
            .entry(playlist.name)
            .or_default()
            .insert(0, Arc::clone(&handle));
        Ok(handle)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexInner> {
        self.inner.lock().expect("playlist index lock poisoned")
    }
}
