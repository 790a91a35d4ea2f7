use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    cache::{CacheInvalidation, ExpiringCache},
    diff::reconcile,
    management::ShuffleError,
    spotify::SpotifyClient,
    types::{Image, Playlist},
};

/// The maximum number of tracks retrieved for any playlist during one
/// synchronization pass. Stricter than Spotify's own playlist size cap.
pub const PLAYLIST_TRACKS_HARD_LIMIT: usize = 2000;

/// Draw the move sequence of an in-place reshuffle of `total` tracks.
///
/// Step `i` moves the track currently at the returned position (drawn
/// uniformly from `[i, total)`) to the front of the playlist, so every
/// track is reordered exactly once. The sequence as a whole maps the drawn
/// choices bijectively onto permutations; the frequency test in the test
/// suite backs the uniformity claim empirically.
pub fn move_to_front_sequence<R: Rng + ?Sized>(total: u32, rng: &mut R) -> Vec<u32> {
    let mut moves = Vec::with_capacity(total as usize);
    for i in 0..total {
        moves.push(rng.random_range(i..total));
    }
    moves
}

/// One playlist of a user's library, with write access if the user owns it.
///
/// Metadata and the track listing are cached read-through; the metadata
/// cache cascades invalidation into the track cache because the tracks have
/// changed whenever the snapshot token did. Mutations chain the snapshot
/// token call by call and must not be issued concurrently for the same
/// playlist.
pub struct PlaylistHandle {
    api: Arc<SpotifyClient>,
    playlist_id: String,
    owner_id: String,
    mutable: bool,
    data: Arc<ExpiringCache<Playlist>>,
    track_uris: Arc<ExpiringCache<Vec<String>>>,
    /// Serializes all mutations of this playlist; each call needs the
    /// snapshot token of the previous one, so two concurrent mutators
    /// would corrupt each other's view.
    mutation_gate: Mutex<()>,
}

impl PlaylistHandle {
    /// Wrap a playlist. The provided snapshot seeds the metadata cache, so
    /// no extra fetch happens until it expires or is invalidated.
    pub async fn new(api: Arc<SpotifyClient>, playlist: Playlist, mutable: bool) -> Self {
        let playlist_id = playlist.id.clone();
        let owner_id = playlist.owner.id.clone();

        let data = {
            let api = Arc::clone(&api);
            let playlist_id = playlist_id.clone();
            Arc::new(ExpiringCache::new(Box::new(move || {
                let api = Arc::clone(&api);
                let playlist_id = playlist_id.clone();
                Box::pin(async move { api.playlist(&playlist_id).await })
            })))
        };
        data.set_data(playlist).await;

        let track_uris = {
            let api = Arc::clone(&api);
            let playlist_id = playlist_id.clone();
            Arc::new(
                ExpiringCache::new(Box::new(move || {
                    let api = Arc::clone(&api);
                    let playlist_id = playlist_id.clone();
                    Box::pin(async move {
                        api.playlist_track_uris(&playlist_id, PLAYLIST_TRACKS_HARD_LIMIT)
                            .await
                    })
                }))
                .stale_when(|uris: &Vec<String>| uris.is_empty()),
            )
        };
        data.add_dependent(Arc::clone(&track_uris) as Arc<dyn CacheInvalidation>);

        Self {
            api,
            playlist_id,
            owner_id,
            mutable,
            data,
            track_uris,
            mutation_gate: Mutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.playlist_id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// True if modifications can be made to this playlist.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    pub async fn data(&self) -> Result<Playlist, ShuffleError> {
        Ok(self.data.get_data(false).await?)
    }

    pub async fn name(&self) -> Result<String, ShuffleError> {
        Ok(self.data().await?.name)
    }

    pub async fn images(&self) -> Result<Vec<Image>, ShuffleError> {
        Ok(self.data().await?.images)
    }

    /// The playlist's track URIs, in playlist order, duplicates preserved.
    pub async fn track_uris(&self) -> Result<Vec<String>, ShuffleError> {
        Ok(self.track_uris.get_data(false).await?)
    }

    /// Apply a reconciliation edit to this playlist.
    ///
    /// Removals are applied before additions (the order the remote API
    /// requires), each in chunks of at most 100 tracks, chaining the
    /// snapshot token throughout. Afterwards both caches are invalidated so
    /// the next read observes the remote truth.
    pub async fn add_and_remove_tracks(
        &self,
        to_add: &[String],
        to_remove: &[String],
    ) -> Result<(), ShuffleError> {
        let _gate = self.mutation_gate.lock().await;
        self.apply_edit(to_add, to_remove).await
    }

    async fn apply_edit(&self, to_add: &[String], to_remove: &[String]) -> Result<(), ShuffleError> {
        self.verify_mutable()?;
        let mut snapshot = self.data().await?.snapshot_id;

        let mut changed = false;
        if !to_remove.is_empty() {
            snapshot = self
                .api
                .remove_tracks(&self.playlist_id, &snapshot, to_remove)
                .await?;
            changed = true;
        }
        if !to_add.is_empty() {
            self.api
                .add_tracks(&self.playlist_id, &snapshot, to_add)
                .await?;
            changed = true;
        }

        if changed {
            // cascades into the track cache
            self.data.invalidate().await;
        }
        Ok(())
    }

    /// Reshuffle the playlist into a random permutation in place.
    ///
    /// Only single-track moves are available remotely, so the reshuffle is
    /// a sequence of move-to-front calls, each feeding the returned
    /// snapshot token into the next. The calls are strictly sequential and
    /// the whole pass must not run concurrently with any other mutation of
    /// this playlist.
    pub async fn shuffle_in_place(&self) -> Result<(), ShuffleError> {
        let _gate = self.mutation_gate.lock().await;
        self.reshuffle().await
    }

    async fn reshuffle(&self) -> Result<(), ShuffleError> {
        self.verify_mutable()?;
        let playlist = self.data().await?;
        let total = playlist.tracks.total;
        let mut snapshot = playlist.snapshot_id;

        info!(
            "shuffling '{}' in place by reordering {} tracks",
            playlist.name, total
        );

        let moves = move_to_front_sequence(total, &mut rand::rng());
        for from_position in moves {
            snapshot = self
                .api
                .reorder_track(&self.playlist_id, from_position, 0, &snapshot)
                .await?;
        }

        self.data.invalidate().await;
        Ok(())
    }

    /// Make this playlist contain exactly `desired` (as a multiset) and
    /// reshuffle it.
    ///
    /// The desired list is diffed against the current tracks first, so
    /// tracks already present are left alone and the number of mutation
    /// calls stays minimal. If the reshuffle step fails, the playlist is
    /// left fully reconciled but unshuffled.
    pub async fn converge_and_shuffle(&self, desired: &[String]) -> Result<(), ShuffleError> {
        let _gate = self.mutation_gate.lock().await;

        let current = self.track_uris().await?;
        let diff = reconcile(&current, desired);

        info!(
            "updating playlist '{}' ({} tracks removed, {} tracks added)",
            self.playlist_id,
            diff.to_remove.len(),
            diff.to_add.len()
        );

        if !diff.is_empty() {
            self.apply_edit(&diff.to_add, &diff.to_remove).await?;
        }
        self.reshuffle().await
    }

    fn verify_mutable(&self) -> Result<(), ShuffleError> {
        if !self.mutable {
            return Err(ShuffleError::ImmutablePlaylist {
                playlist_id: self.playlist_id.clone(),
                owner_id: self.owner_id.clone(),
            });
        }
        Ok(())
    }
}
