//! Shuffle jobs and their status reporting.
//!
//! A job is one "synchronize and shuffle" unit of work for one user. Jobs
//! report progress through a [`JobStatusSink`] and finish in exactly one of
//! three terminal states: finished (converged and shuffled), skipped (a
//! precondition was not met, a deliberate no-op) or terminated (fatal
//! failure). Precondition checks run before any remote mutation; once the
//! reconciliation step has been applied it is never rolled back, so a
//! failure in the shuffle step leaves a fully reconciled, unshuffled
//! playlist behind.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    management::{PlaylistHandle, ShuffleError, UserLibrary},
    types::Image,
    users::ShuffleUser,
};

/// Suffix appended to the name of shuffled playlist copies.
pub const SHUFFLE_SUFFIX: &str = " - Shuffled";

/// Name of the playlist mirroring the user's liked songs.
pub const LIKED_SONGS_SHUFFLE: &str = "Liked Songs - Shuffled";

/// The states a shuffle job moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// The job has not started executing yet.
    Waiting,
    /// The job is currently executing.
    Executing,
    /// The job finished appropriately.
    Finished,
    /// A precondition was not met and the job deliberately did nothing.
    Skipped,
    /// The job hit a fatal failure.
    Terminated,
}

impl JobState {
    pub fn is_waiting(&self) -> bool {
        *self == JobState::Waiting
    }

    pub fn is_running(&self) -> bool {
        *self == JobState::Executing
    }

    /// True once the job reached a terminal state.
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            JobState::Finished | JobState::Skipped | JobState::Terminated
        )
    }
}

/// Name and artwork of a playlist involved in a job, for status displays.
#[derive(Debug, Clone)]
pub struct JobPlaylistInfo {
    pub name: String,
    pub images: Vec<Image>,
}

/// Continuously updated status of one shuffle job.
#[derive(Debug, Clone, Default)]
pub struct ShuffleJobStatus {
    pub state: JobState,
    pub message: Option<String>,
    /// Set when the job failed because the user revoked authorization;
    /// whoever holds the stored credentials should discard them.
    pub authorization_revoked: bool,
    pub source_playlist: Option<JobPlaylistInfo>,
    pub target_playlist: Option<JobPlaylistInfo>,
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Waiting
    }
}

/// Receiver of job status snapshots, one per transition.
pub trait JobStatusSink: Send + Sync {
    fn update(&self, status: &ShuffleJobStatus);
}

/// Sink that ignores all updates.
pub struct DiscardStatus;

impl JobStatusSink for DiscardStatus {
    fn update(&self, _status: &ShuffleJobStatus) {}
}

/// Shuffles one playlist of a user.
///
/// A playlist owned by the user is reshuffled in place. A playlist the user
/// merely follows cannot be mutated, so its tracks are converged into an
/// owned copy named after it (with [`SHUFFLE_SUFFIX`]) which is then
/// shuffled.
pub struct ShufflePlaylistJob {
    user: Arc<ShuffleUser>,
    playlist_id: String,
}

impl ShufflePlaylistJob {
    pub fn new(user: Arc<ShuffleUser>, playlist_id: String) -> Self {
        Self { user, playlist_id }
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }

    pub async fn execute(&self, sink: &dyn JobStatusSink) -> ShuffleJobStatus {
        let mut status = ShuffleJobStatus::default();
        status.state = JobState::Executing;
        sink.update(&status);

        let result = self.run(&mut status, sink).await;
        finish(&mut status, result);
        sink.update(&status);
        status
    }

    async fn run(
        &self,
        status: &mut ShuffleJobStatus,
        sink: &dyn JobStatusSink,
    ) -> Result<(), ShuffleError> {
        let playlist = self
            .user
            .library()
            .playlist_by_id(&self.playlist_id)
            .await
            .map_err(ShuffleError::from)?;

        if playlist.owner_id() == self.user.user_id() {
            self.shuffle_in_place(status, sink, &playlist).await
        } else {
            self.shuffle_copy(status, sink, &playlist).await
        }
    }

    async fn shuffle_in_place(
        &self,
        status: &mut ShuffleJobStatus,
        sink: &dyn JobStatusSink,
        playlist: &Arc<PlaylistHandle>,
    ) -> Result<(), ShuffleError> {
        let info = playlist_info(playlist).await?;
        status.source_playlist = Some(info.clone());
        status.target_playlist = Some(info);
        sink.update(status);

        playlist.shuffle_in_place().await?;

        status.target_playlist = Some(playlist_info(playlist).await?);
        Ok(())
    }

    async fn shuffle_copy(
        &self,
        status: &mut ShuffleJobStatus,
        sink: &dyn JobStatusSink,
        source: &Arc<PlaylistHandle>,
    ) -> Result<(), ShuffleError> {
        let source_name = source.name().await?;
        let mut name = source_name.clone();
        if !name.ends_with(SHUFFLE_SUFFIX) {
            name.push_str(SHUFFLE_SUFFIX);
        }

        info!("copying '{source_name}' to '{name}' before shuffling");
        status.source_playlist = Some(playlist_info(source).await?);
        sink.update(status);

        let description = format!("{source_name} reshuffled by sposhcli");
        let Some(target) =
            find_or_create_unique_playlist(self.user.library(), &name, &description, status)
                .await?
        else {
            return Ok(());
        };

        status.target_playlist = Some(playlist_info(&target).await?);
        sink.update(status);

        target
            .converge_and_shuffle(&source.track_uris().await?)
            .await?;

        status.target_playlist = Some(playlist_info(&target).await?);
        Ok(())
    }
}

/// Converges the user's liked songs into an owned playlist and shuffles it.
pub struct ShuffleLikedJob {
    user: Arc<ShuffleUser>,
}

impl ShuffleLikedJob {
    pub fn new(user: Arc<ShuffleUser>) -> Self {
        Self { user }
    }

    pub async fn execute(&self, sink: &dyn JobStatusSink) -> ShuffleJobStatus {
        let mut status = ShuffleJobStatus::default();
        status.state = JobState::Executing;
        sink.update(&status);

        let result = self.run(&mut status, sink).await;
        finish(&mut status, result);
        sink.update(&status);
        status
    }

    async fn run(
        &self,
        status: &mut ShuffleJobStatus,
        sink: &dyn JobStatusSink,
    ) -> Result<(), ShuffleError> {
        let library = self.user.library();

        status.source_playlist = Some(JobPlaylistInfo {
            name: LIKED_SONGS_SHUFFLE.to_string(),
            images: Vec::new(),
        });
        sink.update(status);

        let Some(target) = find_or_create_unique_playlist(
            library,
            LIKED_SONGS_SHUFFLE,
            "Liked songs reshuffled by sposhcli",
            status,
        )
        .await?
        else {
            return Ok(());
        };

        status.target_playlist = Some(playlist_info(&target).await?);
        sink.update(status);

        let liked = library
            .liked_track_uris()
            .await
            .map_err(ShuffleError::from)?;
        target.converge_and_shuffle(&liked).await?;

        status.target_playlist = Some(playlist_info(&target).await?);
        Ok(())
    }
}

fn finish(status: &mut ShuffleJobStatus, result: Result<(), ShuffleError>) {
    match result {
        Ok(()) => {
            if status.state == JobState::Executing {
                status.state = JobState::Finished;
            }
        }
        Err(e) => {
            warn!("shuffle job terminated: {e}");
            status.state = JobState::Terminated;
            status.authorization_revoked = e.is_authorization_revoked();
            status.message = Some(e.to_string());
        }
    }
}

/// Find the single playlist with the given name, or create it.
///
/// Returns `None` after marking the job skipped when two or more playlists
/// already carry the name, because the target would be ambiguous.
async fn find_or_create_unique_playlist(
    library: &UserLibrary,
    name: &str,
    description: &str,
    status: &mut ShuffleJobStatus,
) -> Result<Option<Arc<PlaylistHandle>>, ShuffleError> {
    let mut existing = library.playlists_by_name(name, true).await?;
    match existing.len() {
        0 => Ok(Some(library.create_playlist(name, description).await?)),
        1 => Ok(existing.pop()),
        _ => {
            status.state = JobState::Skipped;
            status.message = Some(format!(
                "multiple playlists exist already with the name '{name}'"
            ));
            Ok(None)
        }
    }
}

async fn playlist_info(playlist: &Arc<PlaylistHandle>) -> Result<JobPlaylistInfo, ShuffleError> {
    let data = playlist.data().await?;
    Ok(JobPlaylistInfo {
        name: data.name,
        images: data.images,
    })
}
