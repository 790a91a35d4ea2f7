//! High-level management of a user's remote playlist data.
//!
//! Builds on the request, paging and cache layers to expose a per-playlist
//! mutation surface ([`PlaylistHandle`]), an indexed view of the user's
//! library ([`UserLibrary`]), and the stored-credentials plumbing used by
//! the CLI ([`CredentialsStore`]).

mod credentials;
mod library;
mod playlist;

use thiserror::Error;

pub use credentials::CredentialsStore;
pub use library::{LIBRARY_INDEX_LIMIT, NAME_SEARCH_LIMIT, UserLibrary};
pub use playlist::{PLAYLIST_TRACKS_HARD_LIMIT, PlaylistHandle, move_to_front_sequence};

use crate::requests::RequestError;

/// Failure of a playlist-level operation.
#[derive(Debug, Error)]
pub enum ShuffleError {
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The playlist belongs to someone else and cannot be mutated through
    /// this user's library.
    #[error("playlist {playlist_id} from {owner_id} is immutable")]
    ImmutablePlaylist {
        playlist_id: String,
        owner_id: String,
    },
}

impl ShuffleError {
    /// True if the underlying cause was a revoked authorization; callers
    /// should drop the user's stored credentials then.
    pub fn is_authorization_revoked(&self) -> bool {
        matches!(
            self,
            ShuffleError::Request(RequestError::AuthorizationRevoked(_))
        )
    }
}
