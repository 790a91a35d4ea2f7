use chrono::Utc;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Access and refresh token pair for one Spotify user.
///
/// `issued_at` is the UNIX timestamp (seconds) at which the access token was
/// issued. Credential updates go through [`Credentials::is_more_recent_than`]
/// so that a late-arriving refresh response can never clobber a newer token
/// obtained concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub issued_at: i64,
    pub expires_in: u64,
}

impl Credentials {
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            issued_at: Utc::now().timestamp(),
            expires_in,
        }
    }

    /// True if these credentials were issued strictly later than `other`.
    pub fn is_more_recent_than(&self, other: &Credentials) -> bool {
        self.issued_at > other.issued_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

impl UserProfile {
    /// Display name with the user id as fallback.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksInfo {
    pub total: u32,
}

/// Summary form of a remote playlist as returned by the listing, search and
/// single-playlist endpoints. `snapshot_id` is the concurrency version stamp
/// required by every mutating call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub images: Vec<Image>,
    pub tracks: PlaylistTracksInfo,
    pub snapshot_id: String,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRef {
    pub uri: String,
}

/// One entry of a playlist-items or saved-tracks page. `track` is null when
/// the referenced track has been removed upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEntry {
    pub track: Option<TrackRef>,
}

/// Cursor-paged envelope used by all Spotify listing endpoints. Items are
/// deserialized as options because some listings contain null placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingObject<T> {
    pub items: Vec<Option<T>>,
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPlaylistsResponse<T> {
    pub playlists: PagingObject<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackRef>,
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderTracksRequest {
    pub range_start: u32,
    pub insert_before: u32,
    pub range_length: u32,
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    pub scope: Option<String>,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub tracks: u32,
    pub owner: String,
    pub id: String,
}
