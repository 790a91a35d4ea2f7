//! # Spotify Integration Module
//!
//! This module provides the interface to the Spotify Web API used by the
//! shuffle core: credential handling with safe refresh, and the full set of
//! playlist operations (fetch, list, search, create, bulk add/remove,
//! single-track reorder, saved-tracks listing). It abstracts away HTTP
//! communication, failure classification and rate limiting, and exposes a
//! clean async Rust interface to the higher layers.
//!
//! ## Architecture
//!
//! ```text
//! Application Layer (CLI, Jobs, Library)
//!          ↓
//! Spotify Integration Layer
//!     ├── Credential State (recency-gated token updates)
//!     ├── Token Refresh (serialized, debounced)
//!     └── Playlist Operations (list, search, mutate)
//!          ↓
//! Request Execution Layer (classification, retry, backoff)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## API Coverage
//!
//! - `GET /me` - profile of the authorized user
//! - `GET /me/playlists` - the user's playlists (paginated)
//! - `GET /me/tracks` - the user's saved tracks (paginated)
//! - `GET /playlists/{id}` - single playlist in summary form
//! - `GET /playlists/{id}/tracks` - playlist items (paginated)
//! - `GET /search?type=playlist` - exact-name playlist search
//! - `POST /users/{user_id}/playlists` - create a playlist
//! - `POST /playlists/{id}/tracks` - bulk add (≤100 per call)
//! - `DELETE /playlists/{id}/tracks` - bulk remove (≤100 per call)
//! - `PUT /playlists/{id}/tracks` - reorder a single track
//! - `POST /api/token` - refresh an access token
//!
//! Every mutating playlist call supplies the caller's last-known snapshot
//! token and yields the new one; callers must chain them and never issue
//! two mutations of the same playlist concurrently.
//!
//! ## Error Handling
//!
//! All operations return `Result` and go through the central request
//! executor: transient gateway errors and rate limits are resolved
//! internally, an expired access token triggers exactly one serialized
//! refresh, and fatal conditions surface as typed errors. A token refresh
//! response that is older than the credentials currently held is discarded
//! by the recency gate instead of clobbering them.

pub mod auth;
pub mod client;

pub use auth::TokenEndpointRefresher;
pub use client::SpotifyClient;
