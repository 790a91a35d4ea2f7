use std::sync::Arc;

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config,
    paging::{self, NullPolicy, Page, PageCursor, PageLoader},
    requests::{ApiFailure, RequestError, RequestExecutor},
    spotify::auth::{AuthState, TokenEndpointRefresher},
    types::{
        AddTracksRequest, CreatePlaylistRequest, PagingObject, Playlist, RemoveTracksRequest,
        ReorderTracksRequest, SearchPlaylistsResponse, SnapshotResponse, TrackEntry, TrackRef,
        UserProfile,
    },
};

/// The maximum number of tracks a regular Spotify playlist can have.
pub const MAXIMUM_PLAYLIST_SIZE: usize = 10_000;

/// Size limit Spotify imposes on one bulk add/remove call.
pub const MUTATION_CHUNK: usize = 100;

/// Client for the Spotify Web API, bound to one authorized user.
///
/// The client is mostly stateless; the only mutable state is the credential
/// pair, which is updated through the recency gate when a refresh happens.
/// All calls run through the request executor, so transient failures, rate
/// limits and token expiry are handled before a result surfaces. Methods
/// that aggregate listings take `self: &Arc<Self>` because their page
/// loaders outlive the borrow.
pub struct SpotifyClient {
    http: Client,
    auth: Arc<AuthState>,
    executor: RequestExecutor,
}

impl SpotifyClient {
    pub fn new(credentials: crate::types::Credentials) -> Self {
        let http = Client::new();
        let auth = Arc::new(AuthState::new(credentials));
        let refresher = Arc::new(TokenEndpointRefresher::new(http.clone(), Arc::clone(&auth)));
        Self {
            http,
            auth,
            executor: RequestExecutor::new(Some(refresher)),
        }
    }

    /// Update the client's credentials unless the held ones are more recent.
    pub fn assign_credentials(&self, credentials: crate::types::Credentials) -> bool {
        self.auth.assign(credentials)
    }

    /// Snapshot of the credentials currently in use.
    pub fn credentials(&self) -> crate::types::Credentials {
        self.auth.credentials()
    }

    /// Fetch the profile of the user these credentials belong to.
    pub async fn current_user_profile(&self) -> Result<UserProfile, RequestError> {
        let url = format!("{}/me", config::spotify_apiurl());
        self.executor
            .execute(|| self.send_json::<UserProfile>(Method::GET, url.clone(), None))
            .await
    }

    /// Fetch a single playlist in summary form.
    pub async fn playlist(&self, playlist_id: &str) -> Result<Playlist, RequestError> {
        let url = format!("{}/playlists/{playlist_id}", config::spotify_apiurl());
        self.executor
            .execute(|| self.send_json::<Playlist>(Method::GET, url.clone(), None))
            .await
    }

    /// List the user's playlists, most recently touched first, up to
    /// `hard_limit` of them.
    pub async fn user_playlists(
        self: &Arc<Self>,
        hard_limit: usize,
    ) -> Result<Vec<Playlist>, RequestError> {
        let api = Arc::clone(self);
        let loader: PageLoader<Playlist> = Arc::new(move |offset, limit| {
            let api = Arc::clone(&api);
            Box::pin(async move {
                let url = format!(
                    "{}/me/playlists?offset={offset}&limit={limit}",
                    config::spotify_apiurl()
                );
                let page: PagingObject<Playlist> = api
                    .executor
                    .execute(|| api.send_json(Method::GET, url.clone(), None))
                    .await?;
                Ok(page_of(page))
            })
        });
        paging::aggregate(PageCursor::new(loader), hard_limit, NullPolicy::Deny).await
    }

    /// Search the user's visible playlists for an exact name match,
    /// returning at most `hard_limit` results.
    pub async fn search_playlists_by_exact_name(
        self: &Arc<Self>,
        name: &str,
        hard_limit: usize,
    ) -> Result<Vec<Playlist>, RequestError> {
        let api = Arc::clone(self);
        let query = format!("\"{name}\"");
        let loader: PageLoader<Playlist> = Arc::new(move |offset, limit| {
            let api = Arc::clone(&api);
            let query = query.clone();
            Box::pin(async move {
                let url = search_url(&query, offset, limit)?;
                let response: SearchPlaylistsResponse<Playlist> = api
                    .executor
                    .execute(|| api.send_json(Method::GET, url.clone(), None))
                    .await?;
                Ok(page_of(response.playlists))
            })
        });

        let mut results =
            paging::aggregate(PageCursor::new(loader), hard_limit, NullPolicy::Deny).await?;
        // the quoted query is only a phrase match, narrow it down to exact
        results.retain(|playlist| playlist.name == name);
        Ok(results)
    }

    /// List the URIs of the user's saved (liked) tracks. Ghost entries of
    /// tracks deleted upstream are filtered out.
    pub async fn saved_track_uris(
        self: &Arc<Self>,
        hard_limit: usize,
    ) -> Result<Vec<String>, RequestError> {
        let api = Arc::clone(self);
        let loader: PageLoader<String> = Arc::new(move |offset, limit| {
            let api = Arc::clone(&api);
            Box::pin(async move {
                let url = format!(
                    "{}/me/tracks?offset={offset}&limit={limit}",
                    config::spotify_apiurl()
                );
                let page: PagingObject<TrackEntry> = api
                    .executor
                    .execute(|| api.send_json(Method::GET, url.clone(), None))
                    .await?;
                Ok(uri_page_of(page))
            })
        });
        paging::aggregate(PageCursor::new(loader), hard_limit, NullPolicy::Allow).await
    }

    /// List the track URIs of a playlist, in playlist order. Ghost entries
    /// of tracks deleted upstream are filtered out.
    pub async fn playlist_track_uris(
        self: &Arc<Self>,
        playlist_id: &str,
        hard_limit: usize,
    ) -> Result<Vec<String>, RequestError> {
        let hard_limit = hard_limit.min(MAXIMUM_PLAYLIST_SIZE);
        let api = Arc::clone(self);
        let playlist_id = playlist_id.to_string();
        let loader: PageLoader<String> = Arc::new(move |offset, limit| {
            let api = Arc::clone(&api);
            let playlist_id = playlist_id.clone();
            Box::pin(async move {
                let url = format!(
                    "{}/playlists/{playlist_id}/tracks?offset={offset}&limit={limit}",
                    config::spotify_apiurl()
                );
                let page: PagingObject<TrackEntry> = api
                    .executor
                    .execute(|| api.send_json(Method::GET, url.clone(), None))
                    .await?;
                Ok(uri_page_of(page))
            })
        });
        paging::aggregate(PageCursor::new(loader), hard_limit, NullPolicy::Allow).await
    }

    /// Add tracks to a playlist in chunks of at most [`MUTATION_CHUNK`],
    /// chaining the snapshot token through every call. Returns the final
    /// snapshot token.
    pub async fn add_tracks(
        &self,
        playlist_id: &str,
        snapshot: &str,
        uris: &[String],
    ) -> Result<String, RequestError> {
        let url = format!(
            "{}/playlists/{playlist_id}/tracks",
            config::spotify_apiurl()
        );
        let mut snapshot = snapshot.to_string();
        for chunk in uris.chunks(MUTATION_CHUNK) {
            let body = to_body(&AddTracksRequest {
                uris: chunk.to_vec(),
                snapshot_id: snapshot.clone(),
            })?;
            let response: SnapshotResponse = self
                .executor
                .execute(|| self.send_json(Method::POST, url.clone(), Some(body.clone())))
                .await?;
            snapshot = response.snapshot_id;
        }
        Ok(snapshot)
    }

    /// Remove tracks from a playlist in chunks of at most
    /// [`MUTATION_CHUNK`], chaining the snapshot token through every call.
    /// Returns the final snapshot token.
    pub async fn remove_tracks(
        &self,
        playlist_id: &str,
        snapshot: &str,
        uris: &[String],
    ) -> Result<String, RequestError> {
        let url = format!(
            "{}/playlists/{playlist_id}/tracks",
            config::spotify_apiurl()
        );
        let mut snapshot = snapshot.to_string();
        for chunk in uris.chunks(MUTATION_CHUNK) {
            let body = to_body(&RemoveTracksRequest {
                tracks: chunk
                    .iter()
                    .map(|uri| TrackRef { uri: uri.clone() })
                    .collect(),
                snapshot_id: snapshot.clone(),
            })?;
            let response: SnapshotResponse = self
                .executor
                .execute(|| self.send_json(Method::DELETE, url.clone(), Some(body.clone())))
                .await?;
            snapshot = response.snapshot_id;
        }
        Ok(snapshot)
    }

    /// Move the track at `from_position` so it ends up before
    /// `insert_before`. Spotify only reorders ranges; a range length of 1
    /// makes it a single-track move. Returns the new snapshot token.
    pub async fn reorder_track(
        &self,
        playlist_id: &str,
        from_position: u32,
        insert_before: u32,
        snapshot: &str,
    ) -> Result<String, RequestError> {
        let url = format!(
            "{}/playlists/{playlist_id}/tracks",
            config::spotify_apiurl()
        );
        let body = to_body(&ReorderTracksRequest {
            range_start: from_position,
            insert_before,
            range_length: 1,
            snapshot_id: snapshot.to_string(),
        })?;
        let response: SnapshotResponse = self
            .executor
            .execute(|| self.send_json(Method::PUT, url.clone(), Some(body.clone())))
            .await?;
        Ok(response.snapshot_id)
    }

    /// Create a new public, non-collaborative playlist for the user.
    pub async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist, RequestError> {
        let url = format!("{}/users/{user_id}/playlists", config::spotify_apiurl());
        let body = to_body(&CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: true,
            collaborative: false,
        })?;
        self.executor
            .execute(|| self.send_json(Method::POST, url.clone(), Some(body.clone())))
            .await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiFailure> {
        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(self.auth.access_token());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok());
            let detail = response.text().await.unwrap_or_default();
            debug!("request to {url} rejected with status {status}");
            return Err(ApiFailure::classify(
                status,
                retry_after,
                format!("{url}: {detail}"),
            ));
        }

        Ok(response.json::<T>().await?)
    }
}

fn page_of<T>(page: PagingObject<T>) -> Page<T> {
    Page {
        has_next: page.next.is_some(),
        items: page.items,
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }
}

fn uri_page_of(page: PagingObject<TrackEntry>) -> Page<String> {
    Page {
        has_next: page.next.is_some(),
        items: page
            .items
            .into_iter()
            .map(|entry| entry.and_then(|e| e.track).map(|track| track.uri))
            .collect(),
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }
}

fn search_url(query: &str, offset: u32, limit: u32) -> Result<String, RequestError> {
    let url = Url::parse_with_params(
        &format!("{}/search", config::spotify_apiurl()),
        &[
            ("q", query),
            ("type", "playlist"),
            ("offset", &offset.to_string()),
            ("limit", &limit.to_string()),
        ],
    )
    .map_err(|e| RequestError::Fatal(format!("could not build search url: {e}")))?;
    Ok(url.into())
}

fn to_body<T: serde::Serialize>(request: &T) -> Result<serde_json::Value, RequestError> {
    serde_json::to_value(request)
        .map_err(|e| RequestError::Fatal(format!("could not encode request body: {e}")))
}
