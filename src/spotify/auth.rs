use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{
    config,
    requests::{RequestError, TokenRefresher},
    types::{Credentials, RefreshTokenResponse},
};

/// Cap on the refresh debounce window: a token accepted less than
/// `min(expires_in, 300)` seconds ago is considered fresh and further
/// refresh attempts are skipped.
const REFRESH_DEBOUNCE_CAP_SECONDS: u64 = 300;

struct AuthInner {
    credentials: Credentials,
    fresh_until: Option<Instant>,
}

/// Shared credential state of one authorized user.
///
/// Updates go through [`AuthState::assign`], which rejects credentials that
/// are older than the ones currently held. This keeps a slow refresh
/// response from overwriting a newer token that was obtained concurrently.
pub struct AuthState {
    inner: Mutex<AuthInner>,
}

impl AuthState {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(AuthInner {
                credentials,
                fresh_until: None,
            }),
        }
    }

    pub fn access_token(&self) -> String {
        self.lock().credentials.access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.lock().credentials.refresh_token.clone()
    }

    pub fn credentials(&self) -> Credentials {
        self.lock().credentials.clone()
    }

    /// Update the held credentials unless the current ones are more recent.
    ///
    /// When the incoming credentials carry no refresh token the previous
    /// one is kept, matching Spotify's optional refresh-token rotation.
    /// Returns whether the update was accepted.
    pub fn assign(&self, new: Credentials) -> bool {
        let mut inner = self.lock();
        if inner.credentials.is_more_recent_than(&new) {
            return false;
        }

        let refresh_token = new
            .refresh_token
            .or_else(|| inner.credentials.refresh_token.clone());
        let debounce = new.expires_in.min(REFRESH_DEBOUNCE_CAP_SECONDS);
        inner.credentials = Credentials {
            refresh_token,
            ..new
        };
        inner.fresh_until = Some(Instant::now() + Duration::from_secs(debounce));
        true
    }

    /// True while the debounce window of the last accepted update is open.
    pub fn recently_refreshed(&self) -> bool {
        self.lock()
            .fresh_until
            .is_some_and(|until| Instant::now() < until)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AuthInner> {
        self.inner.lock().expect("auth state lock poisoned")
    }
}

/// Refreshes an access token against the Spotify token endpoint.
///
/// The refresh request goes straight to the token endpoint rather than
/// through the request executor: a refresh triggered from inside the
/// executor's recovery path must never be able to trigger another refresh.
/// Any rejection is fatal.
pub struct TokenEndpointRefresher {
    http: Client,
    auth: Arc<AuthState>,
}

impl TokenEndpointRefresher {
    pub fn new(http: Client, auth: Arc<AuthState>) -> Self {
        Self { http, auth }
    }
}

#[async_trait]
impl TokenRefresher for TokenEndpointRefresher {
    async fn refresh_access_token(&self) -> Result<(), RequestError> {
        if self.auth.recently_refreshed() {
            debug!("skipping token refresh, credentials were refreshed recently");
            return Ok(());
        }

        let Some(refresh_token) = self.auth.refresh_token() else {
            return Err(RequestError::Fatal(
                "could not refresh credentials, there is no refresh token".to_string(),
            ));
        };

        let response = self
            .http
            .post(config::spotify_apitoken_url())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &refresh_token),
                ("client_id", &config::spotify_client_id()),
            ])
            .send()
            .await
            .map_err(|e| RequestError::Fatal(format!("token refresh transport failure: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Fatal(format!(
                "token refresh rejected with status {status}"
            )));
        }

        let body: RefreshTokenResponse = response
            .json()
            .await
            .map_err(|e| RequestError::Fatal(format!("malformed token refresh response: {e}")))?;

        let accepted = self.auth.assign(Credentials::new(
            body.access_token,
            body.refresh_token,
            body.expires_in,
        ));
        if accepted {
            info!("access token refreshed");
        } else {
            debug!("token refresh response discarded, held credentials are newer");
        }
        Ok(())
    }
}
