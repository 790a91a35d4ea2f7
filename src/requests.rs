//! Request execution against the Spotify Web API.
//!
//! Every remote call in this crate funnels through [`RequestExecutor`],
//! which classifies failures and applies a deterministic recovery policy:
//! transient gateway errors are retried with exponential backoff, rate
//! limits wait out the server-suggested delay, an expired access token is
//! refreshed exactly once, and everything else terminates the call with a
//! typed fatal error.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// The maximum number of retries before a single request is considered a
/// lost cause. Only retryable transient failures consume this budget.
pub const MAX_RETRIES: u32 = 8;

/// Lower clamp on any computed wait between attempts.
pub const MIN_WAIT: Duration = Duration::from_secs(1);

/// Upper clamp on any computed wait between attempts.
pub const MAX_WAIT: Duration = Duration::from_secs(300);

/// A classified failure of one remote call.
///
/// Client methods produce these from HTTP status codes via
/// [`ApiFailure::classify`]; the executor consumes them to decide between
/// retrying, slowing down, refreshing the token or giving up.
#[derive(Debug, Error)]
pub enum ApiFailure {
    /// The request could not be understood by the server (a client bug).
    #[error("malformed request: {0}")]
    BadRequest(String),

    /// The resource does not exist or is not visible to this user.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The server refuses to fulfill the request; with Spotify this means
    /// our authorization may have been revoked entirely.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An internal server error that a retry is unlikely to fix.
    #[error("internal server error: {0}")]
    ServerError(String),

    /// A transient gateway or availability problem worth retrying shortly.
    #[error("transient remote failure: {0}")]
    RetryShortly(String),

    /// The rate limiter kicked in; the server suggests waiting this many
    /// seconds before the next request.
    #[error("rate limited, asked to wait {0}s")]
    RateLimited(u64),

    /// The access token expired and must be refreshed.
    #[error("access token expired: {0}")]
    TokenExpired(String),

    /// Local I/O or response decoding failed. Treated as an environment
    /// fault, not a remote fault, and never retried.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Anything the classification table does not cover.
    #[error("{0}")]
    Other(String),
}

impl ApiFailure {
    /// Map an HTTP error status to a failure class.
    ///
    /// `retry_after` is the parsed `Retry-After` header in seconds, if the
    /// response carried one. `detail` ends up in the failure message.
    pub fn classify(status: StatusCode, retry_after: Option<u64>, detail: String) -> ApiFailure {
        match status {
            StatusCode::BAD_REQUEST => ApiFailure::BadRequest(detail),
            StatusCode::UNAUTHORIZED => ApiFailure::TokenExpired(detail),
            StatusCode::FORBIDDEN => ApiFailure::Forbidden(detail),
            StatusCode::NOT_FOUND => ApiFailure::NotFound(detail),
            StatusCode::TOO_MANY_REQUESTS => ApiFailure::RateLimited(retry_after.unwrap_or(1)),
            StatusCode::INTERNAL_SERVER_ERROR => ApiFailure::ServerError(detail),
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
                ApiFailure::RetryShortly(detail)
            }
            _ => ApiFailure::Other(format!("unexpected status {status}: {detail}")),
        }
    }
}

/// Terminal outcome of an executed request.
///
/// Transient conditions are resolved inside the executor and never surface;
/// what comes out is either the value or one of these two fatal kinds.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request is deemed to never succeed; retrying is pointless.
    #[error("request failed: {0}")]
    Fatal(String),

    /// The user revoked this application's authorization. Callers should
    /// discard any stored credentials for the user.
    #[error("authorization revoked: {0}")]
    AuthorizationRevoked(String),
}

impl RequestError {
    pub fn is_authorization_revoked(&self) -> bool {
        matches!(self, RequestError::AuthorizationRevoked(_))
    }
}

/// Callback interface for refreshing an expired access token.
///
/// Implementers must tolerate being called multiple times in quick
/// succession (the executor serializes the calls, but several waiting
/// requests may each trigger one) and should early-return when the token
/// was already refreshed recently. Implementations must not issue calls
/// that themselves require a valid access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_access_token(&self) -> Result<(), RequestError>;
}

/// Executes remote calls under the retry/backoff/refresh policy.
///
/// The executor is cheap to share behind an `Arc` and keeps no per-call
/// state; the single piece of shared state is the mutex serializing token
/// refreshes so that concurrent unauthorized requests cannot stampede the
/// token endpoint.
pub struct RequestExecutor {
    refresher: Option<Arc<dyn TokenRefresher>>,
    refresh_gate: Mutex<()>,
}

impl RequestExecutor {
    /// Create a new executor with an optional refresher. Without one, a
    /// request hitting an expired token fails fatally on the spot.
    pub fn new(refresher: Option<Arc<dyn TokenRefresher>>) -> Self {
        Self {
            refresher,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Run `call` until it succeeds or the policy gives up.
    ///
    /// `call` must be repeatable: it is invoked once per attempt and should
    /// re-read any shared state (notably the current access token) on each
    /// invocation so that a refresh performed between attempts is observed.
    ///
    /// Retryable transient failures are retried with exponential backoff up
    /// to [`MAX_RETRIES`] times; rate-limit waits and the single allowed
    /// token refresh do not consume that budget. A second token expiry after
    /// a refresh is fatal. Waits put the calling task to sleep; nothing is
    /// cancellable once a call is in flight.
    pub async fn execute<T, F, Fut>(&self, call: F) -> Result<T, RequestError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiFailure>>,
    {
        let mut retries = 0u32;
        let mut refreshed = false;
        let mut last_failure = None;

        while retries < MAX_RETRIES {
            let failure = match call().await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            match failure {
                ApiFailure::RetryShortly(_) => {
                    self.delay(backoff_delay(retries)).await;
                    last_failure = Some(failure);
                    retries += 1;
                }
                ApiFailure::RateLimited(seconds) => {
                    // server-suggested wait, deliberately outside the budget
                    self.delay(Duration::from_secs(seconds)).await;
                }
                ApiFailure::TokenExpired(detail) => {
                    if refreshed {
                        return Err(RequestError::Fatal(format!(
                            "access token rejected again after a refresh: {detail}"
                        )));
                    }
                    self.refresh_token().await?;
                    refreshed = true;
                }
                ApiFailure::Forbidden(detail) => {
                    return Err(RequestError::AuthorizationRevoked(detail));
                }
                fatal => return Err(RequestError::Fatal(fatal.to_string())),
            }
        }

        let cause = last_failure
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Err(RequestError::Fatal(format!(
            "request exceeded maximum of {MAX_RETRIES} retries, cause of last failure: {cause}"
        )))
    }

    async fn refresh_token(&self) -> Result<(), RequestError> {
        let Some(refresher) = &self.refresher else {
            return Err(RequestError::Fatal(
                "cannot refresh access token because no token refresher was provided".to_string(),
            ));
        };
        // serialize refreshes; a caller queued behind an ongoing refresh
        // re-enters its request with the freshly assigned token
        let _gate = self.refresh_gate.lock().await;
        refresher.refresh_access_token().await
    }

    async fn delay(&self, wait: Duration) {
        let wait = wait.clamp(MIN_WAIT, MAX_WAIT);
        debug!("a request has been delayed for {}ms", wait.as_millis());
        tokio::time::sleep(wait).await;
    }
}

fn backoff_delay(retries: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(retries))
}
