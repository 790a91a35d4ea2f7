use std::time::Duration;

use sposhcli::spotify::auth::AuthState;
use sposhcli::types::Credentials;

fn credentials_issued_at(issued_at: i64, access_token: &str) -> Credentials {
    Credentials {
        access_token: access_token.to_string(),
        refresh_token: Some(format!("{access_token}-refresh")),
        issued_at,
        expires_in: 3600,
    }
}

#[test]
fn test_recency_comparison() {
    let older = credentials_issued_at(100, "old");
    let newer = credentials_issued_at(200, "new");

    assert!(newer.is_more_recent_than(&older));
    assert!(!older.is_more_recent_than(&newer));
    // equal issue time is not "more recent"
    assert!(!newer.is_more_recent_than(&newer.clone()));
}

#[tokio::test]
async fn test_assign_rejects_stale_credentials() {
    let state = AuthState::new(credentials_issued_at(200, "current"));

    // a late-arriving refresh response must not clobber newer tokens
    assert!(!state.assign(credentials_issued_at(100, "stale")));
    assert_eq!(state.access_token(), "current");

    assert!(state.assign(credentials_issued_at(300, "fresh")));
    assert_eq!(state.access_token(), "fresh");
}

#[tokio::test]
async fn test_assign_keeps_refresh_token_when_rotation_omits_it() {
    let state = AuthState::new(credentials_issued_at(100, "first"));

    let update = Credentials {
        access_token: "second".to_string(),
        refresh_token: None,
        issued_at: 200,
        expires_in: 3600,
    };
    assert!(state.assign(update));

    assert_eq!(state.access_token(), "second");
    assert_eq!(state.refresh_token().as_deref(), Some("first-refresh"));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_debounce_window() {
    let state = AuthState::new(credentials_issued_at(100, "first"));
    assert!(!state.recently_refreshed());

    assert!(state.assign(credentials_issued_at(200, "second")));
    assert!(state.recently_refreshed());

    // the window is capped at 300 seconds regardless of expires_in
    tokio::time::advance(Duration::from_secs(301)).await;
    assert!(!state.recently_refreshed());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_debounce_uses_short_expiry() {
    let state = AuthState::new(credentials_issued_at(100, "first"));

    let short_lived = Credentials {
        access_token: "second".to_string(),
        refresh_token: None,
        issued_at: 200,
        expires_in: 10,
    };
    assert!(state.assign(short_lived));
    assert!(state.recently_refreshed());

    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(!state.recently_refreshed());
}
