use sposhcli::jobs::{
    DiscardStatus, JobState, JobStatusSink, LIKED_SONGS_SHUFFLE, SHUFFLE_SUFFIX, ShuffleJobStatus,
};

#[test]
fn test_job_state_predicates() {
    assert!(JobState::Waiting.is_waiting());
    assert!(!JobState::Waiting.is_done());

    assert!(JobState::Executing.is_running());
    assert!(!JobState::Executing.is_done());

    assert!(JobState::Finished.is_done());
    assert!(JobState::Skipped.is_done());
    assert!(JobState::Terminated.is_done());
    assert!(!JobState::Terminated.is_running());
}

#[test]
fn test_status_starts_waiting_and_clean() {
    let status = ShuffleJobStatus::default();
    assert_eq!(status.state, JobState::Waiting);
    assert!(status.message.is_none());
    assert!(!status.authorization_revoked);
    assert!(status.source_playlist.is_none());
    assert!(status.target_playlist.is_none());
}

#[test]
fn test_liked_playlist_name_carries_suffix() {
    assert!(LIKED_SONGS_SHUFFLE.ends_with(SHUFFLE_SUFFIX));
}

#[test]
fn test_discard_sink_accepts_updates() {
    let sink = DiscardStatus;
    sink.update(&ShuffleJobStatus::default());
}
