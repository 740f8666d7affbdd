//! Integration tests for LobbySession
//!
//! Drives a session against the in-memory collaborators and checks what
//! reaches the lobby channel, the liked store and the play log.

use lobby_core::types::{PlayState, Track, TrackId, TransportIntent, UserId};
use lobby_playback::memory::{InMemoryLikedStore, InMemoryPlayLog, LoopbackChannel};
use lobby_playback::{
    Activation, Collaborators, Command, DiagnosticSource, DiagnosticsReceiver, Dispatch, Key,
    LobbySession, Phase, Rejection, SessionConfig, SessionEvent, VolumeIcon,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ===== Helpers =====

struct Harness {
    session: LobbySession,
    diagnostics: DiagnosticsReceiver,
    channel: Arc<LoopbackChannel>,
    liked: Arc<InMemoryLikedStore>,
    play_log: Arc<InMemoryPlayLog>,
}

fn harness_with(config: SessionConfig, user: Option<&str>, liked: InMemoryLikedStore) -> Harness {
    let channel = Arc::new(LoopbackChannel::default());
    let liked = Arc::new(liked);
    let play_log = Arc::new(InMemoryPlayLog::new());

    let collaborators = Collaborators {
        channel: channel.clone(),
        liked_store: liked.clone(),
        play_log: play_log.clone(),
    };
    let (session, diagnostics) =
        LobbySession::new(config, user.map(UserId::new), collaborators).unwrap();

    Harness {
        session,
        diagnostics,
        channel,
        liked,
        play_log,
    }
}

fn harness() -> Harness {
    harness_with(SessionConfig::default(), Some("alice"), InMemoryLikedStore::new())
}

fn track(id: &str) -> Track {
    Track::new(TrackId::new(id), format!("Song {}", id), "Band").with_duration(200.0)
}

/// Load a track and get it to Playing
fn start_playing(session: &mut LobbySession, id: &str) {
    session.change_music(track(id));
    assert!(session.play().is_applied());
    assert!(session.media_ready(&TrackId::new(id)));
    assert_eq!(session.phase(), Phase::Playing);
}

// ===== Volume =====

#[tokio::test]
async fn mute_and_unmute_restore_previous_level() {
    let mut h = harness();

    h.session.set_volume(35);
    assert!(h.session.toggle_mute().is_applied());
    assert_eq!(h.session.state().volume, 0);
    assert_eq!(h.session.view().volume_icon, VolumeIcon::Muted);

    assert!(h.session.toggle_mute().is_applied());
    assert_eq!(h.session.state().volume, 35);
    assert_eq!(h.session.view().volume_icon, VolumeIcon::Low);

    h.session.flush().await;
    assert_eq!(h.channel.snapshot().await.volume, 35);
}

#[tokio::test]
async fn unmute_without_memory_stays_silent() {
    let mut h = harness();
    h.session.set_volume(0);

    assert_eq!(h.session.toggle_mute(), Dispatch::Unchanged);
    assert_eq!(h.session.state().volume, 0);
}

#[tokio::test]
async fn gated_mute_keeps_memory() {
    let mut h = harness();
    h.session.set_volume(60);
    h.session.set_controls_disabled(true);

    assert_eq!(
        h.session.toggle_mute(),
        Dispatch::Rejected(Rejection::ControlsDisabled)
    );
    assert_eq!(h.session.volume_memory(), None);
    assert_eq!(h.session.state().volume, 60);
}

#[tokio::test]
async fn volume_slider_clamps() {
    let mut h = harness();
    h.session.set_volume(250);
    assert_eq!(h.session.state().volume, 100);
    h.session.set_volume(-5);
    assert_eq!(h.session.state().volume, 0);
}

// ===== Seek =====

#[tokio::test]
async fn preview_and_commit_both_move_shared_position() {
    let mut h = harness();
    h.session.change_music(track("a"));

    h.session.seek_preview(25.0);
    assert_eq!(h.session.state().position_seconds, 50.0);
    h.session.seek_commit(50.0);
    assert_eq!(h.session.state().position_seconds, 100.0);

    h.session.flush().await;
    let times: Vec<f64> = h
        .channel
        .sent()
        .await
        .into_iter()
        .filter_map(|intent| match intent {
            TransportIntent::ChangeTime(seconds) => Some(seconds),
            _ => None,
        })
        .collect();
    assert_eq!(times, vec![50.0, 100.0]);
}

#[tokio::test]
async fn seek_on_unknown_duration_goes_to_start() {
    let mut h = harness();
    h.session
        .change_music(Track::new(TrackId::new("live"), "Live", "Band"));

    assert_eq!(
        h.session.seek_commit(80.0),
        Dispatch::Applied(TransportIntent::ChangeTime(0.0))
    );
}

// ===== Queue =====

#[tokio::test]
async fn next_walks_queue_then_stays_on_last() {
    let mut h = harness();
    h.session.enqueue(track("a"));
    h.session.enqueue(track("b"));

    h.session.next();
    assert_eq!(h.session.state().track_id, Some(TrackId::new("a")));
    assert_eq!(h.session.state().position_seconds, 0.0);

    h.session.seek_commit(40.0);
    h.session.next();
    assert_eq!(h.session.state().track_id, Some(TrackId::new("b")));
    assert_eq!(h.session.state().position_seconds, 0.0);

    assert_eq!(h.session.next(), Dispatch::Unchanged);
    assert_eq!(h.session.state().track_id, Some(TrackId::new("b")));
}

#[tokio::test]
async fn next_on_empty_queue_leaves_playback_alone() {
    let mut h = harness();
    start_playing(&mut h.session, "a");
    h.session.seek_commit(30.0);
    let before = h.session.state().clone();

    assert_eq!(h.session.next(), Dispatch::Unchanged);
    assert_eq!(h.session.state(), &before);
    assert_eq!(h.session.state().play_state, PlayState::Playing);
}

#[tokio::test]
async fn queue_view_lists_entries_in_order() {
    let mut h = harness();
    h.session.enqueue(track("x"));
    h.session.enqueue(track("y"));

    let titles: Vec<String> = h.session.view().queue.into_iter().map(|row| row.title).collect();
    assert_eq!(titles, vec!["Song x", "Song y"]);
    assert_eq!(h.session.queue().len(), 2);
}

// ===== Loading gate =====

#[tokio::test]
async fn loading_blocks_controls_but_not_pause() {
    let mut h = harness();
    h.session.enqueue(track("b"));
    h.session.change_music(track("a"));
    h.session.play();
    assert_eq!(h.session.phase(), Phase::Loading);
    assert!(!h.session.view().controls_enabled);
    assert!(!h.session.like_interactable());

    assert_eq!(h.session.set_volume(10), Dispatch::Rejected(Rejection::Loading));
    assert_eq!(h.session.seek_commit(10.0), Dispatch::Rejected(Rejection::Loading));
    assert_eq!(h.session.next(), Dispatch::Rejected(Rejection::Loading));
    assert_eq!(h.session.queue().len(), 1);

    assert!(h.session.pause().is_applied());
    assert_eq!(h.session.phase(), Phase::Paused);
    assert!(h.session.view().controls_enabled);

    // Late readiness for the abandoned play is ignored
    assert!(!h.session.media_ready(&TrackId::new("a")));
    assert_eq!(h.session.phase(), Phase::Paused);
}

#[tokio::test]
async fn media_failure_reverts_and_propagates_pause() {
    let mut h = harness();
    h.session.change_music(track("a"));
    h.session.play();

    assert!(!h.session.media_failed(&TrackId::new("other")));
    assert!(h.session.media_failed(&TrackId::new("a")));
    assert_eq!(h.session.phase(), Phase::Paused);

    h.session.flush().await;
    assert_eq!(h.channel.sent().await.last(), Some(&TransportIntent::Pause));
    assert_eq!(h.channel.snapshot().await.play_state, PlayState::Paused);

    let diagnostic = h.diagnostics.try_recv().unwrap();
    assert_eq!(diagnostic.source, DiagnosticSource::Loading);
}

#[tokio::test]
async fn loading_times_out() {
    let config = SessionConfig {
        loading_timeout_ms: 1_000,
        ..SessionConfig::default()
    };
    let mut h = harness_with(config, Some("alice"), InMemoryLikedStore::new());
    h.session.change_music(track("a"));
    h.session.play();

    assert!(!h.session.expire_loading(Instant::now()));
    assert!(h.session.expire_loading(Instant::now() + Duration::from_secs(2)));
    assert_eq!(h.session.phase(), Phase::Paused);
    assert_eq!(
        h.diagnostics.try_recv().unwrap().source,
        DiagnosticSource::Loading
    );
}

#[tokio::test]
async fn disabled_timeout_never_expires() {
    let config = SessionConfig {
        loading_timeout_ms: 0,
        ..SessionConfig::default()
    };
    let mut h = harness_with(config, Some("alice"), InMemoryLikedStore::new());
    h.session.change_music(track("a"));
    h.session.play();

    assert!(!h.session.expire_loading(Instant::now() + Duration::from_secs(3600)));
    assert_eq!(h.session.phase(), Phase::Loading);
}

#[tokio::test]
async fn toggle_playback_follows_the_button() {
    let mut h = harness();
    h.session.change_music(track("a"));

    assert_eq!(h.session.toggle_playback(), Dispatch::Applied(TransportIntent::Play));
    assert_eq!(h.session.toggle_playback(), Dispatch::Applied(TransportIntent::Pause));
}

// ===== Controls gate =====

#[tokio::test]
async fn disabled_controls_allow_only_pause() {
    let mut h = harness();
    start_playing(&mut h.session, "a");
    h.session.set_controls_disabled(true);

    assert_eq!(
        h.session.change_music(track("b")),
        Dispatch::Rejected(Rejection::ControlsDisabled)
    );
    assert!(h.session.pause().is_applied());
    assert_eq!(
        h.session.play(),
        Dispatch::Rejected(Rejection::ControlsDisabled)
    );

    h.session.set_controls_disabled(false);
    assert!(h.session.play().is_applied());
}

// ===== Remote state =====

#[tokio::test]
async fn broadcast_replaces_local_state() {
    let mut h = harness();
    h.session.change_music(track("a"));
    h.session.play();

    let mut remote = h.session.state().clone();
    remote.position_seconds = 42.0;
    remote.volume = 12;
    h.session.apply_remote(remote);

    assert_eq!(h.session.phase(), Phase::Playing);
    assert_eq!(h.session.state().position_seconds, 42.0);
    assert_eq!(h.session.state().volume, 12);
}

#[tokio::test]
async fn broadcast_is_sanitized() {
    let mut h = harness();
    let mut remote = h.session.state().clone();
    remote.position_seconds = f64::NAN;
    remote.duration_seconds = f64::INFINITY;
    remote.play_state = PlayState::Playing;
    h.session.apply_remote(remote);

    assert_eq!(h.session.state().position_seconds, 0.0);
    assert_eq!(h.session.state().duration_seconds, 0.0);
    assert_eq!(h.session.phase(), Phase::Empty);
}

#[tokio::test]
async fn remote_track_change_logs_and_refreshes_like() {
    let store = InMemoryLikedStore::new().with_liked(UserId::new("alice"), TrackId::new("r"));
    let mut h = harness_with(SessionConfig::default(), Some("alice"), store);

    let mut remote = h.session.state().clone();
    remote.track_id = Some(TrackId::new("r"));
    remote.title = "Remote".into();
    h.session.apply_remote(remote);
    h.session.flush().await;

    assert!(h.session.is_liked());
    assert_eq!(h.play_log.records().await.len(), 1);
}

// ===== Liked state =====

#[tokio::test]
async fn liked_state_loads_for_current_track() {
    let store = InMemoryLikedStore::new().with_liked(UserId::new("alice"), TrackId::new("a"));
    let mut h = harness_with(SessionConfig::default(), Some("alice"), store);

    h.session.change_music(track("a"));
    assert!(!h.session.is_liked());
    h.session.flush().await;
    assert!(h.session.is_liked());
    assert!(h.session.view().liked);
}

#[tokio::test]
async fn stale_fetch_is_discarded() {
    let store = InMemoryLikedStore::new().with_liked(UserId::new("alice"), TrackId::new("a"));
    let mut h = harness_with(SessionConfig::default(), Some("alice"), store);

    // Both fetches are in flight before either result is applied
    h.session.change_music(track("a"));
    h.session.change_music(track("b"));
    h.session.flush().await;

    assert!(!h.session.is_liked());
    assert_eq!(h.liked.read_count(), 2);
}

#[tokio::test]
async fn failed_fetch_fails_closed() {
    let store = InMemoryLikedStore::new().with_liked(UserId::new("alice"), TrackId::new("a"));
    store.set_fail_reads(true);
    let mut h = harness_with(SessionConfig::default(), Some("alice"), store);

    h.session.change_music(track("a"));
    h.session.flush().await;

    assert!(!h.session.is_liked());
    let diagnostic = h.diagnostics.try_recv().unwrap();
    assert_eq!(diagnostic.source, DiagnosticSource::LikedStore);
}

#[tokio::test]
async fn toggle_like_persists() {
    let mut h = harness();
    h.session.change_music(track("a"));
    h.session.flush().await;

    assert!(h.session.toggle_like());
    assert!(h.session.is_liked());
    h.session.flush().await;

    assert!(h.session.is_liked());
    assert!(h.liked.contains(&UserId::new("alice"), &TrackId::new("a")).await);
}

#[tokio::test]
async fn toggle_like_reverts_when_store_fails() {
    let store = InMemoryLikedStore::new().with_liked(UserId::new("alice"), TrackId::new("a"));
    let mut h = harness_with(SessionConfig::default(), Some("alice"), store);
    h.session.change_music(track("a"));
    h.session.flush().await;
    assert!(h.session.is_liked());

    h.liked.set_fail_writes(true);
    assert!(h.session.toggle_like());
    assert!(!h.session.is_liked());

    h.session.flush().await;
    assert!(h.session.is_liked());
    assert_eq!(
        h.diagnostics.try_recv().unwrap().source,
        DiagnosticSource::LikedStore
    );
}

#[tokio::test]
async fn two_failed_toggles_match_the_store() {
    let mut h = harness();
    h.session.change_music(track("a"));
    h.session.flush().await;
    assert!(!h.session.is_liked());

    h.liked.set_fail_writes(true);
    assert!(h.session.toggle_like());
    assert!(h.session.toggle_like());
    h.session.flush().await;

    let stored = h.liked.contains(&UserId::new("alice"), &TrackId::new("a")).await;
    assert!(!stored);
    assert_eq!(h.session.is_liked(), stored);
}

#[tokio::test]
async fn failed_toggle_before_fetch_falls_back_to_store() {
    let store = InMemoryLikedStore::new().with_liked(UserId::new("alice"), TrackId::new("a"));
    store.set_fail_writes(true);
    let mut h = harness_with(SessionConfig::default(), Some("alice"), store);

    h.session.change_music(track("a"));
    assert!(h.session.toggle_like());
    h.session.flush().await;

    let stored = h.liked.contains(&UserId::new("alice"), &TrackId::new("a")).await;
    assert!(stored);
    assert_eq!(h.session.is_liked(), stored);
}

#[tokio::test]
async fn like_needs_user_and_track() {
    let mut h = harness_with(SessionConfig::default(), None, InMemoryLikedStore::new());
    h.session.change_music(track("a"));

    assert!(!h.session.like_interactable());
    assert!(!h.session.toggle_like());
    h.session.flush().await;
    assert_eq!(h.liked.write_count(), 0);
    assert_eq!(h.liked.read_count(), 0);
}

#[tokio::test]
async fn keyboard_activation_matches_click() {
    let mut h = harness();
    h.session.change_music(track("a"));
    h.session.flush().await;

    assert!(!h.session.activate_like(Activation::Key(Key::Other)));
    assert!(!h.session.is_liked());

    assert!(h.session.activate_like(Activation::Key(Key::Enter)));
    assert!(h.session.is_liked());
    assert!(h.session.activate_like(Activation::Key(Key::Space)));
    assert!(!h.session.is_liked());
    assert!(h.session.activate_like(Activation::Click));
    assert!(h.session.is_liked());
}

// ===== Play log =====

#[tokio::test]
async fn play_log_written_once_per_track_change() {
    let mut h = harness();

    h.session.change_music(track("a"));
    h.session.play();
    h.session.pause();
    h.session.play();
    h.session.media_ready(&TrackId::new("a"));
    h.session.change_music(track("b"));
    h.session.pause();
    h.session.play();
    h.session.pause();
    h.session.set_volume(20);
    h.session.seek_commit(50.0);
    h.session.change_music(track("c"));
    h.session.flush().await;

    let mut tracks: Vec<String> = h
        .play_log
        .records()
        .await
        .into_iter()
        .map(|(_, track)| track.as_str().to_string())
        .collect();
    tracks.sort();
    assert_eq!(tracks, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn play_log_waits_for_a_user() {
    let mut h = harness_with(SessionConfig::default(), None, InMemoryLikedStore::new());
    h.session.change_music(track("a"));
    h.session.flush().await;
    assert!(h.play_log.records().await.is_empty());

    h.session.set_user(Some(UserId::new("bob")));
    h.session.flush().await;
    assert_eq!(
        h.play_log.records().await,
        vec![(UserId::new("bob"), TrackId::new("a"))]
    );
}

#[tokio::test]
async fn play_log_failure_is_reported_not_fatal() {
    let mut h = harness();
    h.play_log.set_failing(true);

    h.session.change_music(track("a"));
    h.session.flush().await;

    assert_eq!(h.session.state().track_id, Some(TrackId::new("a")));
    assert_eq!(
        h.diagnostics.try_recv().unwrap().source,
        DiagnosticSource::PlayLog
    );
}

// ===== Propagation =====

#[tokio::test]
async fn intents_reach_channel_in_issue_order() {
    let mut h = harness();
    h.session.change_music(track("a"));
    h.session.set_volume(50);
    h.session.seek_commit(10.0);
    h.session.play();
    h.session.pause();
    h.session.flush().await;

    let kinds: Vec<&str> = h.channel.sent().await.iter().map(TransportIntent::kind).collect();
    assert_eq!(
        kinds,
        vec!["CHANGE_MUSIC", "CHANGE_VOLUME", "CHANGE_TIME", "PLAY", "PAUSE"]
    );
    assert_eq!(h.session.pending(), 0);
}

#[tokio::test]
async fn channel_failure_keeps_optimistic_state() {
    let mut h = harness();
    h.channel.set_failing(true);

    h.session.set_volume(15);
    h.session.flush().await;

    assert_eq!(h.session.state().volume, 15);
    assert_eq!(
        h.diagnostics.try_recv().unwrap().source,
        DiagnosticSource::Channel
    );
}

#[tokio::test]
async fn close_delivers_issued_intents() {
    let h = harness();
    let Harness {
        mut session,
        channel,
        ..
    } = h;

    session.change_music(track("a"));
    session.close().await;

    assert_eq!(channel.sent().await.len(), 1);
}

// ===== Actor =====

#[tokio::test]
async fn spawned_session_publishes_views() {
    let h = harness();
    let channel = h.channel.clone();
    let (mut handle, task) = h.session.spawn();

    assert_eq!(handle.view().title, "No Song Selected");

    handle.send(Command::ChangeMusic(track("a"))).await.unwrap();
    handle.send(Command::TogglePlayback).await.unwrap();
    handle
        .send(SessionEvent::MediaReady(TrackId::new("a")))
        .await
        .unwrap();

    let view = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let view = handle.changed().await.unwrap();
            if view.title == "Song a" && view.controls_enabled && view.play_button == lobby_playback::PlayButton::Pause {
                return view;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(view.total, "3:20");

    drop(handle);
    task.await.unwrap();
    assert_eq!(channel.snapshot().await.play_state, PlayState::Playing);
}

#[tokio::test]
async fn send_after_stop_reports_closed() {
    let h = harness();
    let (handle, task) = h.session.spawn();
    task.abort();
    let _ = task.await;

    let result = handle.send(Command::Play).await;
    assert!(matches!(result, Err(lobby_playback::PlaybackError::SessionClosed)));
}
