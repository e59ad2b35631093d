//! Integration tests for the transport controller
//!
//! Every test drives the controller against a scripted backend under
//! paused virtual time, so latency races between asynchronous chains
//! reproduce deterministically.

mod support;

use nebula_core::Severity;
use nebula_playback::{PlayMode, Player, PlayerConfig, PlayerEvent};
use std::sync::Arc;
use support::{drain_events, imported, BackendCall, ScriptedBackend};
use tokio::time::Duration;

fn setup() -> (Arc<ScriptedBackend>, Player) {
    let backend = Arc::new(ScriptedBackend::new());
    let player = Player::new(backend.clone(), PlayerConfig::default());
    (backend, player)
}

// ===== Load-and-play =====

#[tokio::test(start_paused = true)]
async fn buffering_is_set_while_the_load_is_in_flight() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 180.0);
    backend.set_load_delay("/music/a.mp3", Duration::from_millis(100));
    player.import_track(imported("/music/a.mp3", "A", 180.0));

    let loading = {
        let player = player.clone();
        tokio::spawn(async move { player.play_index(0).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Optimistic flags landed before the backend round-trip resolved
    let snap = player.snapshot();
    assert!(snap.flags.playing);
    assert!(snap.flags.buffering);
    assert_eq!(snap.position_secs, 0.0);

    loading.await.unwrap().unwrap();
    assert!(!player.snapshot().flags.buffering);
}

#[tokio::test(start_paused = true)]
async fn superseded_load_never_commits_state() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 300.0);
    backend.set_duration("/music/b.mp3", 200.0);
    backend.set_load_delay("/music/a.mp3", Duration::from_millis(500));
    backend.set_load_delay("/music/b.mp3", Duration::from_millis(50));
    player.import_track(imported("/music/a.mp3", "A", 111.0));
    player.import_track(imported("/music/b.mp3", "B", 222.0));

    // Start loading A, then supersede it with B before A resolves
    let racing = {
        let player = player.clone();
        tokio::spawn(async move { player.play_index(0).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    player.play_index(1).await.unwrap();
    racing.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let snap = player.snapshot();
    assert_eq!(snap.current_index, Some(1));
    assert_eq!(snap.track.unwrap().title, "B");
    assert_eq!(snap.duration_secs, 200.0);
    assert!(snap.flags.playing);
    assert!(!snap.flags.buffering);

    // The stale chain's authoritative duration never landed on track A
    assert_eq!(player.tracks()[0].duration_secs, 111.0);
}

#[tokio::test(start_paused = true)]
async fn backend_duration_corrects_the_import_estimate() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 180.5);
    backend.set_duration("/music/b.mp3", 200.05);
    player.import_track(imported("/music/a.mp3", "A", 179.0));
    player.import_track(imported("/music/b.mp3", "B", 200.0));

    player.play_index(0).await.unwrap();
    player.play_index(1).await.unwrap();

    // A differed by 1.5 s and was corrected; B was within tolerance
    assert_eq!(player.tracks()[0].duration_secs, 180.5);
    assert_eq!(player.tracks()[1].duration_secs, 200.0);
}

#[tokio::test(start_paused = true)]
async fn playback_starts_silent_and_fades_to_the_configured_level() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 180.0);
    player.import_track(imported("/music/a.mp3", "A", 180.0));

    player.play_index(0).await.unwrap();

    let levels = backend.volume_levels();
    assert_eq!(levels.first().copied(), Some(0.0));
    assert!((levels.last().copied().unwrap() - 0.7).abs() < 1e-6);
    assert!(levels.windows(2).all(|p| p[1] >= p[0]));
}

#[tokio::test(start_paused = true)]
async fn load_failure_reverts_state_and_restores_volume() {
    let (backend, player) = setup();
    backend.fail_load("/music/broken.mp3");
    player.import_track(imported("/music/broken.mp3", "Broken", 100.0));
    let mut events = player.subscribe();

    player.play_index(0).await.unwrap();

    let snap = player.snapshot();
    assert!(!snap.flags.playing);
    assert!(!snap.flags.paused);
    assert!(!snap.flags.buffering);

    // The pre-load silence was undone so a later play is audible
    let levels = backend.volume_levels();
    assert!((levels.last().copied().unwrap() - 0.7).abs() < 1e-6);

    let notices: Vec<_> = drain_events(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            PlayerEvent::Notice(n) => Some(n),
            _ => None,
        })
        .collect();
    assert!(notices.iter().any(|n| n.severity == Severity::Error));
}

// ===== Toggle play/pause =====

#[tokio::test(start_paused = true)]
async fn double_toggle_returns_to_playing_with_one_pause_play_pair() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 180.0);
    player.import_track(imported("/music/a.mp3", "A", 180.0));
    player.play_index(0).await.unwrap();
    backend.clear_calls();

    player.toggle_play().await.unwrap();
    assert!(player.snapshot().flags.paused);

    player.toggle_play().await.unwrap();
    let snap = player.snapshot();
    assert!(snap.flags.playing);
    assert!(!snap.flags.paused);

    // Beyond volume fades, the round trip is exactly one pause/play pair
    assert_eq!(
        backend.transport_calls(),
        vec![BackendCall::Pause, BackendCall::Play]
    );
}

#[tokio::test(start_paused = true)]
async fn toggle_with_nothing_loaded_collapses_to_load_and_play() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 180.0);
    player.import_track(imported("/music/a.mp3", "A", 180.0));

    player.toggle_play().await.unwrap();

    let snap = player.snapshot();
    assert!(snap.flags.playing);
    assert_eq!(snap.current_index, Some(0));
    assert!(backend
        .transport_calls()
        .iter()
        .any(|c| matches!(c, BackendCall::Load(_))));
}

// ===== Seek =====

#[tokio::test(start_paused = true)]
async fn seek_percent_maps_onto_the_track_duration() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 200.0);
    player.import_track(imported("/music/a.mp3", "A", 200.0));
    player.play_index(0).await.unwrap();

    player.seek_to_percent(25.0).await;
    assert_eq!(player.snapshot().position_secs, 50.0);
    assert!(backend.calls().contains(&BackendCall::Seek(50.0)));

    // Boundary percentages are valid
    player.seek_to_percent(0.0).await;
    assert_eq!(player.snapshot().position_secs, 0.0);
    player.seek_to_percent(100.0).await;
    assert_eq!(player.snapshot().position_secs, 200.0);
}

#[tokio::test(start_paused = true)]
async fn seek_is_a_noop_when_the_duration_is_zero() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 0.0);
    player.import_track(imported("/music/a.mp3", "A", 0.0));
    player.play_index(0).await.unwrap();
    backend.clear_calls();

    player.seek_to(50.0).await;
    player.seek_to_percent(50.0).await;

    assert_eq!(player.snapshot().position_secs, 0.0);
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, BackendCall::Seek(_))));
}

#[tokio::test(start_paused = true)]
async fn seek_while_paused_reasserts_pause() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 100.0);
    player.import_track(imported("/music/a.mp3", "A", 100.0));
    player.play_index(0).await.unwrap();
    player.toggle_play().await.unwrap();
    backend.clear_calls();

    player.seek_to(50.0).await;

    let snap = player.snapshot();
    assert_eq!(snap.position_secs, 50.0);
    assert!(snap.flags.paused);
    assert!(!snap.flags.seeking);

    // The backend's seek path wakes its transport; pause is re-issued
    assert_eq!(
        backend.transport_calls(),
        vec![BackendCall::Seek(50.0), BackendCall::Pause]
    );
}

#[tokio::test(start_paused = true)]
async fn drag_suspends_the_clock_and_seeks_on_release() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 300.0);
    player.import_track(imported("/music/a.mp3", "A", 300.0));
    player.play_index(0).await.unwrap();

    player.begin_drag();
    let before = player.snapshot().position_secs;
    tokio::time::sleep(Duration::from_secs(5)).await;
    // Dragging holds the displayed position still
    assert_eq!(player.snapshot().position_secs, before);

    player.drag_position(120.0);
    assert_eq!(player.snapshot().position_secs, 120.0);

    player.end_drag(120.0).await;
    let snap = player.snapshot();
    assert!(!snap.flags.dragging);
    assert_eq!(snap.position_secs, 120.0);
    assert!(backend.calls().contains(&BackendCall::Seek(120.0)));
}

// ===== Progress clock =====

#[tokio::test(start_paused = true)]
async fn clock_advances_to_the_next_track_at_end() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 180.0);
    backend.set_duration("/music/b.mp3", 200.0);
    player.import_track(imported("/music/a.mp3", "A", 180.0));
    player.import_track(imported("/music/b.mp3", "B", 200.0));

    player.play_index(0).await.unwrap();
    tokio::time::sleep(Duration::from_secs(181)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let snap = player.snapshot();
    assert_eq!(snap.current_index, Some(1));
    assert_eq!(snap.track.unwrap().title, "B");
    assert!(snap.flags.playing);
    assert!(!snap.flags.buffering);
    assert!(snap.position_secs < 2.0);
}

#[tokio::test(start_paused = true)]
async fn loop_single_restarts_the_same_track() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 10.0);
    player.import_track(imported("/music/a.mp3", "A", 10.0));
    player.set_play_mode(PlayMode::LoopSingle);

    player.play_index(0).await.unwrap();
    backend.clear_calls();
    tokio::time::sleep(Duration::from_secs(25)).await;

    let snap = player.snapshot();
    assert_eq!(snap.current_index, Some(0));
    assert!(snap.position_secs < 10.0);
    assert!(snap.flags.playing);

    // Two wraps in 25 s, each a bare seek-to-zero with no reload
    let seeks = backend
        .calls()
        .iter()
        .filter(|c| matches!(c, BackendCall::Seek(p) if *p == 0.0))
        .count();
    assert!(seeks >= 2);
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, BackendCall::Load(_))));
}

#[tokio::test(start_paused = true)]
async fn pausing_stops_the_clock() {
    let (backend, player) = setup();
    backend.set_duration("/music/a.mp3", 300.0);
    player.import_track(imported("/music/a.mp3", "A", 300.0));
    player.play_index(0).await.unwrap();

    player.toggle_play().await.unwrap();
    let frozen = player.snapshot().position_secs;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(player.snapshot().position_secs, frozen);
}

// ===== Shuffle =====

#[tokio::test(start_paused = true)]
async fn shuffle_never_repeats_the_current_index() {
    let (backend, player) = setup();
    for (path, title) in [
        ("/music/a.mp3", "A"),
        ("/music/b.mp3", "B"),
        ("/music/c.mp3", "C"),
    ] {
        backend.set_duration(path, 100.0);
        player.import_track(imported(path, title, 100.0));
    }
    player.set_play_mode(PlayMode::Shuffle);
    player.play_index(0).await.unwrap();

    for _ in 0..15 {
        let before = player.snapshot().current_index;
        player.next().await.unwrap();
        let after = player.snapshot().current_index;
        assert_ne!(before, after);
    }
}

// ===== Volume =====

#[tokio::test(start_paused = true)]
async fn slider_volume_is_suppressed_while_a_fade_runs() {
    let backend = Arc::new(ScriptedBackend::new());
    let config = PlayerConfig {
        volume: 1.0,
        fade_in: Duration::from_secs(2),
        ..PlayerConfig::default()
    };
    let player = Player::new(backend.clone(), config);
    backend.set_duration("/music/a.mp3", 180.0);
    player.import_track(imported("/music/a.mp3", "A", 180.0));

    let playing = {
        let player = player.clone();
        tokio::spawn(async move { player.play_index(0).await })
    };
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Mid-fade slider change updates the configured level only
    player.set_volume(0.123).await;
    assert_eq!(player.snapshot().volume, 0.123);

    playing.await.unwrap().unwrap();
    let levels = backend.volume_levels();
    assert!(!levels.contains(&0.123));
    assert_eq!(levels.last().copied(), Some(1.0));

    // Once the fade is done the slider drives the backend again
    player.set_volume(0.5).await;
    assert_eq!(backend.volume_levels().last().copied(), Some(0.5));
}
