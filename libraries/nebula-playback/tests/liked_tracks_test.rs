//! Liked-track persistence through the player

mod support;

use nebula_playback::{Player, PlayerConfig};
use nebula_storage::FavoritesFile;
use std::sync::Arc;
use support::{imported, ScriptedBackend};

#[tokio::test]
async fn liked_ids_survive_a_player_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FavoritesFile::new(dir.path().join("liked.json")));
    let backend = Arc::new(ScriptedBackend::new());

    let track_id = {
        let player = Player::new(backend.clone(), PlayerConfig::default());
        player.attach_liked_store(store.clone()).await;
        let track = player
            .import_track(imported("/music/a.mp3", "A", 100.0))
            .unwrap();
        assert!(player.toggle_liked(&track.id).await);
        assert!(player.is_liked(&track.id));
        track.id
    };

    // A fresh player loading the same store sees the persisted set
    let player = Player::new(backend, PlayerConfig::default());
    player.attach_liked_store(store).await;
    assert!(player.is_liked(&track_id));
}

#[tokio::test]
async fn unliking_rewrites_the_persisted_set() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FavoritesFile::new(dir.path().join("liked.json")));
    let backend = Arc::new(ScriptedBackend::new());

    let player = Player::new(backend.clone(), PlayerConfig::default());
    player.attach_liked_store(store.clone()).await;
    let track = player
        .import_track(imported("/music/a.mp3", "A", 100.0))
        .unwrap();

    player.toggle_liked(&track.id).await;
    player.toggle_liked(&track.id).await;

    let player = Player::new(backend, PlayerConfig::default());
    player.attach_liked_store(store).await;
    assert!(!player.is_liked(&track.id));
}
