//! Integration Tests: End-to-End Game Flows
//!
//! These tests drive complete sessions through the public API:
//! play to completion, persist, resume after restart, and keep playing
//! when storage is broken.

use std::sync::Arc;
use std::time::Duration;

use pairs_core::config::{PairsConfig, StorageBackend, StorageConfig};
use pairs_core::error::{PairsError, Result};
use pairs_core::persistence::{KeyValueStore, MemoryStore, StorageKey};
use pairs_core::{CardId, Difficulty, GameSession, GameStorage, Phase, SelectOutcome};
use tokio::time::sleep;

const PAST_SETTLE: Duration = Duration::from_millis(1_100);

fn pair_of(session: &GameSession) -> (CardId, CardId) {
    let cards = session.cards();
    let first = cards.iter().find(|c| !c.matched).expect("unmatched card");
    let second = cards
        .iter()
        .find(|c| c.face == first.face && c.id != first.id)
        .expect("partner");
    (first.id, second.id)
}

fn mismatch_of(session: &GameSession) -> (CardId, CardId) {
    let cards = session.cards();
    let first = cards.iter().find(|c| !c.matched).expect("unmatched card");
    let second = cards
        .iter()
        .find(|c| !c.matched && c.face != first.face)
        .expect("other face");
    (first.id, second.id)
}

async fn pick(session: &GameSession, (a, b): (CardId, CardId)) {
    session.select(a);
    session.select(b);
    sleep(PAST_SETTLE).await;
}

// ---------------------------------------------------------------------------
// Full game: start → mistakes → completion → history
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn medium_game_with_mistakes() {
    let storage = GameStorage::in_memory();
    let session = GameSession::new(&PairsConfig::default(), storage.clone());
    session.start(Difficulty::Medium);

    pick(&session, mismatch_of(&session)).await;
    pick(&session, mismatch_of(&session)).await;
    sleep(Duration::from_secs(20)).await;
    while session.phase() == Phase::Playing {
        pick(&session, pair_of(&session)).await;
    }

    let summary = session.summary().expect("completed");
    assert_eq!(summary.mistakes, 2);
    assert_eq!(summary.turns, 10);
    // last settle lands at 30.9s
    assert_eq!(summary.elapsed_secs, 30);
    assert_eq!(summary.score.time_bonus, 300);
    assert_eq!(summary.score.raw_score, 1200);
    assert_eq!(summary.score.final_score, 1800);
    assert_eq!(summary.score.star_rating, 2);

    let history = storage.load_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score, 1800);
    assert_eq!(history[0].card_pairs, 8);
    assert_eq!(history[0].max_possible_score, 2400);

    let metrics = storage.load_performance_metrics();
    assert_eq!(metrics.total_games_played, 1);
    assert_eq!(metrics.total_time_played, 30);
    assert_eq!(metrics.fastest_time_by_difficulty[&Difficulty::Medium], 30);
}

#[tokio::test(start_paused = true)]
async fn selections_after_completion_are_ignored() {
    let session = GameSession::new(&PairsConfig::default(), GameStorage::in_memory());
    session.start(Difficulty::Easy);
    while session.phase() == Phase::Playing {
        pick(&session, pair_of(&session)).await;
    }
    let any = session.cards()[0].id;
    assert!(matches!(session.select(any), SelectOutcome::Ignored(_)));
    assert_eq!(session.turns(), 6);
}

// ---------------------------------------------------------------------------
// Persistence across restarts
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn sqlite_game_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = PairsConfig {
        storage: StorageConfig {
            backend: StorageBackend::Sqlite,
            path: dir.path().join("pairs.db").display().to_string(),
            ..StorageConfig::default()
        },
        ..PairsConfig::default()
    };

    let first = GameSession::new(&config, GameStorage::from_config(&config.storage));
    let id = first.start(Difficulty::Easy);
    pick(&first, pair_of(&first)).await;
    pick(&first, mismatch_of(&first)).await;
    first.pause();
    drop(first);

    let storage = GameStorage::from_config(&config.storage);
    let saved = storage.load_current_game().expect("snapshot on disk");
    assert_eq!(saved.session_id, id);
    assert_eq!(saved.turns, 2);
    assert_eq!(saved.mistakes, 1);

    let second = GameSession::new(&config, storage.clone());
    assert!(second.resume(saved));
    while second.phase() == Phase::Playing {
        pick(&second, pair_of(&second)).await;
    }
    let summary = second.summary().expect("completed");
    assert_eq!(summary.session_id, id);
    assert_eq!(summary.mistakes, 1);
    assert_eq!(summary.turns, 7);
    assert!(storage.load_current_game().is_none());
    assert_eq!(storage.load_history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn exported_data_imports_elsewhere() {
    let source = GameStorage::in_memory();
    let session = GameSession::new(&PairsConfig::default(), source.clone());
    session.start(Difficulty::Easy);
    while session.phase() == Phase::Playing {
        pick(&session, pair_of(&session)).await;
    }

    let target = GameStorage::in_memory();
    assert!(target.import_data(&source.export_data()));
    assert_eq!(target.load_history(), source.load_history());
    assert_eq!(
        target.load_performance_metrics(),
        source.load_performance_metrics()
    );
}

// ---------------------------------------------------------------------------
// Degraded storage
// ---------------------------------------------------------------------------

struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Err(PairsError::StorageUnavailable {
            key: key.to_string(),
            reason: "disk gone".to_string(),
        })
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(PairsError::StorageUnavailable {
            key: key.to_string(),
            reason: "disk gone".to_string(),
        })
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn game_is_playable_without_storage() {
    let storage = GameStorage::new(Arc::new(BrokenStore), StorageConfig::default());
    let session = GameSession::new(&PairsConfig::default(), storage);
    session.start(Difficulty::Easy);
    while session.phase() == Phase::Playing {
        pick(&session, pair_of(&session)).await;
    }
    let summary = session.summary().expect("completed anyway");
    assert!(summary.personal_best.is_new_best);
    assert_eq!(summary.score.star_rating, 3);
}

#[tokio::test(start_paused = true)]
async fn corrupt_history_is_replaced() {
    let store = Arc::new(MemoryStore::new());
    let storage = GameStorage::new(store.clone(), StorageConfig::default());
    store
        .set(&storage.key(StorageKey::History), "{ definitely not a list")
        .expect("seed");

    let session = GameSession::new(&PairsConfig::default(), storage.clone());
    session.start(Difficulty::Easy);
    while session.phase() == Phase::Playing {
        pick(&session, pair_of(&session)).await;
    }
    assert_eq!(storage.load_history().len(), 1);
}
