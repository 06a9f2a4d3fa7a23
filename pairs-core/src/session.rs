//! Game session orchestration.
//!
//! A [`GameSession`] ties one [`Board`] to its [`GameTimer`], the settle
//! delay, and [`GameStorage`]:
//!
//! ```text
//!   select ──▶ Board::select ──PairPicked──▶ ScheduledTask::after(settle_delay)
//!                                                     │
//!                                   ┌─────────────────┴──────────────┐
//!                                   ▼                                ▼
//!                            Continue: save snapshot       Completed: stop timer,
//!                                                          score, persist record,
//!                                                          clear snapshot
//! ```
//!
//! Lock order is session state, then timer. Timer observers never touch the
//! session state.
//!
//! All methods that start work (`start`, `resume`, `select`) must be called
//! from within a tokio runtime.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::thread_rng;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::board::{Board, Phase, SelectOutcome, SettleOutcome};
use crate::config::{GameConfig, PairsConfig};
use crate::deck::{Card, Deck, build_deck};
use crate::difficulty::Difficulty;
use crate::persistence::{GameSnapshot, GameStorage, SessionRecord};
use crate::schedule::ScheduledTask;
use crate::score::{PerformanceLevel, PersonalBest, ScoreBreakdown, ScoreEngine};
use crate::timer::GameTimer;
use crate::types::{CardId, SessionId};

const EVENT_CAPACITY: usize = 64;

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Elapsed whole seconds, once per tick while the timer runs.
    Tick(u64),
    /// A pair finished its settle delay.
    PairResolved {
        /// Whether the two cards matched.
        matched: bool,
    },
    /// The last pair was found.
    Completed(Box<GameSummary>),
}

/// Results of a completed game.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    /// Session identity.
    pub session_id: SessionId,
    /// Difficulty played.
    pub difficulty: Difficulty,
    /// Elapsed seconds at completion.
    pub elapsed_secs: u64,
    /// Resolved turns.
    pub turns: u32,
    /// Mismatches.
    pub mistakes: u32,
    /// Score breakdown.
    pub score: ScoreBreakdown,
    /// Comparison with the best stored before this game.
    pub personal_best: PersonalBest,
    /// Qualitative label.
    pub performance_level: PerformanceLevel,
    /// The record appended to history.
    pub record: SessionRecord,
}

struct SessionState {
    id: SessionId,
    difficulty: Difficulty,
    board: Board,
    started_at: DateTime<Utc>,
    /// Outcome of the pair waiting on the settle delay.
    pending_match: Option<bool>,
    settle: Option<ScheduledTask>,
    summary: Option<GameSummary>,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            id: SessionId::new(),
            difficulty: Difficulty::default(),
            board: Board::new(),
            started_at: Utc::now(),
            pending_match: None,
            settle: None,
            summary: None,
        }
    }

    fn snapshot(&self, elapsed_secs: u64) -> Option<GameSnapshot> {
        if !matches!(self.board.phase(), Phase::Playing | Phase::Resolving) {
            return None;
        }
        Some(GameSnapshot {
            session_id: self.id,
            difficulty: self.difficulty,
            cards: self.board.cards().to_vec(),
            // a pending resolution is saved as already counted
            turns: self.board.turns() + u32::from(self.board.is_locked()),
            mistakes: self.board.mistakes(),
            elapsed_secs,
            started_at: self.started_at,
            saved_at: Utc::now(),
        })
    }
}

struct Shared {
    state: Mutex<SessionState>,
    timer: GameTimer,
    storage: GameStorage,
    events: broadcast::Sender<SessionEvent>,
    config: GameConfig,
}

impl Shared {
    fn settle(&self) {
        let mut state = self.state.lock();
        let Some(outcome) = state.board.settle() else {
            return;
        };
        let matched = state.pending_match.take().unwrap_or(false);

        match outcome {
            SettleOutcome::Continue => {
                debug!(
                    session = %state.id,
                    matched,
                    turns = state.board.turns(),
                    mistakes = state.board.mistakes(),
                    "Pair resolved"
                );
                if let Some(snapshot) = state.snapshot(self.timer.elapsed()) {
                    self.storage.save_current_game(&snapshot);
                }
                let _ = self.events.send(SessionEvent::PairResolved { matched });
            }
            SettleOutcome::Completed => {
                let _ = self.events.send(SessionEvent::PairResolved { matched });
                let summary = self.complete(&mut state);
                let _ = self.events.send(SessionEvent::Completed(Box::new(summary)));
            }
        }
    }

    fn complete(&self, state: &mut SessionState) -> GameSummary {
        let elapsed_secs = self.timer.stop();
        let turns = state.board.turns();
        let mistakes = state.board.mistakes();
        let score = ScoreEngine::calculate(elapsed_secs, mistakes, state.difficulty);

        let previous_best = self
            .storage
            .load_performance_metrics()
            .best_score(state.difficulty);
        let personal_best = ScoreEngine::compare_to_personal_best(score.final_score, previous_best);

        let record = SessionRecord {
            id: state.id,
            difficulty: state.difficulty,
            start_time: state.started_at,
            end_time: Utc::now(),
            time_elapsed: elapsed_secs,
            score: score.final_score,
            mistakes,
            turns,
            stars: score.star_rating,
            max_possible_score: score.max_score,
            completed: true,
            card_pairs: state.difficulty.level().total_pairs,
        };
        self.storage.save_game_session(&record);
        self.storage.clear_current_game();

        info!(
            session = %state.id,
            difficulty = %state.difficulty,
            elapsed_secs,
            turns,
            mistakes,
            score = score.final_score,
            stars = score.star_rating,
            new_best = personal_best.is_new_best,
            "Game completed"
        );

        let summary = GameSummary {
            session_id: state.id,
            difficulty: state.difficulty,
            elapsed_secs,
            turns,
            mistakes,
            performance_level: ScoreEngine::performance_level(score.percentage_of_max),
            score,
            personal_best,
            record,
        };
        state.summary = Some(summary.clone());
        summary
    }
}

/// Handle to one game in progress. Cheap to clone.
#[derive(Clone)]
pub struct GameSession {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("GameSession")
            .field("id", &state.id)
            .field("difficulty", &state.difficulty)
            .field("phase", &state.board.phase())
            .field("turns", &state.board.turns())
            .field("mistakes", &state.board.mistakes())
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Create an idle session.
    #[must_use]
    pub fn new(config: &PairsConfig, storage: GameStorage) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let timer = GameTimer::new(config.timer.clone());

        let ticks = events.clone();
        // Never unsubscribed; the observer goes away with the timer.
        timer.subscribe(move |elapsed| {
            let _ = ticks.send(SessionEvent::Tick(elapsed));
        });

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::idle()),
                timer,
                storage,
                events,
                config: config.game.clone(),
            }),
        }
    }

    /// Start a fresh game, abandoning any game in progress.
    pub fn start(&self, difficulty: Difficulty) -> SessionId {
        let deck = build_deck(difficulty.level(), &mut thread_rng());
        let mut state = self.shared.state.lock();
        self.reset(&mut state);

        state.id = SessionId::new();
        state.difficulty = difficulty;
        state.started_at = Utc::now();
        state.board.start(deck);
        self.shared.timer.start(state.id);

        info!(
            session = %state.id,
            difficulty = %difficulty,
            cards = state.board.cards().len(),
            "Game started"
        );
        state.id
    }

    /// Continue a saved game.
    ///
    /// Returns `false` (and leaves the session untouched) if the snapshot
    /// does not describe a playable board for its difficulty.
    pub fn resume(&self, snapshot: GameSnapshot) -> bool {
        let level = snapshot.difficulty.level();
        let deck = Deck::from_cards(snapshot.cards);
        if !deck.is_well_formed(level) {
            warn!(
                session = %snapshot.session_id,
                difficulty = %snapshot.difficulty,
                cards = deck.len(),
                "Saved game is not a valid deck; not resuming"
            );
            return false;
        }
        let board = Board::restore(deck, snapshot.turns, snapshot.mistakes);
        if board.phase() != Phase::Playing {
            warn!(session = %snapshot.session_id, "Saved game is already finished; not resuming");
            return false;
        }

        let mut state = self.shared.state.lock();
        self.reset(&mut state);
        state.id = snapshot.session_id;
        state.difficulty = snapshot.difficulty;
        state.started_at = snapshot.started_at;
        state.board = board;
        self.shared
            .timer
            .start_from(state.id, Duration::from_secs(snapshot.elapsed_secs));

        info!(
            session = %state.id,
            difficulty = %state.difficulty,
            turns = snapshot.turns,
            elapsed_secs = snapshot.elapsed_secs,
            "Game resumed"
        );
        true
    }

    fn reset(&self, state: &mut SessionState) {
        state.settle = None;
        state.pending_match = None;
        state.summary = None;
        self.shared.timer.stop();
        state.board = Board::new();
    }

    /// Choose a card. Ineligible picks are ignored.
    pub fn select(&self, card: CardId) -> SelectOutcome {
        let mut state = self.shared.state.lock();
        let outcome = state.board.select(card);

        if let SelectOutcome::PairPicked { first, second, matched } = outcome {
            debug!(session = %state.id, %first, %second, matched, "Pair picked");
            state.pending_match = Some(matched);
            let weak: Weak<Shared> = Arc::downgrade(&self.shared);
            state.settle = Some(ScheduledTask::after(
                self.shared.config.settle_delay(),
                async move {
                    if let Some(shared) = weak.upgrade() {
                        shared.settle();
                    }
                },
            ));
        }
        outcome
    }

    /// Pause the clock and save the game.
    pub fn pause(&self) {
        let state = self.shared.state.lock();
        self.shared.timer.pause();
        if let Some(snapshot) = state.snapshot(self.shared.timer.elapsed()) {
            self.shared.storage.save_current_game(&snapshot);
        }
    }

    /// Restart the clock after [`pause`](Self::pause).
    pub fn resume_timer(&self) {
        self.shared.timer.resume();
    }

    /// Resumable snapshot of the game in progress.
    #[must_use]
    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.shared.state.lock().snapshot(self.shared.timer.elapsed())
    }

    /// Results, once the game is complete.
    #[must_use]
    pub fn summary(&self) -> Option<GameSummary> {
        self.shared.state.lock().summary.clone()
    }

    /// Run `read` against the board and its difficulty under one lock, so
    /// everything it sees belongs to the same moment of play.
    pub fn with_board<R>(&self, read: impl FnOnce(&Board, Difficulty) -> R) -> R {
        let state = self.shared.state.lock();
        read(&state.board, state.difficulty)
    }

    /// Cards in board order.
    #[must_use]
    pub fn cards(&self) -> Vec<Card> {
        self.shared.state.lock().board.cards().to_vec()
    }

    /// Whether a card is face-up (matched or currently chosen).
    #[must_use]
    pub fn is_revealed(&self, card: CardId) -> bool {
        self.shared.state.lock().board.is_revealed(card)
    }

    /// Whether input is blocked by a pending resolution.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.shared.state.lock().board.is_locked()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.state.lock().board.phase()
    }

    /// Resolved turns.
    #[must_use]
    pub fn turns(&self) -> u32 {
        self.shared.state.lock().board.turns()
    }

    /// Mismatches.
    #[must_use]
    pub fn mistakes(&self) -> u32 {
        self.shared.state.lock().board.mistakes()
    }

    /// Current session id.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.shared.state.lock().id
    }

    /// Current difficulty.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.shared.state.lock().difficulty
    }

    /// Elapsed whole seconds.
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.shared.timer.elapsed()
    }

    /// Elapsed time as `MM:SS`.
    #[must_use]
    pub fn formatted_time(&self) -> String {
        self.shared.timer.formatted_time()
    }

    /// Whether the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.timer.is_paused()
    }

    /// Storage this session persists to.
    #[must_use]
    pub fn storage(&self) -> &GameStorage {
        &self.shared.storage
    }

    /// Subscribe to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::sleep;

    const PAST_SETTLE: Duration = Duration::from_millis(1_100);

    fn session() -> GameSession {
        GameSession::new(&PairsConfig::default(), GameStorage::in_memory())
    }

    fn a_pair(session: &GameSession) -> (CardId, CardId) {
        let cards = session.cards();
        let first = cards.iter().find(|c| !c.matched).expect("unmatched");
        let second = cards
            .iter()
            .find(|c| c.face == first.face && c.id != first.id)
            .expect("partner");
        (first.id, second.id)
    }

    fn a_mismatch(session: &GameSession) -> (CardId, CardId) {
        let cards = session.cards();
        let first = cards.iter().find(|c| !c.matched).expect("unmatched");
        let second = cards
            .iter()
            .find(|c| !c.matched && c.face != first.face)
            .expect("other face");
        (first.id, second.id)
    }

    async fn play_pair(session: &GameSession) {
        let (a, b) = a_pair(session);
        session.select(a);
        session.select(b);
        sleep(PAST_SETTLE).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_builds_board() {
        let game = session();
        assert_eq!(game.phase(), Phase::Idle);
        game.start(Difficulty::Medium);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.cards().len(), 16);
        assert_eq!(game.turns(), 0);
        assert!(game.summary().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn lock_holds_until_settle() {
        let game = session();
        game.start(Difficulty::Easy);
        let (a, b) = a_mismatch(&game);
        let third = game
            .cards()
            .iter()
            .find(|c| c.id != a && c.id != b)
            .expect("third")
            .id;

        game.select(a);
        game.select(b);
        assert!(game.is_locked());
        assert_eq!(game.mistakes(), 1);

        sleep(Duration::from_millis(500)).await;
        assert!(matches!(game.select(third), SelectOutcome::Ignored(_)));
        assert!(game.is_revealed(b));

        sleep(Duration::from_millis(600)).await;
        assert!(!game.is_locked());
        assert_eq!(game.turns(), 1);
        assert!(!game.is_revealed(b));
        assert_eq!(game.select(third), SelectOutcome::FirstPick(third));
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_saves_snapshot() {
        let game = session();
        let id = game.start(Difficulty::Easy);
        play_pair(&game).await;

        let saved = game.storage().load_current_game().expect("snapshot saved");
        assert_eq!(saved.session_id, id);
        assert_eq!(saved.turns, 1);
        assert_eq!(saved.cards.iter().filter(|c| c.matched).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn full_game_scores_and_persists() {
        let game = session();
        let mut events = game.subscribe();
        game.start(Difficulty::Easy);

        for _ in 0..6 {
            play_pair(&game).await;
        }

        assert_eq!(game.phase(), Phase::Complete);
        let summary = game.summary().expect("summary");
        assert_eq!(summary.turns, 6);
        assert_eq!(summary.mistakes, 0);
        assert_eq!(summary.elapsed_secs, 6);
        assert_eq!(summary.score.time_bonus, 540);
        assert_eq!(summary.score.final_score, 1540);
        assert_eq!(summary.score.star_rating, 3);
        assert!(summary.personal_best.is_new_best);
        assert_eq!(summary.performance_level, PerformanceLevel::Excellent);
        assert_eq!(summary.record.card_pairs, 6);

        let storage = game.storage();
        assert_eq!(storage.load_history().len(), 1);
        assert!(storage.load_current_game().is_none(), "snapshot cleared");
        assert_eq!(
            storage.load_performance_metrics().best_score(Difficulty::Easy),
            Some(1540)
        );

        let mut completed = 0;
        let mut resolved = 0;
        loop {
            match events.try_recv() {
                Ok(SessionEvent::Completed(s)) => {
                    completed += 1;
                    assert_eq!(s.score.final_score, 1540);
                }
                Ok(SessionEvent::PairResolved { matched }) => {
                    assert!(matched);
                    resolved += 1;
                }
                Ok(SessionEvent::Tick(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => {}
            }
        }
        assert_eq!(completed, 1);
        assert_eq!(resolved, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_stops_at_completion() {
        let game = session();
        game.start(Difficulty::Easy);
        for _ in 0..6 {
            play_pair(&game).await;
        }
        sleep(Duration::from_secs(30)).await;
        assert_eq!(game.summary().expect("summary").elapsed_secs, 6);
        assert_eq!(game.elapsed(), 0, "timer released the session");
    }

    #[tokio::test(start_paused = true)]
    async fn equal_score_is_not_a_new_best() {
        let storage = GameStorage::in_memory();
        let config = PairsConfig::default();

        for expect_new_best in [true, false] {
            let game = GameSession::new(&config, storage.clone());
            game.start(Difficulty::Easy);
            for _ in 0..6 {
                play_pair(&game).await;
            }
            let summary = game.summary().expect("summary");
            assert_eq!(summary.personal_best.is_new_best, expect_new_best);
        }
        assert_eq!(storage.load_history().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_pending_settle() {
        let game = session();
        game.start(Difficulty::Easy);
        let (a, b) = a_mismatch(&game);
        game.select(a);
        game.select(b);

        let mut events = game.subscribe();
        game.start(Difficulty::Hard);
        sleep(Duration::from_millis(1_500)).await;

        assert_eq!(game.turns(), 0);
        assert_eq!(game.mistakes(), 0);
        assert!(!game.is_locked());
        while let Ok(event) = events.try_recv() {
            assert!(matches!(event, SessionEvent::Tick(_)), "unexpected {event:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_broadcast() {
        let game = session();
        let mut events = game.subscribe();
        game.start(Difficulty::Easy);
        sleep(Duration::from_millis(2_500)).await;

        assert_eq!(events.try_recv().ok(), Some(SessionEvent::Tick(1)));
        assert_eq!(events.try_recv().ok(), Some(SessionEvent::Tick(2)));
        assert_eq!(game.formatted_time(), "00:02");
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_clock_and_saves() {
        let game = session();
        game.start(Difficulty::Easy);
        sleep(Duration::from_millis(2_100)).await;
        game.pause();
        assert!(game.is_paused());
        sleep(Duration::from_secs(10)).await;
        assert_eq!(game.elapsed(), 2);
        assert_eq!(
            game.storage().load_current_game().map(|s| s.elapsed_secs),
            Some(2)
        );

        game.resume_timer();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(game.elapsed(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_restores_saved_game() {
        let storage = GameStorage::in_memory();
        let first = GameSession::new(&PairsConfig::default(), storage.clone());
        let id = first.start(Difficulty::Easy);
        sleep(Duration::from_secs(3)).await;
        play_pair(&first).await;
        let saved = storage.load_current_game().expect("saved");
        drop(first);

        let second = GameSession::new(&PairsConfig::default(), storage.clone());
        assert!(second.resume(saved));
        assert_eq!(second.id(), id);
        assert_eq!(second.turns(), 1);
        assert_eq!(second.elapsed(), 4);
        for _ in 0..5 {
            play_pair(&second).await;
        }
        let summary = second.summary().expect("summary");
        assert_eq!(summary.turns, 6);
        assert_eq!(summary.session_id, id);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_rejects_unplayable_snapshots() {
        let game = session();
        game.start(Difficulty::Easy);
        let snapshot = game.snapshot().expect("snapshot");
        let rejected = |edit: fn(&mut GameSnapshot)| {
            let mut bad = snapshot.clone();
            edit(&mut bad);
            let other = session();
            let accepted = other.resume(bad);
            assert_eq!(other.phase(), Phase::Idle);
            !accepted
        };

        assert!(rejected(|s| s.cards.truncate(4)));
        assert!(rejected(|s| {
            for card in &mut s.cards {
                card.matched = true;
            }
        }));
        // a third copy of one face leaves another face unpairable
        assert!(rejected(|s| {
            let i = s.cards.iter().position(|c| c.face.0 == 1).expect("face 1");
            s.cards[i].face.0 = 0;
        }));
        assert!(rejected(|s| {
            for card in s.cards.iter_mut().filter(|c| c.face.0 == 0) {
                card.face.0 = 40;
            }
        }));
        assert!(rejected(|s| s.cards[1].id = s.cards[0].id));
        assert!(rejected(|s| s.cards[0].matched = true));
        assert!(rejected(|s| s.difficulty = Difficulty::Medium));

        assert!(session().resume(snapshot));
    }

    #[tokio::test(start_paused = true)]
    async fn with_board_sees_one_state() {
        let game = session();
        game.start(Difficulty::Easy);
        let (a, b) = a_mismatch(&game);
        game.select(a);
        game.select(b);

        let (locked, face_up, difficulty) = game.with_board(|board, difficulty| {
            let face_up = board.cards().iter().filter(|c| board.is_revealed(c.id)).count();
            (board.is_locked(), face_up, difficulty)
        });
        assert!(locked);
        assert_eq!(face_up, 2);
        assert_eq!(difficulty, Difficulty::Easy);

        sleep(PAST_SETTLE).await;
        assert_eq!(game.with_board(|board, _| (board.is_locked(), board.turns())), (false, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_during_resolution_counts_pending_turn() {
        let game = session();
        game.start(Difficulty::Easy);
        let (a, b) = a_mismatch(&game);
        game.select(a);
        game.select(b);
        let snapshot = game.snapshot().expect("snapshot");
        assert_eq!(snapshot.turns, 1);
        assert_eq!(snapshot.mistakes, 1);
    }
}
