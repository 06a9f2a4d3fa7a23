//! Intent dispatch between the renderer and a [`GameSession`].

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use pairs_core::board::SelectOutcome;
use pairs_core::config::PairsConfig;
use pairs_core::difficulty::Difficulty;
use pairs_core::persistence::{GameStorage, KeyValueStore, Preferences};
use pairs_core::session::{GameSession, SessionEvent};
use pairs_core::types::{CardId, SessionId};

use crate::intents::{IntentOutcome, UserIntent};
use crate::sync::PreferenceSync;
use crate::view::{BoardView, SummaryView};

/// Owns the current session and the player's preferences.
#[derive(Debug)]
pub struct GameController {
    session: GameSession,
    storage: GameStorage,
    preferences: PreferenceSync,
}

impl GameController {
    /// Controller over `store`. Must be called from within a tokio runtime.
    ///
    /// No game is started; call [`resume_saved`](Self::resume_saved) or
    /// [`new_game`](Self::new_game).
    #[must_use]
    pub fn new(config: &PairsConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_storage(config, GameStorage::new(store, config.storage.clone()))
    }

    /// Controller over the backend named in `config.storage`.
    #[must_use]
    pub fn from_config(config: &PairsConfig) -> Self {
        Self::with_storage(config, GameStorage::from_config(&config.storage))
    }

    fn with_storage(config: &PairsConfig, storage: GameStorage) -> Self {
        let preferences = PreferenceSync::spawn(&storage);
        Self {
            session: GameSession::new(config, storage.clone()),
            storage,
            preferences,
        }
    }

    /// Handle one intent.
    pub fn dispatch(&self, intent: UserIntent) -> IntentOutcome {
        debug!(?intent, "Dispatching intent");
        match intent {
            UserIntent::NewGame(difficulty) => IntentOutcome::Started(self.new_game(difficulty)),
            UserIntent::SelectCard(card) => IntentOutcome::Selected(self.select_card(card)),
            UserIntent::ChangeDifficulty(id) => IntentOutcome::Started(self.change_difficulty(&id)),
            UserIntent::Pause => {
                self.session.pause();
                IntentOutcome::Paused
            }
            UserIntent::Resume => {
                self.session.resume_timer();
                IntentOutcome::Resumed
            }
        }
    }

    /// Abandon any game in progress and start another, on `difficulty` or
    /// the preferred default.
    pub fn new_game(&self, difficulty: Option<Difficulty>) -> SessionId {
        let difficulty = difficulty.unwrap_or(self.preferences.current().default_difficulty);
        self.storage.clear_current_game();
        self.session.start(difficulty)
    }

    /// Forward a card click.
    pub fn select_card(&self, card: CardId) -> SelectOutcome {
        self.session.select(card)
    }

    /// Remember `id` as the default difficulty and start a game on it.
    pub fn change_difficulty(&self, id: &str) -> SessionId {
        let difficulty = Difficulty::from_id(id);
        let preferences = Preferences {
            default_difficulty: difficulty,
            ..self.preferences.current()
        };
        self.storage.save_preferences(&preferences);
        self.preferences.set_local(preferences);
        info!(requested = id, %difficulty, "Difficulty changed");
        self.new_game(Some(difficulty))
    }

    /// Continue the saved game, if there is a playable one.
    pub fn resume_saved(&self) -> bool {
        self.storage
            .load_current_game()
            .is_some_and(|snapshot| self.session.resume(snapshot))
    }

    /// Replace the stored preferences.
    pub fn set_preferences(&self, preferences: Preferences) {
        self.storage.save_preferences(&preferences);
        self.preferences.set_local(preferences);
    }

    /// Board to draw.
    #[must_use]
    pub fn view(&self) -> BoardView {
        BoardView::capture(&self.session, self.preferences.current().show_timer)
    }

    /// Results screen, once the game is complete.
    #[must_use]
    pub fn summary(&self) -> Option<SummaryView> {
        self.session.summary().as_ref().map(SummaryView::from)
    }

    /// Current preferences.
    #[must_use]
    pub fn preferences(&self) -> Preferences {
        self.preferences.current()
    }

    /// Session events for redraw scheduling.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }
}
