//! GameCommandHandler - Dispatches one chat command to one store operation.
//!
//! Incoming messages carry either free text (`/new`, `/list`) or a button
//! action (`Join:<id>`, `Move:<coordinate>`).

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, GameId, UserId, ValidationError};
use crate::domain::game::{GameSnapshot, LobbyEntry};
use crate::ports::{GameStore, GameStoreError};

const NEW_GAME: &str = "/new";
const LIST_GAMES: &str = "/list";
const JOIN_PREFIX: &str = "Join:";
const MOVE_PREFIX: &str = "Move:";

/// A parsed user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    NewGame,
    ListGames,
    Join(GameId),
    /// Raw coordinate label; the store validates it.
    Move(String),
}

impl GameCommand {
    /// Parse a message's text or action field.
    ///
    /// Text wins when both are present.
    ///
    /// # Errors
    ///
    /// - `UnknownCommand` for anything outside the vocabulary
    /// - `InvalidGameId` when a join names a malformed id
    pub fn parse(text: Option<&str>, action: Option<&str>) -> Result<Self, GameCommandError> {
        if let Some(text) = text {
            return match text {
                NEW_GAME => Ok(GameCommand::NewGame),
                LIST_GAMES => Ok(GameCommand::ListGames),
                other => Err(GameCommandError::UnknownCommand(other.to_string())),
            };
        }

        let action = action.unwrap_or_default();
        if let Some(id) = action.strip_prefix(JOIN_PREFIX) {
            return Ok(GameCommand::Join(GameId::new(id)?));
        }
        if let Some(coordinate) = action.strip_prefix(MOVE_PREFIX) {
            return Ok(GameCommand::Move(coordinate.to_string()));
        }
        Err(GameCommandError::UnknownCommand(action.to_string()))
    }

    /// Button action that produces this command, if it has one.
    pub fn action(&self) -> Option<String> {
        match self {
            GameCommand::Join(id) => Some(format!("{JOIN_PREFIX}{id}")),
            GameCommand::Move(coordinate) => Some(format!("{MOVE_PREFIX}{coordinate}")),
            GameCommand::NewGame | GameCommand::ListGames => None,
        }
    }
}

/// What a handled command produced, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Created(GameSnapshot),
    Lobby(Vec<LobbyEntry>),
    Joined(GameSnapshot),
    Moved(GameSnapshot),
}

impl CommandOutcome {
    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        match self {
            CommandOutcome::Created(snapshot)
            | CommandOutcome::Joined(snapshot)
            | CommandOutcome::Moved(snapshot) => Some(snapshot),
            CommandOutcome::Lobby(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GameCommandError {
    #[error("unknown command: '{0}'")]
    UnknownCommand(String),

    #[error("invalid game id: {0}")]
    InvalidGameId(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] GameStoreError),
}

impl GameCommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GameCommandError::UnknownCommand(_) => ErrorCode::UnknownCommand,
            GameCommandError::InvalidGameId(_) => ErrorCode::ValidationFailed,
            GameCommandError::Store(e) => e.code(),
        }
    }
}

/// Handler for parsed game commands.
pub struct GameCommandHandler {
    store: Arc<dyn GameStore>,
}

impl GameCommandHandler {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    /// Run `command` for `user` with exactly one store call.
    pub async fn handle(
        &self,
        user: &UserId,
        command: GameCommand,
    ) -> Result<CommandOutcome, GameCommandError> {
        let outcome = match command {
            GameCommand::NewGame => CommandOutcome::Created(self.store.create_game(user).await?),
            GameCommand::ListGames => {
                CommandOutcome::Lobby(self.store.list_open_games(user).await?)
            }
            GameCommand::Join(game_id) => {
                CommandOutcome::Joined(self.store.join_game(user, &game_id).await?)
            }
            GameCommand::Move(coordinate) => {
                CommandOutcome::Moved(self.store.apply_move(user, &coordinate).await?)
            }
        };
        Ok(outcome)
    }

    /// Parse then handle a raw message.
    pub async fn handle_message(
        &self,
        user: &UserId,
        text: Option<&str>,
        action: Option<&str>,
    ) -> Result<CommandOutcome, GameCommandError> {
        let command = GameCommand::parse(text, action).map_err(|e| {
            tracing::debug!(user_id = %user, error = %e, "unparseable message");
            e
        })?;
        self.handle(user, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::game_store::InMemoryGameStore;
    use crate::domain::game::GameRejection;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    /// Records which store operation ran and fails every call.
    struct RecordingStore {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, op: &'static str) -> GameStoreError {
            self.calls.lock().unwrap().push(op);
            GameStoreError::unavailable("recording store")
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GameStore for RecordingStore {
        async fn create_game(&self, _user: &UserId) -> Result<GameSnapshot, GameStoreError> {
            Err(self.record("create"))
        }

        async fn list_open_games(&self, _user: &UserId) -> Result<Vec<LobbyEntry>, GameStoreError> {
            Err(self.record("list"))
        }

        async fn join_game(
            &self,
            _user: &UserId,
            _game_id: &GameId,
        ) -> Result<GameSnapshot, GameStoreError> {
            Err(self.record("join"))
        }

        async fn apply_move(
            &self,
            _user: &UserId,
            _coordinate: &str,
        ) -> Result<GameSnapshot, GameStoreError> {
            Err(self.record("move"))
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Parsing
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parses_text_commands() {
        assert_eq!(GameCommand::parse(Some("/new"), None).unwrap(), GameCommand::NewGame);
        assert_eq!(GameCommand::parse(Some("/list"), None).unwrap(), GameCommand::ListGames);
    }

    #[test]
    fn parses_actions() {
        assert_eq!(
            GameCommand::parse(None, Some("Join:ab12cd34")).unwrap(),
            GameCommand::Join(GameId::new("ab12cd34").unwrap())
        );
        assert_eq!(
            GameCommand::parse(None, Some("Move:B2")).unwrap(),
            GameCommand::Move("B2".to_string())
        );
    }

    #[test]
    fn text_takes_precedence_over_action() {
        let cmd = GameCommand::parse(Some("/list"), Some("Move:A1")).unwrap();
        assert_eq!(cmd, GameCommand::ListGames);
    }

    #[test]
    fn unknown_text_and_action_are_rejected() {
        assert!(matches!(
            GameCommand::parse(Some("/start"), None),
            Err(GameCommandError::UnknownCommand(ref t)) if t == "/start"
        ));
        assert!(matches!(
            GameCommand::parse(None, Some("Leave:x")),
            Err(GameCommandError::UnknownCommand(_))
        ));
        assert!(matches!(
            GameCommand::parse(None, None),
            Err(GameCommandError::UnknownCommand(_))
        ));
    }

    #[test]
    fn join_with_empty_id_is_invalid() {
        let err = GameCommand::parse(None, Some("Join:")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn action_round_trips_through_parse() {
        for cmd in [
            GameCommand::Join(GameId::new("g1").unwrap()),
            GameCommand::Move("C3".to_string()),
        ] {
            let action = cmd.action().unwrap();
            assert_eq!(GameCommand::parse(None, Some(&action)).unwrap(), cmd);
        }
        assert!(GameCommand::NewGame.action().is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Dispatch
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn each_command_makes_exactly_one_store_call() {
        let store = Arc::new(RecordingStore::new());
        let handler = GameCommandHandler::new(store.clone());
        let alice = user("alice");

        for cmd in [
            GameCommand::NewGame,
            GameCommand::ListGames,
            GameCommand::Join(GameId::new("g1").unwrap()),
            GameCommand::Move("A1".to_string()),
        ] {
            let err = handler.handle(&alice, cmd).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::StoreUnavailable);
        }

        assert_eq!(store.calls(), vec!["create", "list", "join", "move"]);
    }

    #[tokio::test]
    async fn unknown_message_never_reaches_store() {
        let store = Arc::new(RecordingStore::new());
        let handler = GameCommandHandler::new(store.clone());

        let err = handler
            .handle_message(&user("alice"), Some("hello"), None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::UnknownCommand);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn full_message_flow_against_in_memory_store() {
        let handler = GameCommandHandler::new(Arc::new(InMemoryGameStore::with_defaults()));
        let alice = user("alice");
        let bob = user("bob");

        let created = handler.handle_message(&alice, Some("/new"), None).await.unwrap();
        let game_id = created.snapshot().unwrap().id.clone();

        let CommandOutcome::Lobby(lobby) =
            handler.handle_message(&bob, Some("/list"), None).await.unwrap()
        else {
            panic!("expected lobby");
        };
        assert_eq!(lobby.len(), 1);

        let join = GameCommand::Join(game_id).action().unwrap();
        let joined = handler.handle_message(&bob, None, Some(&join)).await.unwrap();
        let first = joined.snapshot().unwrap().turn.clone();

        let moved = handler
            .handle_message(&first, None, Some("Move:B2"))
            .await
            .unwrap();
        assert!(matches!(moved, CommandOutcome::Moved(_)));

        let err = handler
            .handle_message(&first, None, Some("Move:A1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GameCommandError::Store(ref e) if e.rejection() == Some(&GameRejection::NotYourTurn)
        ));
    }
}
