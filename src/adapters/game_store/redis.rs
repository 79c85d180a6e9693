//! Redis-backed game store for multi-server deployments.
//!
//! ## Keys
//!
//! | Key | Value | Expiry |
//! |-----|-------|--------|
//! | `{ns}:game:{id}` | JSON-encoded game | session TTL, refreshed on mutation |
//! | `{ns}:usergame:{user}` | game id | session TTL, refreshed on mutation |
//! | `{ns}:lock:game:{id}` | lock token | lock lease TTL |
//!
//! Idle games disappear through key expiry, so there is no sweep task.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, IntoConnectionInfo};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::domain::foundation::{GameId, Timestamp, UserId};
use crate::domain::game::{Game, GameRejection, GameSnapshot, LobbyEntry};
use crate::ports::{GameStore, GameStoreError};

use super::config::RedisGameStoreConfig;
use super::lock::RedisLock;
use super::{coin_flip, log_move, rejected};

const SCAN_BATCH: u32 = 100;

/// Claim a fresh game key and point the host's index at it in one step.
///
/// KEYS: game key, user-index key. ARGV: payload, game id, TTL seconds.
/// Returns 0 without touching the index when the game key is taken.
const CREATE_SCRIPT: &str = r#"
if redis.call("SET", KEYS[1], ARGV[1], "NX", "EX", ARGV[3]) then
    redis.call("SET", KEYS[2], ARGV[2], "EX", ARGV[3])
    return 1
else
    return 0
end
"#;

/// Await a Redis command under a deadline.
///
/// Failures and timeouts both surface as `Unavailable`, never as a missing
/// game.
pub(super) async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    command: impl Future<Output = redis::RedisResult<T>>,
) -> Result<T, GameStoreError> {
    match tokio::time::timeout(limit, command).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!(operation, error = %e, "redis command failed");
            Err(GameStoreError::unavailable(format!("{operation}: {e}")))
        }
        Err(_) => {
            tracing::error!(
                operation,
                timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                "redis command timed out"
            );
            Err(GameStoreError::unavailable(format!(
                "{operation}: timed out after {limit:?}"
            )))
        }
    }
}

fn decode(game_id: &GameId, raw: &str) -> Result<Game, GameStoreError> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(game_id = %game_id, error = %e, "stored game failed to decode");
        GameStoreError::Corrupted {
            game_id: game_id.clone(),
            reason: e.to_string(),
        }
    })
}

fn encode(game: &Game) -> Result<String, GameStoreError> {
    serde_json::to_string(game).map_err(|e| GameStoreError::Corrupted {
        game_id: game.id().clone(),
        reason: e.to_string(),
    })
}

/// Redis-backed [`GameStore`].
///
/// Every mutation runs inside the game's [`RedisLock`], so servers sharing
/// one Redis never interleave read-modify-write cycles on the same game.
#[derive(Clone)]
pub struct RedisGameStore {
    conn: MultiplexedConnection,
    lock: RedisLock,
    config: RedisGameStoreConfig,
}

impl RedisGameStore {
    /// Open a connection and check it with `PING`.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the address is invalid or the server does not answer
    /// within the command timeout.
    pub async fn connect(
        info: impl IntoConnectionInfo,
        config: RedisGameStoreConfig,
    ) -> Result<Self, GameStoreError> {
        let client = redis::Client::open(info)
            .map_err(|e| GameStoreError::unavailable(format!("invalid redis address: {e}")))?;

        let mut conn = bounded(
            config.command_timeout,
            "connect",
            client.get_multiplexed_tokio_connection(),
        )
        .await?;
        let _: String = bounded(
            config.command_timeout,
            "ping",
            redis::cmd("PING").query_async(&mut conn),
        )
        .await?;

        tracing::info!(namespace = %config.key_namespace, "connected to redis game store");
        Ok(Self::new(conn, config))
    }

    /// Wrap an existing connection; no round trip is made.
    pub fn new(conn: MultiplexedConnection, config: RedisGameStoreConfig) -> Self {
        let lock = RedisLock::new(conn.clone(), config.lock, config.command_timeout);
        Self { conn, lock, config }
    }

    pub fn config(&self) -> &RedisGameStoreConfig {
        &self.config
    }

    pub fn lock(&self) -> &RedisLock {
        &self.lock
    }

    pub fn game_key(&self, game_id: &GameId) -> String {
        format!("{}:game:{}", self.config.key_namespace, game_id)
    }

    pub fn user_key(&self, user: &UserId) -> String {
        format!("{}:usergame:{}", self.config.key_namespace, user)
    }

    pub fn lock_key(&self, game_id: &GameId) -> String {
        format!("{}:lock:game:{}", self.config.key_namespace, game_id)
    }

    fn game_key_prefix(&self) -> String {
        format!("{}:game:", self.config.key_namespace)
    }

    /// Delete every key under this store's namespace.
    ///
    /// Meant for test teardown; other namespaces are untouched.
    pub async fn purge_namespace(&self) -> Result<usize, GameStoreError> {
        let pattern = format!("{}:*", self.config.key_namespace);
        let keys = self.scan_keys(&pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let deleted: usize = bounded(self.timeout(), "purge", conn.del(&keys)).await?;
        Ok(deleted)
    }

    fn timeout(&self) -> Duration {
        self.config.command_timeout
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, GameStoreError> {
        let mut conn = self.conn.clone();
        let mut seen = HashSet::new();
        let mut cursor: u64 = 0;

        loop {
            let mut scan = redis::cmd("SCAN");
            scan.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH);
            let (next, batch): (u64, Vec<String>) =
                bounded(self.timeout(), "scan", scan.query_async(&mut conn)).await?;

            // SCAN may hand back a key more than once.
            seen.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(seen.into_iter().collect())
    }

    async fn load(&self, game_id: &GameId) -> Result<Option<Game>, GameStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> =
            bounded(self.timeout(), "load game", conn.get(self.game_key(game_id))).await?;
        raw.map(|raw| decode(game_id, &raw)).transpose()
    }

    async fn current_game_of(&self, user: &UserId) -> Result<Option<GameId>, GameStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> =
            bounded(self.timeout(), "load user index", conn.get(self.user_key(user))).await?;

        Ok(raw.and_then(|raw| match GameId::new(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(user_id = %user, error = %e, "ignoring malformed user index entry");
                None
            }
        }))
    }

    /// Write the game back and refresh index expiry in one transaction.
    ///
    /// `register` is pointed at the game; other participants only have
    /// their entries' TTL refreshed.
    async fn persist(&self, game: &Game, register: Option<&UserId>) -> Result<(), GameStoreError> {
        let payload = encode(game)?;
        let ttl = self.config.session_ttl_secs();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(self.game_key(game.id()))
            .arg(payload)
            .arg("EX")
            .arg(ttl)
            .ignore();
        if let Some(user) = register {
            pipe.cmd("SET")
                .arg(self.user_key(user))
                .arg(game.id().as_str())
                .arg("EX")
                .arg(ttl)
                .ignore();
        }
        for participant in game.participants() {
            pipe.cmd("EXPIRE")
                .arg(self.user_key(participant))
                .arg(ttl)
                .ignore();
        }

        let mut conn = self.conn.clone();
        bounded(self.timeout(), "persist game", pipe.query_async::<_, ()>(&mut conn)).await
    }
}

#[async_trait]
impl GameStore for RedisGameStore {
    async fn create_game(&self, user: &UserId) -> Result<GameSnapshot, GameStoreError> {
        let ttl = self.config.session_ttl_secs();
        let attempts = self.config.create_attempts.max(1);

        for _ in 0..attempts {
            let game = Game::new(GameId::generate(), user.clone(), Timestamp::now());
            let payload = encode(&game)?;

            let script = redis::Script::new(CREATE_SCRIPT);
            let mut claim = script.key(self.game_key(game.id()));
            claim
                .key(self.user_key(user))
                .arg(payload)
                .arg(game.id().as_str())
                .arg(ttl);
            let mut conn = self.conn.clone();
            let created: i64 =
                bounded(self.timeout(), "create game", claim.invoke_async(&mut conn)).await?;

            if created == 0 {
                tracing::debug!(game_id = %game.id(), "game id already taken; regenerating");
                continue;
            }

            tracing::info!(game_id = %game.id(), user_id = %user, "game created");
            return Ok(game.snapshot());
        }

        tracing::error!(user_id = %user, attempts, "no free game id found");
        Err(GameStoreError::unavailable(format!(
            "no free game id after {attempts} attempts"
        )))
    }

    async fn list_open_games(&self, user: &UserId) -> Result<Vec<LobbyEntry>, GameStoreError> {
        let prefix = self.game_key_prefix();
        let keys = self.scan_keys(&format!("{prefix}*")).await?;
        let mut conn = self.conn.clone();
        let mut open = Vec::new();

        for key in keys {
            let Some(game_id) = key
                .strip_prefix(&prefix)
                .and_then(|suffix| GameId::new(suffix).ok())
            else {
                tracing::warn!(key = %key, "skipping key with malformed game id");
                continue;
            };

            let raw: Option<String> =
                bounded(self.timeout(), "load game", conn.get(&key)).await?;
            // Expired between SCAN and GET.
            let Some(raw) = raw else {
                continue;
            };
            let Ok(game) = decode(&game_id, &raw) else {
                continue;
            };

            if game.is_open() {
                open.push(game.lobby_entry());
            }
        }

        open.sort_by(|a, b| (a.waiting_since, &a.game_id).cmp(&(b.waiting_since, &b.game_id)));
        tracing::debug!(user_id = %user, open = open.len(), "listed open games");
        Ok(open)
    }

    async fn join_game(
        &self,
        user: &UserId,
        game_id: &GameId,
    ) -> Result<GameSnapshot, GameStoreError> {
        let critical = async {
            let mut game = self.load(game_id).await?.ok_or_else(|| {
                rejected("join", user, GameRejection::GameNotFound(game_id.clone()))
            })?;
            game.join(user.clone(), coin_flip(), Timestamp::now())
                .map_err(|r| rejected("join", user, r))?;
            self.persist(&game, Some(user)).await?;

            let snapshot = game.snapshot();
            tracing::info!(game_id = %game_id, user_id = %user, first = %snapshot.turn, "game joined");
            Ok(snapshot)
        };

        self.lock
            .with_lock(&self.lock_key(game_id), game_id, critical)
            .await
    }

    async fn apply_move(
        &self,
        user: &UserId,
        coordinate: &str,
    ) -> Result<GameSnapshot, GameStoreError> {
        let game_id = self
            .current_game_of(user)
            .await?
            .ok_or_else(|| rejected("move", user, GameRejection::NotInGame))?;

        let critical = async {
            let mut game = self.load(&game_id).await?.ok_or_else(|| {
                rejected("move", user, GameRejection::GameNotFound(game_id.clone()))
            })?;
            let outcome = game
                .apply_move(user, coordinate, Timestamp::now())
                .map_err(|r| rejected("move", user, r))?;
            self.persist(&game, None).await?;

            let snapshot = game.snapshot();
            log_move(&snapshot, user, coordinate, outcome);
            Ok(snapshot)
        };

        self.lock
            .with_lock(&self.lock_key(&game_id), &game_id, critical)
            .await
    }
}

impl std::fmt::Debug for RedisGameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisGameStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::Mark;
    use proptest::prelude::*;

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    #[test]
    fn decode_reads_what_encode_writes() {
        let mut game = Game::new(GameId::new("g1").unwrap(), user("alice"), Timestamp::now());
        game.join(user("bob"), Mark::O, Timestamp::now()).unwrap();

        let raw = encode(&game).unwrap();
        assert_eq!(decode(game.id(), &raw).unwrap(), game);
    }

    /// Alice hosts, Bob joins with `first` opening, then `moves` are played
    /// by whoever holds the turn.
    fn played(first: Mark, moves: &[&str]) -> Game {
        let mut game = Game::new(GameId::new("g1").unwrap(), user("alice"), Timestamp::now());
        game.join(user("bob"), first, Timestamp::now()).unwrap();
        for label in moves {
            let turn = game.turn().clone();
            game.apply_move(&turn, label, Timestamp::now()).unwrap();
        }
        game
    }

    fn assert_round_trips(game: &Game) {
        let back = decode(game.id(), &encode(game).unwrap()).unwrap();
        assert_eq!(&back, game);
        assert_eq!(back.updated_at(), game.updated_at());
        assert_eq!(back.board(), game.board());
        assert_eq!(back.player_o(), game.player_o());
        assert_eq!(back.winner(), game.winner());
    }

    #[test]
    fn waiting_game_survives_storage() {
        let game = Game::new(GameId::new("g1").unwrap(), user("alice"), Timestamp::now());
        assert!(game.player_o().is_none());
        assert_round_trips(&game);
    }

    #[test]
    fn mid_game_board_survives_storage() {
        let game = played(Mark::O, &["B2", "A1", "C3"]);
        assert_eq!(game.board().marked_count(), 3);
        assert!(!game.is_finished());
        assert_round_trips(&game);
    }

    #[test]
    fn won_game_survives_storage() {
        let game = played(Mark::X, &["A1", "B1", "A2", "B2", "A3"]);
        assert_eq!(game.winner(), Some(&user("alice")));
        assert_round_trips(&game);
    }

    #[test]
    fn drawn_game_survives_storage() {
        let game = played(
            Mark::X,
            &["A1", "A2", "A3", "B2", "B1", "B3", "C2", "C1", "C3"],
        );
        assert!(game.is_finished());
        assert!(game.winner().is_none());
        assert_round_trips(&game);
    }

    proptest! {
        #[test]
        fn every_reachable_game_survives_storage(
            order in Just(["A1", "A2", "A3", "B1", "B2", "B3", "C1", "C2", "C3"].to_vec())
                .prop_shuffle(),
            len in 0usize..=9,
            host_opens in any::<bool>(),
        ) {
            let first = if host_opens { Mark::X } else { Mark::O };
            let mut game = played(first, &[]);
            for label in order.iter().take(len) {
                if game.is_finished() {
                    break;
                }
                let turn = game.turn().clone();
                game.apply_move(&turn, label, Timestamp::now()).unwrap();
            }

            let back = decode(game.id(), &encode(&game).unwrap()).unwrap();
            prop_assert_eq!(back, game);
        }
    }

    #[test]
    fn decode_failure_is_corruption_not_absence() {
        let id = GameId::new("g1").unwrap();
        let err = decode(&id, "{\"id\":\"g1\",\"board\":").unwrap_err();
        assert!(matches!(err, GameStoreError::Corrupted { ref game_id, .. } if game_id == &id));
    }

    #[tokio::test]
    async fn bounded_maps_timeout_to_unavailable() {
        let never = std::future::pending::<redis::RedisResult<()>>();
        let err = bounded(Duration::from_millis(10), "stall", never)
            .await
            .unwrap_err();
        assert!(matches!(err, GameStoreError::Unavailable(ref m) if m.contains("timed out")));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn bounded_maps_redis_error_to_unavailable() {
        let failing = async {
            Err::<(), _>(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            )))
        };
        let err = bounded(Duration::from_secs(1), "get", failing).await.unwrap_err();
        assert!(matches!(err, GameStoreError::Unavailable(ref m) if m.starts_with("get:")));
    }

    #[tokio::test]
    async fn connect_to_invalid_address_is_unavailable() {
        let config = RedisGameStoreConfig::default();
        let err = RedisGameStore::connect("not a url", config).await.unwrap_err();
        assert!(matches!(err, GameStoreError::Unavailable(_)));
    }
}
