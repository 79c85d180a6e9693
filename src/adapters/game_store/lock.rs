//! Per-game distributed lock on Redis.
//!
//! Acquire is `SET key token NX PX ttl` with a random token. Release runs a
//! compare-and-delete script so a holder whose lease already expired can
//! never delete a lock that someone else now holds.

use std::future::Future;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use uuid::Uuid;

use crate::domain::foundation::GameId;
use crate::domain::game::GameRejection;
use crate::ports::GameStoreError;

use super::config::LockRetryPolicy;
use super::redis::bounded;

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

impl LockRetryPolicy {
    /// Call `try_once` until it yields a value or `attempts` tries are used.
    ///
    /// Sleeps `backoff` between tries, not after the last one. Returns
    /// `Ok(None)` on exhaustion; an error from any try ends the loop at once.
    pub async fn acquire_with<T, E, F, Fut>(&self, mut try_once: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let attempts = self.attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(acquired) = try_once().await? {
                return Ok(Some(acquired));
            }
            if attempt < attempts {
                tokio::time::sleep(self.backoff).await;
            }
        }
        Ok(None)
    }
}

/// Proof of holding one lock key.
#[derive(Debug)]
#[must_use = "a lease must be released"]
pub struct LockLease {
    key: String,
    token: String,
}

impl LockLease {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Lease-based mutual exclusion over one Redis connection.
#[derive(Clone)]
pub struct RedisLock {
    conn: MultiplexedConnection,
    policy: LockRetryPolicy,
    command_timeout: Duration,
}

impl RedisLock {
    pub fn new(conn: MultiplexedConnection, policy: LockRetryPolicy, command_timeout: Duration) -> Self {
        Self {
            conn,
            policy,
            command_timeout,
        }
    }

    pub fn policy(&self) -> &LockRetryPolicy {
        &self.policy
    }

    /// One `SET NX PX` attempt.
    pub async fn try_acquire(&self, key: &str) -> Result<Option<LockLease>, GameStoreError> {
        let token = Uuid::new_v4().to_string();
        let lease_ms = u64::try_from(self.policy.lease_ttl.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(&token).arg("NX").arg("PX").arg(lease_ms);
        let mut conn = self.conn.clone();
        let reply: Option<String> =
            bounded(self.command_timeout, "lock acquire", cmd.query_async(&mut conn)).await?;

        Ok(reply.map(|_| LockLease {
            key: key.to_string(),
            token,
        }))
    }

    /// Acquire under the retry policy; `None` once every try found it held.
    pub async fn acquire(&self, key: &str) -> Result<Option<LockLease>, GameStoreError> {
        self.policy.acquire_with(|| self.try_acquire(key)).await
    }

    /// Release a lease if it is still ours.
    ///
    /// Returns false when the lease had already expired or the release
    /// failed; either way the key is left for its TTL to clear.
    pub async fn release(&self, lease: LockLease) -> bool {
        let script = redis::Script::new(RELEASE_SCRIPT);
        let mut invocation = script.key(&lease.key);
        invocation.arg(&lease.token);

        let mut conn = self.conn.clone();
        let released: Result<i64, GameStoreError> = bounded(
            self.command_timeout,
            "lock release",
            invocation.invoke_async(&mut conn),
        )
        .await;

        match released {
            Ok(1) => true,
            Ok(_) => {
                tracing::warn!(lock = %lease.key, "lock lease expired before release");
                false
            }
            Err(e) => {
                tracing::warn!(lock = %lease.key, error = %e, "lock release failed; waiting for TTL");
                false
            }
        }
    }

    /// Run `critical` while holding `key`.
    ///
    /// `critical` is not polled until the lock is held, and is dropped once
    /// the lease runs out. The lease is released whatever `critical` returns.
    ///
    /// # Errors
    ///
    /// - `Busy` when the lock stayed held through every attempt
    /// - `Unavailable` when Redis could not be reached or `critical`
    ///   outlived the lease
    pub async fn with_lock<T, Fut>(
        &self,
        key: &str,
        game_id: &GameId,
        critical: Fut,
    ) -> Result<T, GameStoreError>
    where
        Fut: Future<Output = Result<T, GameStoreError>>,
    {
        let Some(lease) = self.acquire(key).await? else {
            tracing::debug!(
                game_id = %game_id,
                attempts = self.policy.attempts,
                "game lock contended; giving up"
            );
            return Err(GameRejection::Busy(game_id.clone()).into());
        };

        let result = within_lease(self.policy.lease_ttl, game_id, critical).await;
        self.release(lease).await;
        result
    }
}

/// Await `critical` for at most one lease; past that another server may
/// already hold the lock.
async fn within_lease<T>(
    lease_ttl: Duration,
    game_id: &GameId,
    critical: impl Future<Output = Result<T, GameStoreError>>,
) -> Result<T, GameStoreError> {
    match tokio::time::timeout(lease_ttl, critical).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(
                game_id = %game_id,
                lease_ms = u64::try_from(lease_ttl.as_millis()).unwrap_or(u64::MAX),
                "locked operation outlived its lease"
            );
            Err(GameStoreError::unavailable(format!(
                "lock lease on game {game_id} expired mid-operation"
            )))
        }
    }
}

impl std::fmt::Debug for RedisLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLock")
            .field("policy", &self.policy)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}
