//! Redis-backed stores for users, follow edges and posts.
//!
//! Every store owns a cloned [`ConnectionManager`] and the shared [`KeyContext`]. Reads go
//! straight to Redis; multi-key writes are expressed as a [`MutationPlan`] and executed by the
//! Lua scripts in `runtime`.

pub mod identity;
pub mod posts;
pub mod relationships;

use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use identity::IdentityStore;
pub use posts::PostStore;
pub use relationships::RelationshipStore;

use crate::{
    errors::RepoError,
    keys::KeyContext,
    runtime::{
        MutationExecutor, RedisExecutor,
        commands::{MutationCommand, MutationPlan},
    },
    session::SessionStore,
};

/// Entry point bundling a connection and key prefix; hands out the individual stores.
#[derive(Clone)]
pub struct Client {
    conn: ConnectionManager,
    keys: KeyContext,
}

impl Client {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            keys: KeyContext::new(prefix),
        }
    }

    /// Opens a managed connection to `url`.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, redis::RedisError> {
        let redis_client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(redis_client).await?;
        Ok(Self::new(conn, prefix))
    }

    pub fn keys(&self) -> &KeyContext {
        &self.keys
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    pub fn identity(&self) -> IdentityStore {
        IdentityStore::new(self.conn.clone(), self.keys.clone())
    }

    pub fn relationships(&self) -> RelationshipStore {
        RelationshipStore::new(self.conn.clone(), self.keys.clone())
    }

    pub fn posts(&self) -> PostStore {
        PostStore::new(self.conn.clone(), self.keys.clone())
    }

    pub fn sessions(&self, ttl_secs: u64) -> SessionStore {
        SessionStore::new(self.conn.clone(), self.keys.clone(), ttl_secs)
    }
}

/// Runs a single command and returns its script reply.
pub(crate) async fn execute_single(conn: &mut ConnectionManager, command: MutationCommand) -> Result<Value, RepoError> {
    let mut executor = RedisExecutor::new(conn);
    let mut responses = executor.execute(MutationPlan::single(command)).await?;
    responses
        .pop()
        .ok_or_else(|| RepoError::other("mutation produced no response"))
}

pub(crate) fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, RepoError> {
    serde_json::from_str(raw).map_err(|err| RepoError::Other {
        message: format!("failed to deserialize entity: {err}").into(),
    })
}

/// `MGET` over `keys`, decoding each present document. Output is aligned with `keys`.
pub(crate) async fn fetch_many<T: DeserializeOwned>(
    conn: &mut ConnectionManager,
    keys: &[String],
) -> Result<Vec<Option<T>>, RepoError> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(conn).await?;
    raw.into_iter()
        .map(|doc| doc.as_deref().map(decode_json).transpose())
        .collect()
}

pub(crate) async fn fetch_one<T: DeserializeOwned>(conn: &mut ConnectionManager, key: &str) -> Result<Option<T>, RepoError> {
    let raw: Option<String> = redis::cmd("GET").arg(key).query_async(conn).await?;
    raw.as_deref().map(decode_json).transpose()
}

/// Converts a sorted-set score in epoch milliseconds back to a timestamp.
pub(crate) fn score_to_datetime(score: f64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(score as i64).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_round_trip_to_millis() {
        let ts = score_to_datetime(1_704_067_200_123.0);
        assert_eq!(ts.timestamp_millis(), 1_704_067_200_123);
    }

    #[test]
    fn malformed_documents_are_internal_errors() {
        let err = decode_json::<crate::models::Post>("{").unwrap_err();
        assert_eq!(err.reason(), "internal");
    }
}
