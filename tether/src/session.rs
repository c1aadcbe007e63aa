//! Password hashing and opaque session tokens.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use log::debug;
use rand::{RngCore, rngs::OsRng};
use redis::aio::ConnectionManager;

use crate::{
    errors::RepoError,
    id::{generate_session_token, is_well_formed_id},
    keys::KeyContext,
};

const SALT_SIZE: usize = 16;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// An authenticated request context: the token presented and the user it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

/// Hashes `password` with Argon2id and a random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, RepoError> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|err| RepoError::other(format!("failed to encode salt: {err}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| RepoError::other(format!("failed to hash password: {err}")))?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC hash. A malformed hash is an error, a mismatch is `false`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, RepoError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|err| RepoError::other(format!("invalid password hash: {err}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(RepoError::other(format!("password verification failed: {err}"))),
    }
}

/// Maps session tokens to user ids with an expiry.
#[derive(Clone)]
pub struct SessionStore {
    conn: ConnectionManager,
    keys: KeyContext,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(conn: ConnectionManager, keys: KeyContext, ttl_secs: u64) -> Self {
        Self {
            conn,
            keys,
            ttl_secs: ttl_secs.max(1),
        }
    }

    pub async fn issue(&self, user_id: &str) -> Result<Session, RepoError> {
        let token = generate_session_token();
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.keys.session(&token))
            .arg(user_id)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<()>(&mut conn)
            .await?;
        debug!("issued session for user {user_id}");
        Ok(Session {
            user_id: user_id.to_string(),
            token,
        })
    }

    /// Resolves a token to its session; unknown or expired tokens yield `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>, RepoError> {
        if !is_well_formed_id(token) {
            return Ok(None);
        }
        let mut conn = self.conn.clone();
        let user_id: Option<String> = redis::cmd("GET").arg(self.keys.session(token)).query_async(&mut conn).await?;
        Ok(user_id.map(|user_id| Session {
            user_id,
            token: token.to_string(),
        }))
    }

    /// Deletes the token. Returns whether it existed.
    pub async fn revoke(&self, token: &str) -> Result<bool, RepoError> {
        if !is_well_formed_id(token) {
            return Ok(false);
        }
        let mut conn = self.conn.clone();
        let removed: u64 = redis::cmd("DEL").arg(self.keys.session(token)).query_async(&mut conn).await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_reject() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
    }
}
