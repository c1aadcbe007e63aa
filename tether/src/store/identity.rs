use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, info};
use redis::aio::ConnectionManager;

use crate::{
    errors::{RepoError, ValidationError},
    id::{generate_entity_id, is_well_formed_id},
    keys::KeyContext,
    models::{NewUser, ProfileUpdate, User, first_version},
    runtime::commands::{MutationCommand, build_user_create, build_user_update},
    session::{hash_password, verify_password},
    store::{execute_single, fetch_many, fetch_one},
    validators::is_valid_media_reference,
};

/// User records, credentials and the case-insensitive username/email claims.
#[derive(Clone)]
pub struct IdentityStore {
    conn: ConnectionManager,
    keys: KeyContext,
}

impl IdentityStore {
    pub fn new(conn: ConnectionManager, keys: KeyContext) -> Self {
        Self { conn, keys }
    }

    /// Validates the input, hashes the password and creates the user together with its unique claims.
    ///
    /// Fails with [`RepoError::UniqueConstraintViolation`] when the username or email is taken.
    pub async fn register(&self, input: NewUser) -> Result<User, RepoError> {
        let input = input.validate()?;
        let now = Utc::now();
        let user = User {
            id: generate_entity_id(),
            name: input.name,
            username: input.username,
            email: input.email,
            password_hash: hash_password(&input.password)?,
            profile_picture: None,
            bio: None,
            current_post: None,
            past_work: Vec::new(),
            education: Vec::new(),
            created_at: now,
            updated_at: now,
            version: first_version(),
        };
        let command = build_user_create(&self.keys, &user)?;
        let mut conn = self.conn.clone();
        execute_single(&mut conn, MutationCommand::CreateUser(command)).await?;
        info!("registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Resolves an email/password pair to its user. Any mismatch is [`RepoError::Unauthorized`].
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, RepoError> {
        let user = self.find_by_email(email.trim()).await?.ok_or(RepoError::Unauthorized)?;
        if verify_password(password, &user.password_hash)? {
            Ok(user)
        } else {
            Err(RepoError::Unauthorized)
        }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<User>, RepoError> {
        if !is_well_formed_id(user_id) {
            return Ok(None);
        }
        let mut conn = self.conn.clone();
        fetch_one(&mut conn, &self.keys.user(user_id)).await
    }

    /// Like [`get`](Self::get) but a missing user is [`RepoError::NotFound`].
    pub async fn require(&self, user_id: &str) -> Result<User, RepoError> {
        self.get(user_id).await?.ok_or_else(|| RepoError::not_found(user_id))
    }

    pub async fn exists(&self, user_id: &str) -> Result<bool, RepoError> {
        if !is_well_formed_id(user_id) {
            return Ok(false);
        }
        let mut conn = self.conn.clone();
        let exists: i64 = redis::cmd("EXISTS").arg(self.keys.user(user_id)).query_async(&mut conn).await?;
        Ok(exists == 1)
    }

    /// Batch lookup keyed by id; ids with no record are absent from the map.
    pub async fn get_many(&self, user_ids: &[String]) -> Result<HashMap<String, User>, RepoError> {
        let ids: Vec<&String> = user_ids.iter().filter(|id| is_well_formed_id(id)).collect();
        let keys: Vec<String> = ids.iter().map(|id| self.keys.user(id)).collect();
        let mut conn = self.conn.clone();
        let users: Vec<Option<User>> = fetch_many(&mut conn, &keys).await?;
        Ok(users.into_iter().flatten().map(|user| (user.id.clone(), user)).collect())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        self.find_by_unique("email", email).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.find_by_unique("username", username).await
    }

    async fn find_by_unique(&self, field: &str, value: &str) -> Result<Option<User>, RepoError> {
        let mut conn = self.conn.clone();
        let owner: Option<String> = redis::cmd("GET")
            .arg(self.keys.user_unique(field, value))
            .query_async(&mut conn)
            .await?;
        match owner {
            Some(user_id) => self.get(&user_id).await,
            None => Ok(None),
        }
    }

    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<User, RepoError> {
        update.validate()?;
        let (user, _) = self
            .modify(user_id, |user, now| {
                update.apply(user, now);
                Some(())
            })
            .await?;
        debug!("updated profile of user {user_id}");
        Ok(user)
    }

    /// Points the profile picture at `reference`, returning the updated user and the replaced reference.
    pub async fn set_profile_picture(&self, user_id: &str, reference: &str) -> Result<(User, Option<String>), RepoError> {
        if !is_valid_media_reference(reference) {
            return Err(ValidationError::single("image", "invalid_media", "media reference is not valid").into());
        }
        let (user, previous) = self
            .modify(user_id, |user, now| {
                user.updated_at = now;
                Some(user.profile_picture.replace(reference.to_string()))
            })
            .await?;
        Ok((user, previous.flatten()))
    }

    pub async fn remove_profile_picture(&self, user_id: &str) -> Result<(User, Option<String>), RepoError> {
        self.modify(user_id, |user, now| {
            let previous = user.profile_picture.take();
            if previous.is_some() {
                user.updated_at = now;
            }
            previous
        })
        .await
    }

    /// Every user in registration order.
    pub async fn list_all(&self) -> Result<Vec<User>, RepoError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = redis::cmd("ZRANGE")
            .arg(self.keys.users_index())
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        let keys: Vec<String> = ids.iter().map(|id| self.keys.user(id)).collect();
        let users: Vec<Option<User>> = fetch_many(&mut conn, &keys).await?;
        Ok(users.into_iter().flatten().collect())
    }

    pub async fn count(&self) -> Result<u64, RepoError> {
        let mut conn = self.conn.clone();
        let count: u64 = redis::cmd("ZCARD").arg(self.keys.users_index()).query_async(&mut conn).await?;
        Ok(count)
    }

    /// Read-modify-write of one user document under the version guard.
    ///
    /// `edit` returns `None` when there is nothing to write. When another writer got in between
    /// the read and the write, the write is dropped and [`RepoError::VersionConflict`] is returned;
    /// the caller decides whether to re-read and try again.
    async fn modify<T, F>(&self, user_id: &str, edit: F) -> Result<(User, Option<T>), RepoError>
    where
        F: FnOnce(&mut User, DateTime<Utc>) -> Option<T>,
    {
        let mut user = self.require(user_id).await?;
        let expected = user.version;
        let Some(outcome) = edit(&mut user, Utc::now()) else {
            return Ok((user, None));
        };
        user.version = expected + 1;
        let command = build_user_update(&self.keys, &user, expected)?;
        let mut conn = self.conn.clone();
        execute_single(&mut conn, MutationCommand::UpdateEntity(command)).await?;
        Ok((user, Some(outcome)))
    }
}
