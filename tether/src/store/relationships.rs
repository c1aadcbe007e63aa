use chrono::Utc;
use log::debug;
use redis::aio::ConnectionManager;

use crate::{
    errors::{RepoError, ValidationError},
    id::is_well_formed_id,
    keys::KeyContext,
    models::{Counts, Edge, FollowOutcome, Page, page_bounds},
    runtime::commands::{MutationCommand, build_edge_mutation},
    store::{execute_single, score_to_datetime},
};

/// Directed follow edges, stored once per direction as sorted sets scored by followed-at millis.
#[derive(Clone)]
pub struct RelationshipStore {
    conn: ConnectionManager,
    keys: KeyContext,
}

impl RelationshipStore {
    pub fn new(conn: ConnectionManager, keys: KeyContext) -> Self {
        Self { conn, keys }
    }

    /// Creates the edge `follower -> followee`.
    ///
    /// Following yourself is a validation error (`self_follow`); both users must exist. Repeating
    /// an existing follow succeeds with [`FollowOutcome::AlreadyFollowing`] and changes nothing.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> Result<FollowOutcome, RepoError> {
        if follower_id == followee_id {
            return Err(ValidationError::single("followingId", "self_follow", "users cannot follow themselves").into());
        }
        ensure_id(follower_id)?;
        ensure_id(followee_id)?;

        let command = build_edge_mutation(&self.keys, follower_id, followee_id, Some(Utc::now()));
        let mut conn = self.conn.clone();
        let response = execute_single(&mut conn, MutationCommand::Follow(command)).await?;
        let created = response.get("created").and_then(|v| v.as_bool()).unwrap_or(false);
        debug!("follow {follower_id} -> {followee_id} (created: {created})");
        Ok(if created {
            FollowOutcome::Followed
        } else {
            FollowOutcome::AlreadyFollowing
        })
    }

    /// Removes the edge if present and reports whether one was removed.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<bool, RepoError> {
        if !is_well_formed_id(follower_id) || !is_well_formed_id(followee_id) {
            return Ok(false);
        }
        let command = build_edge_mutation(&self.keys, follower_id, followee_id, None);
        let mut conn = self.conn.clone();
        let response = execute_single(&mut conn, MutationCommand::Unfollow(command)).await?;
        let removed = response.get("removed").and_then(|v| v.as_bool()).unwrap_or(false);
        debug!("unfollow {follower_id} -> {followee_id} (removed: {removed})");
        Ok(removed)
    }

    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool, RepoError> {
        if !is_well_formed_id(follower_id) || !is_well_formed_id(followee_id) {
            return Ok(false);
        }
        let mut conn = self.conn.clone();
        let score: Option<f64> = redis::cmd("ZSCORE")
            .arg(self.keys.following(follower_id))
            .arg(followee_id)
            .query_async(&mut conn)
            .await?;
        Ok(score.is_some())
    }

    /// True iff both `a -> b` and `b -> a` exist. Symmetric by construction.
    pub async fn is_mutual(&self, a: &str, b: &str) -> Result<bool, RepoError> {
        let flags = self.follow_flags(a, &[b.to_string()]).await?;
        Ok(flags.first().is_some_and(|(forward, backward)| *forward && *backward))
    }

    /// For each target, `(viewer follows target, target follows viewer)`, in one round trip.
    pub async fn follow_flags(&self, viewer_id: &str, target_ids: &[String]) -> Result<Vec<(bool, bool)>, RepoError> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }
        if !is_well_formed_id(viewer_id) {
            return Ok(vec![(false, false); target_ids.len()]);
        }
        let following_key = self.keys.following(viewer_id);
        let mut pipe = redis::pipe();
        for target_id in target_ids {
            pipe.cmd("ZSCORE").arg(&following_key).arg(target_id);
            pipe.cmd("ZSCORE").arg(self.keys.following(target_id)).arg(viewer_id);
        }
        let mut conn = self.conn.clone();
        let scores: Vec<Option<f64>> = pipe.query_async(&mut conn).await?;
        Ok(scores
            .chunks(2)
            .map(|pair| (pair[0].is_some(), pair.get(1).is_some_and(|s| s.is_some())))
            .collect())
    }

    /// Followers of `user_id`, most recent first.
    pub async fn list_followers(&self, user_id: &str, page: Option<Page>) -> Result<Vec<Edge>, RepoError> {
        self.list_edges(self.keys.followers(user_id), user_id, page).await
    }

    /// Users `user_id` follows, most recent first.
    pub async fn list_following(&self, user_id: &str, page: Option<Page>) -> Result<Vec<Edge>, RepoError> {
        self.list_edges(self.keys.following(user_id), user_id, page).await
    }

    async fn list_edges(&self, key: String, user_id: &str, page: Option<Page>) -> Result<Vec<Edge>, RepoError> {
        if !is_well_formed_id(user_id) {
            return Ok(Vec::new());
        }
        let (start, stop) = page_bounds(page);
        let mut conn = self.conn.clone();
        let entries: Vec<(String, f64)> = redis::cmd("ZREVRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .arg("WITHSCORES")
            .query_async(&mut conn)
            .await?;
        Ok(entries
            .into_iter()
            .map(|(user_id, score)| Edge {
                user_id,
                followed_at: score_to_datetime(score),
            })
            .collect())
    }

    pub async fn counts(&self, user_id: &str) -> Result<Counts, RepoError> {
        if !is_well_formed_id(user_id) {
            return Ok(Counts::default());
        }
        let mut conn = self.conn.clone();
        let (followers, following): (u64, u64) = redis::pipe()
            .cmd("ZCARD")
            .arg(self.keys.followers(user_id))
            .cmd("ZCARD")
            .arg(self.keys.following(user_id))
            .query_async(&mut conn)
            .await?;
        Ok(Counts { followers, following })
    }
}

fn ensure_id(user_id: &str) -> Result<(), RepoError> {
    if is_well_formed_id(user_id) {
        Ok(())
    } else {
        Err(RepoError::not_found(user_id))
    }
}
