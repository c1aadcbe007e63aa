use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    errors::{ValidationError, ValidationResult},
    keys::{COMMENTS, KeyContext},
    models::{Comment, LikeMode, Post, User},
};

/// A single atomic storage operation. Each variant is executed by one Lua script, which
/// receives the command serialized as `{"<variant>": {...}}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationCommand {
    CreateUser(UserCreate),
    UpdateEntity(EntityUpdate),
    Follow(EdgeMutation),
    Unfollow(EdgeMutation),
    CreatePost(PostCreate),
    DeletePost(PostDelete),
    Like(LikeMutation),
    CreateComment(CommentCreate),
    DeleteComment(CommentDelete),
}

/// Creates a user, claiming case-insensitive unique fields first.
#[derive(Debug, Serialize)]
pub struct UserCreate {
    pub key: String,
    pub entity_id: String,
    pub payload_json: String,
    /// Registration-ordered directory of users
    pub index_key: String,
    pub score: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unique_claims: Vec<UniqueClaim>,
}

/// A unique value claimed by writing `key -> entity_id` when `key` is free.
#[derive(Debug, Clone, Serialize)]
pub struct UniqueClaim {
    pub field: String,
    pub value: String,
    pub key: String,
}

/// Replaces the JSON document of an existing entity when its stored `version` still equals
/// `expected_version`.
#[derive(Debug, Serialize)]
pub struct EntityUpdate {
    pub key: String,
    pub entity_id: String,
    pub expected_version: u64,
    pub payload_json: String,
}

/// Inserts or removes the directed edge follower -> followee in both directional indexes.
#[derive(Debug, Serialize)]
pub struct EdgeMutation {
    pub follower_id: String,
    pub followee_id: String,
    pub follower_key: String,
    pub followee_key: String,
    pub following_key: String,
    pub followers_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostCreate {
    pub key: String,
    pub entity_id: String,
    pub payload_json: String,
    pub author_key: String,
    pub author_id: String,
    pub author_index_key: String,
    pub timeline_key: String,
    pub score: String,
}

/// Deletes a post owned by `requester_id` together with its comments and liker set.
#[derive(Debug, Serialize)]
pub struct PostDelete {
    pub key: String,
    pub entity_id: String,
    pub requester_id: String,
    pub likers_key: String,
    pub comments_key: String,
    pub comment_key_prefix: String,
    /// Concatenated with the stored author id to find the author's post index
    pub author_index_prefix: String,
    pub timeline_key: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LikeOp {
    Add,
    Remove,
    Toggle,
}

impl From<LikeMode> for LikeOp {
    fn from(mode: LikeMode) -> Self {
        match mode {
            LikeMode::Toggle => LikeOp::Toggle,
            LikeMode::AddOnly => LikeOp::Add,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikeMutation {
    pub post_key: String,
    pub post_id: String,
    pub likers_key: String,
    pub user_id: String,
    pub op: LikeOp,
}

#[derive(Debug, Serialize)]
pub struct CommentCreate {
    pub key: String,
    pub entity_id: String,
    pub payload_json: String,
    pub post_key: String,
    pub post_id: String,
    pub comments_key: String,
    pub score: String,
}

/// Deletes a comment owned by `requester_id` and unlinks it from its post.
#[derive(Debug, Serialize)]
pub struct CommentDelete {
    pub key: String,
    pub entity_id: String,
    pub requester_id: String,
    /// Concatenated with the stored post id to find the post's comment index
    pub comments_index_prefix: String,
}

#[derive(Debug, Serialize, Default)]
pub struct MutationPlan {
    pub commands: Vec<MutationCommand>,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(command: MutationCommand) -> Self {
        Self {
            commands: vec![command],
        }
    }

    pub fn push(&mut self, command: MutationCommand) {
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Sorted-set score for a timestamp. Sent as a string so Lua never reformats it.
pub fn score_for(timestamp: DateTime<Utc>) -> String {
    timestamp.timestamp_millis().to_string()
}

fn payload_json<T: Serialize>(value: &T) -> ValidationResult<String> {
    serde_json::to_string(value).map_err(|err| {
        ValidationError::single("payload", "serialization_error", format!("failed to serialize payload: {err}"))
    })
}

pub fn build_user_create(keys: &KeyContext, user: &User) -> ValidationResult<UserCreate> {
    let unique_claims = [("username", &user.username), ("email", &user.email)]
        .into_iter()
        .map(|(field, value)| UniqueClaim {
            field: field.to_string(),
            value: value.clone(),
            key: keys.user_unique(field, value),
        })
        .collect();
    Ok(UserCreate {
        key: keys.user(&user.id),
        entity_id: user.id.clone(),
        payload_json: payload_json(user)?,
        index_key: keys.users_index(),
        score: score_for(user.created_at),
        unique_claims,
    })
}

/// `user` is the edited copy; its `version` must already be one past `expected_version`.
pub fn build_user_update(keys: &KeyContext, user: &User, expected_version: u64) -> ValidationResult<EntityUpdate> {
    Ok(EntityUpdate {
        key: keys.user(&user.id),
        entity_id: user.id.clone(),
        expected_version,
        payload_json: payload_json(user)?,
    })
}

pub fn build_edge_mutation(
    keys: &KeyContext,
    follower_id: &str,
    followee_id: &str,
    followed_at: Option<DateTime<Utc>>,
) -> EdgeMutation {
    EdgeMutation {
        follower_id: follower_id.to_string(),
        followee_id: followee_id.to_string(),
        follower_key: keys.user(follower_id),
        followee_key: keys.user(followee_id),
        following_key: keys.following(follower_id),
        followers_key: keys.followers(followee_id),
        score: followed_at.map(score_for),
    }
}

pub fn build_post_create(keys: &KeyContext, post: &Post) -> ValidationResult<PostCreate> {
    Ok(PostCreate {
        key: keys.post(&post.id),
        entity_id: post.id.clone(),
        payload_json: payload_json(post)?,
        author_key: keys.user(&post.author_id),
        author_id: post.author_id.clone(),
        author_index_key: keys.posts_by_author(&post.author_id),
        timeline_key: keys.timeline(),
        score: score_for(post.created_at),
    })
}

pub fn build_post_delete(keys: &KeyContext, post_id: &str, requester_id: &str) -> PostDelete {
    PostDelete {
        key: keys.post(post_id),
        entity_id: post_id.to_string(),
        requester_id: requester_id.to_string(),
        likers_key: keys.post_likers(post_id),
        comments_key: keys.post_comments(post_id),
        comment_key_prefix: keys.entity_prefix(COMMENTS),
        author_index_prefix: keys.posts_by_author(""),
        timeline_key: keys.timeline(),
    }
}

pub fn build_like(keys: &KeyContext, post_id: &str, user_id: &str, op: LikeOp) -> LikeMutation {
    LikeMutation {
        post_key: keys.post(post_id),
        post_id: post_id.to_string(),
        likers_key: keys.post_likers(post_id),
        user_id: user_id.to_string(),
        op,
    }
}

pub fn build_comment_create(keys: &KeyContext, comment: &Comment) -> ValidationResult<CommentCreate> {
    Ok(CommentCreate {
        key: keys.comment(&comment.id),
        entity_id: comment.id.clone(),
        payload_json: payload_json(comment)?,
        post_key: keys.post(&comment.post_id),
        post_id: comment.post_id.clone(),
        comments_key: keys.post_comments(&comment.post_id),
        score: score_for(comment.created_at),
    })
}

pub fn build_comment_delete(keys: &KeyContext, comment_id: &str, requester_id: &str) -> CommentDelete {
    CommentDelete {
        key: keys.comment(comment_id),
        entity_id: comment_id.to_string(),
        requester_id: requester_id.to_string(),
        comments_index_prefix: keys.post_comments(""),
    }
}
