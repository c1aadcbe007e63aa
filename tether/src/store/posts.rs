use chrono::Utc;
use log::debug;
use redis::aio::ConnectionManager;
use serde_json::Value;

use crate::{
    errors::RepoError,
    id::{generate_entity_id, is_well_formed_id},
    keys::KeyContext,
    models::{Comment, Engagement, LikeMode, LikeOutcome, NewPost, Page, Post, page_bounds, validate_comment_body},
    runtime::commands::{
        LikeOp, MutationCommand, build_comment_create, build_comment_delete, build_like, build_post_create,
        build_post_delete,
    },
    store::{execute_single, fetch_many, fetch_one},
};

/// Posts, their liker sets and their comments.
#[derive(Clone)]
pub struct PostStore {
    conn: ConnectionManager,
    keys: KeyContext,
}

impl PostStore {
    pub fn new(conn: ConnectionManager, keys: KeyContext) -> Self {
        Self { conn, keys }
    }

    /// Validates and stores a post. An empty body without media is rejected before any write.
    pub async fn create_post(&self, author_id: &str, input: NewPost) -> Result<Post, RepoError> {
        let input = input.validate()?;
        if !is_well_formed_id(author_id) {
            return Err(RepoError::not_found(author_id));
        }
        let post = Post {
            id: generate_entity_id(),
            author_id: author_id.to_string(),
            body: input.body,
            media: input.media,
            created_at: Utc::now(),
        };
        let command = build_post_create(&self.keys, &post)?;
        let mut conn = self.conn.clone();
        execute_single(&mut conn, MutationCommand::CreatePost(command)).await?;
        debug!("created post {} by {}", post.id, post.author_id);
        Ok(post)
    }

    pub async fn get(&self, post_id: &str) -> Result<Option<Post>, RepoError> {
        if !is_well_formed_id(post_id) {
            return Ok(None);
        }
        let mut conn = self.conn.clone();
        fetch_one(&mut conn, &self.keys.post(post_id)).await
    }

    /// Applies `mode` for `user_id` on the post's liker set. A user is counted at most once.
    pub async fn like(&self, post_id: &str, user_id: &str, mode: LikeMode) -> Result<LikeOutcome, RepoError> {
        self.mutate_like(post_id, user_id, LikeOp::from(mode)).await
    }

    /// Removes `user_id` from the liker set; a no-op when absent.
    pub async fn unlike(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome, RepoError> {
        self.mutate_like(post_id, user_id, LikeOp::Remove).await
    }

    async fn mutate_like(&self, post_id: &str, user_id: &str, op: LikeOp) -> Result<LikeOutcome, RepoError> {
        if !is_well_formed_id(post_id) {
            return Err(RepoError::not_found(post_id));
        }
        let command = build_like(&self.keys, post_id, user_id, op);
        let mut conn = self.conn.clone();
        let response = execute_single(&mut conn, MutationCommand::Like(command)).await?;
        Ok(LikeOutcome {
            liked: response.get("liked").and_then(Value::as_bool).unwrap_or(false),
            likes: response.get("likes").and_then(Value::as_u64).unwrap_or(0),
        })
    }

    pub async fn add_comment(&self, post_id: &str, author_id: &str, body: &str) -> Result<Comment, RepoError> {
        let body = validate_comment_body(body)?;
        if !is_well_formed_id(post_id) {
            return Err(RepoError::not_found(post_id));
        }
        let comment = Comment {
            id: generate_entity_id(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            body,
            created_at: Utc::now(),
        };
        let command = build_comment_create(&self.keys, &comment)?;
        let mut conn = self.conn.clone();
        execute_single(&mut conn, MutationCommand::CreateComment(command)).await?;
        debug!("comment {} added to post {}", comment.id, post_id);
        Ok(comment)
    }

    pub async fn get_comment(&self, comment_id: &str) -> Result<Option<Comment>, RepoError> {
        if !is_well_formed_id(comment_id) {
            return Ok(None);
        }
        let mut conn = self.conn.clone();
        fetch_one(&mut conn, &self.keys.comment(comment_id)).await
    }

    /// Deletes a comment. Only its author may do so.
    pub async fn delete_comment(&self, comment_id: &str, requester_id: &str) -> Result<(), RepoError> {
        if !is_well_formed_id(comment_id) {
            return Err(RepoError::not_found(comment_id));
        }
        let command = build_comment_delete(&self.keys, comment_id, requester_id);
        let mut conn = self.conn.clone();
        execute_single(&mut conn, MutationCommand::DeleteComment(command)).await?;
        debug!("comment {comment_id} deleted by {requester_id}");
        Ok(())
    }

    /// Deletes a post with its comments and liker set. Only its author may do so.
    pub async fn delete_post(&self, post_id: &str, requester_id: &str) -> Result<(), RepoError> {
        if !is_well_formed_id(post_id) {
            return Err(RepoError::not_found(post_id));
        }
        let command = build_post_delete(&self.keys, post_id, requester_id);
        let mut conn = self.conn.clone();
        let response = execute_single(&mut conn, MutationCommand::DeletePost(command)).await?;
        let removed = response.get("comments_removed").and_then(Value::as_u64).unwrap_or(0);
        debug!("post {post_id} deleted by {requester_id} ({removed} comments removed)");
        Ok(())
    }

    /// Comments on a post, oldest first.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, RepoError> {
        if !is_well_formed_id(post_id) {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let ids: Vec<String> = redis::cmd("ZRANGE")
            .arg(self.keys.post_comments(post_id))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        let keys: Vec<String> = ids.iter().map(|id| self.keys.comment(id)).collect();
        let comments: Vec<Option<Comment>> = fetch_many(&mut conn, &keys).await?;
        Ok(comments.into_iter().flatten().collect())
    }

    /// Posts by one author, newest first.
    pub async fn list_by_author(&self, author_id: &str, page: Option<Page>) -> Result<Vec<Post>, RepoError> {
        if !is_well_formed_id(author_id) {
            return Ok(Vec::new());
        }
        self.list_from_index(self.keys.posts_by_author(author_id), page).await
    }

    /// Every post, newest first.
    pub async fn list_all(&self, page: Option<Page>) -> Result<Vec<Post>, RepoError> {
        self.list_from_index(self.keys.timeline(), page).await
    }

    async fn list_from_index(&self, index_key: String, page: Option<Page>) -> Result<Vec<Post>, RepoError> {
        let (start, stop) = page_bounds(page);
        let mut conn = self.conn.clone();
        let ids: Vec<String> = redis::cmd("ZREVRANGE")
            .arg(index_key)
            .arg(start)
            .arg(stop)
            .query_async(&mut conn)
            .await?;
        let keys: Vec<String> = ids.iter().map(|id| self.keys.post(id)).collect();
        let posts: Vec<Option<Post>> = fetch_many(&mut conn, &keys).await?;
        Ok(posts.into_iter().flatten().collect())
    }

    /// Like count, viewer membership and comment count per post, aligned with `post_ids`.
    pub async fn like_state(&self, post_ids: &[String], viewer_id: Option<&str>) -> Result<Vec<Engagement>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut pipe = redis::pipe();
        for post_id in post_ids {
            let likers_key = self.keys.post_likers(post_id);
            pipe.cmd("SCARD").arg(&likers_key);
            // a missing viewer never matches a stored id
            pipe.cmd("SISMEMBER").arg(&likers_key).arg(viewer_id.unwrap_or(""));
            pipe.cmd("ZCARD").arg(self.keys.post_comments(post_id));
        }
        let mut conn = self.conn.clone();
        let raw: Vec<u64> = pipe.query_async(&mut conn).await?;
        Ok(raw
            .chunks(3)
            .map(|chunk| Engagement {
                likes: chunk[0],
                liked_by_viewer: chunk.get(1).is_some_and(|member| *member == 1),
                comments: chunk.get(2).copied().unwrap_or(0),
            })
            .collect())
    }
}
