//! Tether: follow graph, posts and feed assembly for a small social network, stored in Redis.
//!
//! The stores in [`store`] own the persisted state; [`feed`] and [`profile`] are read-only
//! projections over them, and [`http`] exposes both as a JSON API.

pub mod config;
pub mod errors;
pub mod feed;
pub mod http;
pub mod id;
pub mod keys;
pub mod media;
pub mod models;
pub mod profile;
pub mod runtime;
pub mod session;
pub mod store;
pub mod validators;

pub use config::TetherConfig;
pub use errors::{RepoError, ValidationError, ValidationIssue, ValidationResult};
pub use feed::{CommentView, FeedAssembler, FeedItem};
pub use keys::KeyContext;
pub use models::{
    Comment, Counts, Edge, FollowOutcome, LikeMode, LikeOutcome, Media, MediaKind, NewPost, NewUser, Page, Post,
    ProfileUpdate, PublicUser, User,
};
pub use profile::{ConnectionEntry, FollowState, ProfileAggregator, ProfileSummary};
pub use session::{Session, SessionStore};
pub use store::{Client, IdentityStore, PostStore, RelationshipStore};

use redis::aio::ConnectionManager;

/// Delete all keys matching a pattern.
///
/// This performs a SCAN + DEL operation to safely delete keys without blocking Redis.
pub async fn cleanup_pattern(conn: &mut ConnectionManager, pattern: &str) -> Result<u64, RepoError> {
    const SCAN_COUNT: usize = 1000;
    let mut cursor: u64 = 0;
    let mut total_deleted: u64 = 0;

    loop {
        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_COUNT)
            .query_async(conn)
            .await?;

        if !keys.is_empty() {
            let deleted: u64 = redis::cmd("DEL").arg(&keys).query_async(conn).await?;
            total_deleted += deleted;
        }

        cursor = next_cursor;
        if cursor == 0 {
            break;
        }
    }

    Ok(total_deleted)
}
