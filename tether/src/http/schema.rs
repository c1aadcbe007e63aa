//! Request and response bodies of the JSON API. Every response carries `schemaVersion`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::{
    errors::ValidationIssue,
    feed::{CommentView, FeedItem},
    models::{Counts, EducationEntry, Media, PublicUser, WorkEntry},
    profile::{ConnectionEntry, FollowState, ProfileSummary},
};

pub const SCHEMA_VERSION: u32 = 1;

/// Serializes as the current [`SCHEMA_VERSION`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaVersion;

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(SCHEMA_VERSION)
    }
}

// ---- requests ----

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub following_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIdRequest {
    pub post_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub post_id: String,
    #[serde(default, alias = "text")]
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub comment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    pub post_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

// ---- responses ----

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[cfg_attr(feature = "utoipa", schema(value_type = u32))]
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub reason: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<Vec<Object>>))]
    pub issues: Option<Vec<ValidationIssue>>,
}

impl ErrorResponse {
    pub fn new(reason: impl Into<String>, message: impl Into<String>, issues: Option<Vec<ValidationIssue>>) -> Self {
        Self {
            schema_version: SchemaVersion,
            success: false,
            reason: reason.into(),
            message: message.into(),
            issues,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            schema_version: SchemaVersion,
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub user: PublicUser,
}

/// Full profile page: identity, profile fields, counts and the viewer's follow state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: PublicUser,
    pub email: String,
    pub bio: Option<String>,
    pub current_post: Option<String>,
    pub past_work: Vec<WorkEntry>,
    pub education: Vec<EducationEntry>,
    pub created_at: DateTime<Utc>,
    pub counts: Counts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_state: Option<FollowState>,
}

impl From<ProfileSummary> for ProfileView {
    fn from(summary: ProfileSummary) -> Self {
        let details = summary.details;
        Self {
            user: summary.user,
            email: details.email,
            bio: details.bio,
            current_post: details.current_post,
            past_work: details.past_work,
            education: details.education,
            created_at: details.created_at,
            counts: summary.counts,
            follow_state: summary.follow_state,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub profile: ProfileView,
}

/// A user row in a list, with the viewer's relationship to it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionView {
    #[serde(flatten)]
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_state: Option<FollowState>,
}

impl From<ConnectionEntry> for ConnectionView {
    fn from(entry: ConnectionEntry) -> Self {
        Self {
            user: entry.user,
            followed_at: entry.followed_at,
            follow_state: entry.follow_state,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub profiles: Vec<ConnectionView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowersResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub followers: Vec<ConnectionView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub following: Vec<ConnectionView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub message: String,
    /// Whether the request changed the graph.
    pub changed: bool,
    pub is_following: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFollowingResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub is_following: bool,
    pub is_mutual: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub counts: Counts,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub author: PublicUser,
    pub body: Option<String>,
    pub media: Option<Media>,
    pub created_at: DateTime<Utc>,
    pub likes: u64,
    pub is_liked: bool,
    pub comments: u64,
}

impl From<FeedItem> for PostView {
    fn from(item: FeedItem) -> Self {
        Self {
            id: item.post.id,
            author: item.author,
            body: item.post.body,
            media: item.post.media,
            created_at: item.post.created_at,
            likes: item.likes,
            is_liked: item.is_liked,
            comments: item.comments,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub post: PostView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub likes: u64,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    pub post_id: String,
    pub author: PublicUser,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentView> for CommentDto {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            post_id: view.comment.post_id,
            author: view.author,
            body: view.comment.body,
            created_at: view.comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub comment: CommentDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsResponse {
    pub schema_version: SchemaVersion,
    pub success: bool,
    pub comments: Vec<CommentDto>,
}
