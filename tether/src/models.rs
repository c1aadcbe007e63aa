//! Domain records persisted by the stores and the projections handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::{
    errors::{ValidationError, ValidationIssue, ValidationResult},
    validators::{
        MAX_BIO_CHARS, MAX_COMMENT_BODY_CHARS, MAX_POST_BODY_CHARS, MIN_PASSWORD_LENGTH, is_valid_email,
        is_valid_media_reference, is_valid_username, limit_chars, require_text,
    },
};

pub const DEFAULT_PAGE_SIZE: u64 = 25;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A registered user as persisted in the identity store.
///
/// The password hash never leaves the library; callers receive [`PublicUser`] or
/// [`ProfileDetails`] projections instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub current_post: Option<String>,
    #[serde(default)]
    pub past_work: Vec<WorkEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every write; updates are rejected unless they carry the stored version.
    #[serde(default = "first_version")]
    pub version: u64,
}

pub(crate) fn first_version() -> u64 {
    1
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }

    pub fn details(&self) -> ProfileDetails {
        ProfileDetails {
            email: self.email.clone(),
            bio: self.bio.clone(),
            current_post: self.current_post.clone(),
            past_work: self.past_work.clone(),
            education: self.education.clone(),
            created_at: self.created_at,
        }
    }
}

/// Identity fields safe to show to any viewer.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub profile_picture: Option<String>,
}

/// Profile fields shown on a profile page.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub email: String,
    pub bio: Option<String>,
    pub current_post: Option<String>,
    pub past_work: Vec<WorkEntry>,
    pub education: Vec<EducationEntry>,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub years: String,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field_of_study: String,
}

/// Registration input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Trims identity fields and checks every rule, reporting all failures at once.
    pub fn validate(self) -> ValidationResult<NewUser> {
        let normalized = NewUser {
            name: self.name.trim().to_string(),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        };
        let mut issues = Vec::new();
        require_text(&mut issues, "name", &normalized.name);
        limit_chars(&mut issues, "name", &normalized.name, 100);
        if !is_valid_username(&normalized.username) {
            issues.push(ValidationIssue::new(
                "username",
                "invalid_username",
                "username must be 3-30 letters, digits, '_' or '.'",
            ));
        }
        if !is_valid_email(&normalized.email) {
            issues.push(ValidationIssue::new("email", "invalid_email", "email address is not valid"));
        }
        if normalized.password.chars().count() < MIN_PASSWORD_LENGTH {
            issues.push(ValidationIssue::new(
                "password",
                "weak_password",
                format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }
        ValidationError::new(issues).into_result()?;
        Ok(normalized)
    }
}

/// Partial profile edit. Absent fields are left untouched; empty strings clear optional text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub current_post: Option<String>,
    #[serde(alias = "pastwork")]
    pub past_work: Option<Vec<WorkEntry>>,
    pub education: Option<Vec<EducationEntry>>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        let mut issues = Vec::new();
        if let Some(name) = &self.name {
            require_text(&mut issues, "name", name);
            limit_chars(&mut issues, "name", name, 100);
        }
        if let Some(bio) = &self.bio {
            limit_chars(&mut issues, "bio", bio, MAX_BIO_CHARS);
        }
        if let Some(current_post) = &self.current_post {
            limit_chars(&mut issues, "currentPost", current_post, 200);
        }
        ValidationError::new(issues).into_result()
    }

    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            user.name = name.trim().to_string();
        }
        if let Some(bio) = self.bio {
            user.bio = non_blank(bio);
        }
        if let Some(current_post) = self.current_post {
            user.current_post = non_blank(current_post);
        }
        if let Some(past_work) = self.past_work {
            user.past_work = past_work
                .into_iter()
                .filter(|entry| !entry.company.trim().is_empty() || !entry.position.trim().is_empty())
                .collect();
        }
        if let Some(education) = self.education {
            user.education = education
                .into_iter()
                .filter(|entry| !entry.school.trim().is_empty())
                .collect();
        }
        user.updated_at = now;
    }
}

/// One end of a follow edge as seen from the other end.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub user_id: String,
    pub followed_at: DateTime<Utc>,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Counts {
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Media {
    pub reference: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub media: Option<Media>,
    pub created_at: DateTime<Utc>,
}

/// Post creation input.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub body: Option<String>,
    pub media: Option<Media>,
}

impl NewPost {
    pub fn new(body: Option<String>, media: Option<Media>) -> Self {
        Self { body, media }
    }

    /// A post needs a non-blank body or a media attachment.
    pub fn validate(self) -> ValidationResult<NewPost> {
        let body = self.body.and_then(non_blank);
        let mut issues = Vec::new();
        if body.is_none() && self.media.is_none() {
            issues.push(ValidationIssue::new(
                "body",
                "empty_post",
                "a post needs text or a media attachment",
            ));
        }
        if let Some(body) = &body {
            limit_chars(&mut issues, "body", body, MAX_POST_BODY_CHARS);
        }
        if let Some(media) = &self.media
            && !is_valid_media_reference(&media.reference)
        {
            issues.push(ValidationIssue::new("media", "invalid_media", "media reference is not valid"));
        }
        ValidationError::new(issues).into_result()?;
        Ok(NewPost {
            body,
            media: self.media,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Validates and trims a comment body.
pub fn validate_comment_body(body: &str) -> ValidationResult<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::single("body", "empty_comment", "comment must not be empty"));
    }
    let mut issues = Vec::new();
    limit_chars(&mut issues, "body", trimmed, MAX_COMMENT_BODY_CHARS);
    ValidationError::new(issues).into_result()?;
    Ok(trimmed.to_string())
}

/// How a like request treats a user already in the liker set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LikeMode {
    /// Add when absent, remove when present.
    #[default]
    Toggle,
    /// Idempotent set add.
    AddOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    /// Whether the user is in the liker set after the request.
    pub liked: bool,
    pub likes: u64,
}

/// Per-post engagement as seen by one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Engagement {
    pub likes: u64,
    pub liked_by_viewer: bool,
    pub comments: u64,
}

/// 1-based page window over a newest-first listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub page_size: u64,
}

/// Highest page whose rank window still fits in a signed Redis range.
pub const MAX_PAGE: u64 = (i64::MAX as u64) / MAX_PAGE_SIZE;

impl Page {
    /// Clamps to 1 <= page <= [`MAX_PAGE`] and 1 <= page_size <= [`MAX_PAGE_SIZE`].
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn first(page_size: u64) -> Self {
        Self::new(1, page_size)
    }

    /// Inclusive `(start, stop)` rank bounds for `ZREVRANGE`.
    ///
    /// Windows past the addressable range saturate at `isize::MAX`, which Redis answers with an
    /// empty page. Neither bound is ever negative.
    pub fn bounds(&self) -> (isize, isize) {
        let start = self.page.saturating_sub(1).saturating_mul(self.page_size);
        let stop = start.saturating_add(self.page_size.saturating_sub(1));
        let rank = |value: u64| isize::try_from(value).unwrap_or(isize::MAX);
        (rank(start), rank(stop))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// Rank bounds covering a whole sorted set when no page is requested.
pub fn page_bounds(page: Option<Page>) -> (isize, isize) {
    page.map(|p| p.bounds()).unwrap_or((0, -1))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
