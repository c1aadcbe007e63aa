/// Service segment shared by every tether key.
pub const SERVICE: &str = "social";

pub const USERS: &str = "users";
pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";

/// Key-construction helpers for the social keyspace.
///
/// Layout: `{prefix}:{service}:{collection}:{id}` for entities, with auxiliary sets and
/// sorted sets living under the owning collection.
#[derive(Debug, Clone)]
pub struct KeyContext {
    prefix: String,
    service: String,
}

impl KeyContext {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            service: SERVICE.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entity(&self, collection: &str, entity_id: &str) -> String {
        format!("{}:{}:{}:{}", self.prefix, self.service, collection, entity_id)
    }

    /// Prefix that, concatenated with an id, yields the entity key.
    pub fn entity_prefix(&self, collection: &str) -> String {
        format!("{}:{}:{}:", self.prefix, self.service, collection)
    }

    pub fn user(&self, user_id: &str) -> String {
        self.entity(USERS, user_id)
    }

    /// Claim key for a unique user field; values are lowercased so claims are case-insensitive.
    pub fn user_unique(&self, field: &str, value: &str) -> String {
        format!(
            "{}:{}:{}:unique:{}:{}",
            self.prefix,
            self.service,
            USERS,
            field,
            value.to_lowercase()
        )
    }

    /// Sorted set of every user id scored by registration time.
    pub fn users_index(&self) -> String {
        format!("{}:{}:{}:index", self.prefix, self.service, USERS)
    }

    /// Followees of `follower_id`, scored by followed-at millis.
    pub fn following(&self, follower_id: &str) -> String {
        self.relation("following", follower_id)
    }

    /// Followers of `followee_id`, scored by followed-at millis.
    pub fn followers(&self, followee_id: &str) -> String {
        self.relation("followers", followee_id)
    }

    pub fn relation(&self, alias: &str, left_id: &str) -> String {
        format!("{}:{}:rel:{}:{}", self.prefix, self.service, alias, left_id)
    }

    pub fn post(&self, post_id: &str) -> String {
        self.entity(POSTS, post_id)
    }

    pub fn post_likers(&self, post_id: &str) -> String {
        format!("{}:{}:{}:likers:{}", self.prefix, self.service, POSTS, post_id)
    }

    pub fn post_comments(&self, post_id: &str) -> String {
        format!("{}:{}:{}:comments:{}", self.prefix, self.service, POSTS, post_id)
    }

    pub fn posts_by_author(&self, author_id: &str) -> String {
        format!("{}:{}:{}:by_author:{}", self.prefix, self.service, POSTS, author_id)
    }

    /// Global reverse-chronological feed source.
    pub fn timeline(&self) -> String {
        format!("{}:{}:{}:timeline", self.prefix, self.service, POSTS)
    }

    pub fn comment(&self, comment_id: &str) -> String {
        self.entity(COMMENTS, comment_id)
    }

    pub fn session(&self, token: &str) -> String {
        format!("{}:{}:sessions:{}", self.prefix, self.service, token)
    }

    /// Glob matching every key written under this prefix.
    pub fn service_pattern(&self) -> String {
        format!("{}:{}:*", self.prefix, self.service)
    }
}
