//! Feed assembly: posts joined with their author's public identity and the viewer's like state.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::{
    errors::RepoError,
    models::{Comment, Engagement, Page, Post, PublicUser, User},
    store::{IdentityStore, PostStore},
};

/// One display-ready feed entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub post: Post,
    pub author: PublicUser,
    pub likes: u64,
    pub is_liked: bool,
    pub comments: u64,
}

/// A comment joined with its author's public fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: PublicUser,
}

/// Read-only projection over the post and identity stores.
#[derive(Clone)]
pub struct FeedAssembler {
    identity: IdentityStore,
    posts: PostStore,
}

impl FeedAssembler {
    pub fn new(identity: IdentityStore, posts: PostStore) -> Self {
        Self { identity, posts }
    }

    /// The global feed, newest first. Without a viewer the feed is empty.
    pub async fn feed(&self, viewer_id: Option<&str>, page: Option<Page>) -> Result<Vec<FeedItem>, RepoError> {
        let Some(viewer_id) = viewer_id else {
            return Ok(Vec::new());
        };
        let posts = self.posts.list_all(page).await?;
        self.annotate(posts, Some(viewer_id)).await
    }

    /// Posts written by `author_id`, newest first, annotated for `viewer_id`.
    pub async fn author_feed(
        &self,
        author_id: &str,
        viewer_id: Option<&str>,
        page: Option<Page>,
    ) -> Result<Vec<FeedItem>, RepoError> {
        let posts = self.posts.list_by_author(author_id, page).await?;
        self.annotate(posts, viewer_id).await
    }

    /// Comments of one post, oldest first, with author fields.
    pub async fn comments_for(&self, post_id: &str) -> Result<Vec<CommentView>, RepoError> {
        if self.posts.get(post_id).await?.is_none() {
            return Err(RepoError::not_found(post_id));
        }
        let comments = self.posts.list_comments(post_id).await?;
        let author_ids: Vec<String> = unique_ids(comments.iter().map(|c| c.author_id.as_str()));
        let authors = self.identity.get_many(&author_ids).await?;
        Ok(comments
            .into_iter()
            .filter_map(|comment| match authors.get(&comment.author_id) {
                Some(author) => Some(CommentView {
                    author: author.public(),
                    comment,
                }),
                None => {
                    warn!("skipping comment {} with missing author {}", comment.id, comment.author_id);
                    None
                }
            })
            .collect())
    }

    async fn annotate(&self, posts: Vec<Post>, viewer_id: Option<&str>) -> Result<Vec<FeedItem>, RepoError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let author_ids = unique_ids(posts.iter().map(|p| p.author_id.as_str()));
        let authors = self.identity.get_many(&author_ids).await?;
        let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let engagement = self.posts.like_state(&post_ids, viewer_id).await?;
        Ok(assemble(posts, &authors, engagement))
    }
}

/// Joins posts with authors and engagement (aligned with `posts`), keeping the input order.
/// Posts whose author record is missing are dropped.
pub fn assemble(posts: Vec<Post>, authors: &HashMap<String, User>, engagement: Vec<Engagement>) -> Vec<FeedItem> {
    posts
        .into_iter()
        .zip(engagement.into_iter().chain(std::iter::repeat(Engagement::default())))
        .filter_map(|(post, engagement)| {
            let Some(author) = authors.get(&post.author_id) else {
                warn!("skipping post {} with missing author {}", post.id, post.author_id);
                return None;
            };
            Some(FeedItem {
                author: author.public(),
                likes: engagement.likes,
                is_liked: engagement.liked_by_viewer,
                comments: engagement.comments,
                post,
            })
        })
        .collect()
}

/// First occurrence of each id, in input order.
fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(id: &str) -> User {
        let now = Utc::now();
        User {
            id: id.into(),
            name: format!("User {id}"),
            username: id.into(),
            email: format!("{id}@example.com"),
            password_hash: String::new(),
            profile_picture: None,
            bio: None,
            current_post: None,
            past_work: Vec::new(),
            education: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    fn post(id: &str, author: &str, age_minutes: i64) -> Post {
        Post {
            id: id.into(),
            author_id: author.into(),
            body: Some(format!("post {id}")),
            media: None,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn joins_authors_and_engagement_in_order() {
        let authors: HashMap<_, _> = [("a".to_string(), user("a")), ("b".to_string(), user("b"))].into();
        let posts = vec![post("p2", "b", 1), post("p1", "a", 5)];
        let engagement = vec![
            Engagement {
                likes: 3,
                liked_by_viewer: true,
                comments: 1,
            },
            Engagement::default(),
        ];
        let feed = assemble(posts, &authors, engagement);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].post.id, "p2");
        assert_eq!(feed[0].author.username, "b");
        assert_eq!((feed[0].likes, feed[0].is_liked, feed[0].comments), (3, true, 1));
        assert_eq!(feed[1].post.id, "p1");
        assert!(!feed[1].is_liked);
    }

    #[test]
    fn posts_with_missing_authors_are_dropped() {
        let authors: HashMap<_, _> = [("a".to_string(), user("a"))].into();
        let feed = assemble(
            vec![post("p1", "ghost", 1), post("p2", "a", 2)],
            &authors,
            vec![Engagement::default(); 2],
        );
        assert_eq!(feed.iter().map(|item| item.post.id.as_str()).collect::<Vec<_>>(), ["p2"]);
    }

    #[test]
    fn short_engagement_defaults_to_zero() {
        let authors: HashMap<_, _> = [("a".to_string(), user("a"))].into();
        let feed = assemble(vec![post("p1", "a", 1)], &authors, Vec::new());
        assert_eq!(feed[0].likes, 0);
    }

    #[test]
    fn unique_ids_keeps_first_occurrence_order() {
        assert_eq!(unique_ids(["b", "a", "b", "c"].into_iter()), ["b", "a", "c"]);
    }
}
