pub(crate) use std::sync::atomic::{AtomicUsize, Ordering};
pub(crate) use std::time::Duration;

pub(crate) use redis::aio::ConnectionManager;
pub(crate) use tether::{
    Client, FeedAssembler, FollowOutcome, FollowState, LikeMode, Media, MediaKind, NewPost, NewUser, Post,
    ProfileAggregator, RepoError, User, cleanup_pattern, id::generate_entity_id,
    runtime::{
        MutationExecutor, RedisExecutor,
        commands::{MutationCommand, MutationPlan, build_user_update},
    },
};

pub(crate) static TEST_NAMESPACE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A Redis key prefix private to one test, with the stores bound to it.
pub(crate) struct TestNamespace {
    pub(crate) client: Client,
}

impl TestNamespace {
    /// `None` when no Redis server answers; callers skip the test.
    pub(crate) async fn connect() -> Option<Self> {
        let conn = redis_conn().await?;
        let idx = TEST_NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
        let salt = generate_entity_id();
        let prefix = format!("tether_test_{idx}_{}", &salt[..8]);
        Some(Self {
            client: Client::new(conn, prefix),
        })
    }

    pub(crate) async fn user(&self, handle: &str) -> User {
        self.client
            .identity()
            .register(NewUser {
                name: format!("{handle} tester"),
                username: handle.to_string(),
                email: format!("{handle}@example.com"),
                password: "correct horse".to_string(),
            })
            .await
            .expect("register user")
    }

    pub(crate) async fn text_post(&self, author: &User, body: &str) -> Post {
        self.client
            .posts()
            .create_post(&author.id, NewPost::new(Some(body.to_string()), None))
            .await
            .expect("create post")
    }

    pub(crate) fn feed(&self) -> FeedAssembler {
        FeedAssembler::new(self.client.identity(), self.client.posts())
    }

    pub(crate) fn profiles(&self) -> ProfileAggregator {
        ProfileAggregator::new(self.client.identity(), self.client.relationships())
    }

    pub(crate) async fn cleanup(self) {
        let mut conn = self.client.connection();
        let pattern = self.client.keys().service_pattern();
        cleanup_pattern(&mut conn, &pattern).await.expect("cleanup keys");
    }
}

pub(crate) async fn redis_conn() -> Option<ConnectionManager> {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let client = redis::Client::open(url).ok()?;
    match tokio::time::timeout(Duration::from_secs(2), client.get_connection_manager()).await {
        Ok(Ok(conn)) => Some(conn),
        _ => {
            eprintln!("skipping: redis not reachable");
            None
        }
    }
}

/// Edges are scored in milliseconds; spacing writes keeps their order deterministic.
pub(crate) async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

pub(crate) fn is_validation(err: &RepoError, code: &str) -> bool {
    matches!(err, RepoError::Validation(validation) if validation.has_code(code))
}
