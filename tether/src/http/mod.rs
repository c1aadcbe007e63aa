//! JSON API served with axum.

pub mod error;
pub mod extract;
mod graph;
mod posts;
pub mod schema;
mod users;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method, header},
    middleware::{Next, from_fn},
    response::Response,
    routing::{delete, get, post, put},
};
use log::{info, warn};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};

use crate::{
    config::TetherConfig,
    feed::FeedAssembler,
    media::{MediaPolicy, MediaStore, UPLOADS_ROUTE},
    models::LikeMode,
    profile::ProfileAggregator,
    session::SessionStore,
    store::{Client, IdentityStore, PostStore, RelationshipStore},
};

/// Shared handler state. Cloned per request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityStore,
    pub relationships: RelationshipStore,
    pub posts: PostStore,
    pub sessions: SessionStore,
    pub feed: FeedAssembler,
    pub profiles: ProfileAggregator,
    pub media: MediaStore,
    pub media_policy: MediaPolicy,
    pub like_mode: LikeMode,
    pub session_ttl_secs: u64,
}

impl AppState {
    pub fn new(client: &Client, config: &TetherConfig) -> Self {
        let identity = client.identity();
        let relationships = client.relationships();
        let posts = client.posts();
        Self {
            feed: FeedAssembler::new(identity.clone(), posts.clone()),
            profiles: ProfileAggregator::new(identity.clone(), relationships.clone()),
            sessions: client.sessions(config.sessions.ttl_secs),
            media: MediaStore::new(config.media.uploads_dir.clone()),
            media_policy: config.media.policy(),
            like_mode: config.likes.mode,
            session_ttl_secs: config.sessions.ttl_secs,
            identity,
            relationships,
            posts,
        }
    }
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let body_limit = state.media_policy.body_limit();
    let uploads = ServeDir::new(state.media.root().to_path_buf());

    let user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/isauth", get(users::is_auth))
        .route("/getUserProfile", get(users::own_profile))
        .route("/getUserProfile/{user_id}", get(users::user_profile))
        .route("/getAllUserProfile", get(users::all_profiles))
        .route("/update-profile", post(users::update_profile))
        .route("/upload-profile", post(users::upload_profile_picture))
        .route("/remove-profile-picture", post(users::remove_profile_picture))
        .route("/follow", post(graph::follow))
        .route("/unfollow", post(graph::unfollow))
        .route("/check-following/{user_id}", get(graph::check_following))
        .route("/followers/{user_id}", get(graph::followers))
        .route("/following/{user_id}", get(graph::following))
        .route("/connection-counts/{user_id}", get(graph::connection_counts));

    let post_routes = Router::new()
        .route("/postUpload", post(posts::upload))
        .route("/getAllPosts", get(posts::all_posts))
        .route("/getMyPosts", get(posts::my_posts))
        .route("/like", put(posts::like))
        .route("/comment", post(posts::comment))
        .route("/comments", get(posts::comments))
        .route("/deletecomment", post(posts::delete_comment))
        .route("/delete", delete(posts::delete_post));

    Router::new()
        .nest("/api/user", user_routes)
        .nest("/api/post", post_routes)
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(from_fn(log_requests))
        .layer(cors_layer(allowed_origins))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));
    if origins.is_empty() {
        layer.allow_origin(AllowOrigin::any())
    } else {
        layer.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
    }
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    info!(
        "{method} {path} -> {} ({} ms)",
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// Connects to Redis, binds the listener and serves until Ctrl+C or SIGTERM.
pub async fn serve(config: TetherConfig) -> Result<()> {
    let redis_url = config.redis_url()?;
    info!("Connecting to Redis...");
    let client = Client::connect(&redis_url, config.redis.prefix.clone())
        .await
        .context("Failed to connect to Redis")?;
    let state = AppState::new(&client, &config);
    let app = router(state, &config.server.allowed_origins);

    let address = config.server.bind.as_str();
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                warn!("Failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
