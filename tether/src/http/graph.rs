use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    errors::RepoError,
    http::{
        AppState,
        error::{ApiJson, ApiResult},
        extract::{MaybeSession, RequireSession},
        schema::{
            CheckFollowingResponse, ConnectionView, CountsResponse, FollowRequest, FollowResponse, FollowersResponse,
            FollowingResponse, PageQuery, SchemaVersion,
        },
    },
    models::{DEFAULT_PAGE_SIZE, FollowOutcome, Page},
};

pub(super) async fn follow(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    ApiJson(request): ApiJson<FollowRequest>,
) -> ApiResult<Json<FollowResponse>> {
    let outcome = state.relationships.follow(&session.user_id, &request.following_id).await?;
    let (changed, message) = match outcome {
        FollowOutcome::Followed => (true, "followed"),
        FollowOutcome::AlreadyFollowing => (false, "already following"),
    };
    Ok(Json(FollowResponse {
        schema_version: SchemaVersion,
        success: true,
        message: message.to_string(),
        changed,
        is_following: true,
    }))
}

pub(super) async fn unfollow(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    ApiJson(request): ApiJson<FollowRequest>,
) -> ApiResult<Json<FollowResponse>> {
    let removed = state.relationships.unfollow(&session.user_id, &request.following_id).await?;
    Ok(Json(FollowResponse {
        schema_version: SchemaVersion,
        success: true,
        message: if removed { "unfollowed" } else { "not following" }.to_string(),
        changed: removed,
        is_following: false,
    }))
}

pub(super) async fn check_following(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(user_id): Path<String>,
) -> ApiResult<Json<CheckFollowingResponse>> {
    let flags = state.relationships.follow_flags(&session.user_id, &[user_id]).await?;
    let (forward, backward) = flags.first().copied().unwrap_or_default();
    Ok(Json(CheckFollowingResponse {
        schema_version: SchemaVersion,
        success: true,
        is_following: forward,
        is_mutual: forward && backward,
    }))
}

pub(super) async fn followers(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<FollowersResponse>> {
    ensure_user(&state, &user_id).await?;
    let edges = state.relationships.list_followers(&user_id, page_from(&query)).await?;
    let viewer = session.as_ref().map(|s| s.user_id.as_str());
    let entries = state.profiles.annotate(viewer, edges).await?;
    Ok(Json(FollowersResponse {
        schema_version: SchemaVersion,
        success: true,
        followers: entries.into_iter().map(ConnectionView::from).collect(),
    }))
}

pub(super) async fn following(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<FollowingResponse>> {
    ensure_user(&state, &user_id).await?;
    let edges = state.relationships.list_following(&user_id, page_from(&query)).await?;
    let viewer = session.as_ref().map(|s| s.user_id.as_str());
    let entries = state.profiles.annotate(viewer, edges).await?;
    Ok(Json(FollowingResponse {
        schema_version: SchemaVersion,
        success: true,
        following: entries.into_iter().map(ConnectionView::from).collect(),
    }))
}

pub(super) async fn connection_counts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<CountsResponse>> {
    ensure_user(&state, &user_id).await?;
    let counts = state.relationships.counts(&user_id).await?;
    Ok(Json(CountsResponse {
        schema_version: SchemaVersion,
        success: true,
        counts,
    }))
}

/// Connection endpoints answer 404 for ids that name no user.
async fn ensure_user(state: &AppState, user_id: &str) -> Result<(), RepoError> {
    if state.identity.exists(user_id).await? {
        Ok(())
    } else {
        Err(RepoError::not_found(user_id))
    }
}

/// No query parameters means the whole list.
pub(super) fn page_from(query: &PageQuery) -> Option<Page> {
    match (query.page, query.page_size) {
        (None, None) => None,
        (page, page_size) => Some(Page::new(page.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))),
    }
}
