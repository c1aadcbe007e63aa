use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderName, header},
    response::{AppendHeaders, IntoResponse},
};
use log::info;

use crate::{
    errors::{RepoError, ValidationError},
    http::{
        AppState,
        error::{ApiError, ApiJson, ApiResult},
        extract::{MaybeSession, RequireSession, cleared_session_cookie, session_cookie, token_from_headers},
        schema::{
            AuthResponse, ConnectionView, LoginRequest, MessageResponse, ProfileResponse, ProfilesResponse,
            SchemaVersion, SessionUserResponse,
        },
    },
    models::{MediaKind, NewUser, ProfileUpdate, User},
};

pub(super) async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<SignedIn> {
    let user = state.identity.register(input).await?;
    signed_in(&state, user).await
}

pub(super) async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> ApiResult<SignedIn> {
    let user = state.identity.authenticate(&input.email, &input.password).await?;
    info!("user {} signed in", user.id);
    signed_in(&state, user).await
}

type SignedIn = (AppendHeaders<[(HeaderName, String); 1]>, Json<AuthResponse>);

async fn signed_in(state: &AppState, user: User) -> ApiResult<SignedIn> {
    let session = state.sessions.issue(&user.id).await?;
    let cookie = session_cookie(&session.token, state.session_ttl_secs);
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(AuthResponse {
            schema_version: SchemaVersion,
            success: true,
            token: session.token,
            user: user.public(),
        }),
    ))
}

pub(super) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.revoke(&token).await?;
    }
    Ok((
        AppendHeaders([(header::SET_COOKIE, cleared_session_cookie())]),
        Json(MessageResponse::ok("signed out")),
    ))
}

pub(super) async fn is_auth(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> ApiResult<Json<SessionUserResponse>> {
    // a session whose user has vanished is as good as no session
    let user = state.identity.get(&session.user_id).await?.ok_or(RepoError::Unauthorized)?;
    Ok(Json(SessionUserResponse {
        schema_version: SchemaVersion,
        success: true,
        user: user.public(),
    }))
}

pub(super) async fn own_profile(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> ApiResult<Json<ProfileResponse>> {
    profile_response(&state, &session.user_id, None).await
}

pub(super) async fn user_profile(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let viewer = session.as_ref().map(|s| s.user_id.as_str());
    profile_response(&state, &user_id, viewer).await
}

async fn profile_response(state: &AppState, target_id: &str, viewer_id: Option<&str>) -> ApiResult<Json<ProfileResponse>> {
    let summary = state.profiles.summary(target_id, viewer_id).await?;
    Ok(Json(ProfileResponse {
        schema_version: SchemaVersion,
        success: true,
        profile: summary.into(),
    }))
}

pub(super) async fn all_profiles(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> ApiResult<Json<ProfilesResponse>> {
    let viewer = session.as_ref().map(|s| s.user_id.as_str());
    let entries = state.profiles.directory(viewer).await?;
    Ok(Json(ProfilesResponse {
        schema_version: SchemaVersion,
        success: true,
        profiles: entries.into_iter().map(ConnectionView::from).collect(),
    }))
}

pub(super) async fn update_profile(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<ProfileResponse>> {
    state.identity.update_profile(&session.user_id, update).await?;
    profile_response(&state, &session.user_id, None).await
}

pub(super) async fn upload_profile_picture(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    mut multipart: Multipart,
) -> ApiResult<Json<ProfileResponse>> {
    let mut stored = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        let kind = state.media_policy.classify("image", content_type.as_deref(), bytes.len())?;
        if kind != MediaKind::Image {
            return Err(ValidationError::single("image", "unsupported_media_type", "profile pictures must be images").into());
        }
        stored = Some(state.media.save(kind, file_name.as_deref(), &bytes).await?);
        break;
    }
    let media = stored.ok_or_else(|| ApiError::from(ValidationError::single("image", "required", "no image uploaded")))?;

    let previous = match state.identity.set_profile_picture(&session.user_id, &media.reference).await {
        Ok((_, previous)) => previous,
        Err(err) => {
            state.media.remove(&media.reference).await;
            return Err(err.into());
        }
    };
    if let Some(previous) = previous {
        state.media.remove(&previous).await;
    }
    profile_response(&state, &session.user_id, None).await
}

pub(super) async fn remove_profile_picture(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> ApiResult<Json<ProfileResponse>> {
    let (_, previous) = state.identity.remove_profile_picture(&session.user_id).await?;
    if let Some(previous) = previous {
        state.media.remove(&previous).await;
    }
    profile_response(&state, &session.user_id, None).await
}
