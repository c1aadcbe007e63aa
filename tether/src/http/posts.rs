use axum::{
    Json,
    extract::{Multipart, Query, State, rejection::QueryRejection},
};

use crate::{
    http::{
        AppState,
        error::{ApiJson, ApiResult},
        extract::{MaybeSession, RequireSession},
        graph::page_from,
        schema::{
            CommentDto, CommentRequest, CommentResponse, CommentsQuery, CommentsResponse, DeleteCommentRequest,
            LikeResponse, MessageResponse, PageQuery, PostIdRequest, PostResponse, PostView, PostsResponse,
            SchemaVersion,
        },
    },
    models::{Media, NewPost},
};

/// Multipart form with an optional `body` text field and an optional `media` file.
pub(super) async fn upload(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    mut multipart: Multipart,
) -> ApiResult<Json<PostResponse>> {
    let mut body = None;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("body") => body = Some(field.text().await?),
            Some("media") => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                let kind = state.media_policy.classify("media", content_type.as_deref(), bytes.len())?;
                upload = Some((kind, file_name, bytes));
            }
            _ => {}
        }
    }

    // validate text before anything touches the disk
    let draft = NewPost::new(body, None);
    if upload.is_none() {
        draft.clone().validate()?;
    }
    let media: Option<Media> = match upload {
        Some((kind, file_name, bytes)) => Some(state.media.save(kind, file_name.as_deref(), &bytes).await?),
        None => None,
    };
    let post = match state.posts.create_post(&session.user_id, NewPost { media: media.clone(), ..draft }).await {
        Ok(post) => post,
        Err(err) => {
            if let Some(media) = media {
                state.media.remove(&media.reference).await;
            }
            return Err(err.into());
        }
    };

    let author = state.identity.require(&session.user_id).await?;
    let view = PostView {
        id: post.id,
        author: author.public(),
        body: post.body,
        media: post.media,
        created_at: post.created_at,
        likes: 0,
        is_liked: false,
        comments: 0,
    };
    Ok(Json(PostResponse {
        schema_version: SchemaVersion,
        success: true,
        post: view,
    }))
}

/// The feed. Without a session this is an empty list, not an error.
pub(super) async fn all_posts(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PostsResponse>> {
    let Some(session) = session else {
        return Ok(Json(PostsResponse {
            schema_version: SchemaVersion,
            success: true,
            message: Some("please sign in".to_string()),
            posts: Vec::new(),
        }));
    };
    let items = state.feed.feed(Some(&session.user_id), page_from(&query)).await?;
    Ok(Json(PostsResponse {
        schema_version: SchemaVersion,
        success: true,
        message: None,
        posts: items.into_iter().map(PostView::from).collect(),
    }))
}

pub(super) async fn my_posts(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PostsResponse>> {
    let items = state
        .feed
        .author_feed(&session.user_id, Some(&session.user_id), page_from(&query))
        .await?;
    Ok(Json(PostsResponse {
        schema_version: SchemaVersion,
        success: true,
        message: None,
        posts: items.into_iter().map(PostView::from).collect(),
    }))
}

pub(super) async fn like(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    ApiJson(request): ApiJson<PostIdRequest>,
) -> ApiResult<Json<LikeResponse>> {
    let outcome = state.posts.like(&request.post_id, &session.user_id, state.like_mode).await?;
    Ok(Json(LikeResponse {
        schema_version: SchemaVersion,
        success: true,
        likes: outcome.likes,
        liked: outcome.liked,
    }))
}

pub(super) async fn comment(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    ApiJson(request): ApiJson<CommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    let comment = state.posts.add_comment(&request.post_id, &session.user_id, &request.body).await?;
    let author = state.identity.require(&session.user_id).await?;
    Ok(Json(CommentResponse {
        schema_version: SchemaVersion,
        success: true,
        comment: CommentDto {
            id: comment.id,
            post_id: comment.post_id,
            author: author.public(),
            body: comment.body,
            created_at: comment.created_at,
        },
    }))
}

pub(super) async fn comments(
    State(state): State<AppState>,
    query: Result<Query<CommentsQuery>, QueryRejection>,
) -> ApiResult<Json<CommentsResponse>> {
    let Query(query) = query?;
    let comments = state.feed.comments_for(&query.post_id).await?;
    Ok(Json(CommentsResponse {
        schema_version: SchemaVersion,
        success: true,
        comments: comments.into_iter().map(CommentDto::from).collect(),
    }))
}

pub(super) async fn delete_comment(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    ApiJson(request): ApiJson<DeleteCommentRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.posts.delete_comment(&request.comment_id, &session.user_id).await?;
    Ok(Json(MessageResponse::ok("comment deleted")))
}

pub(super) async fn delete_post(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    ApiJson(request): ApiJson<PostIdRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let media = state.posts.get(&request.post_id).await?.and_then(|post| post.media);
    state.posts.delete_post(&request.post_id, &session.user_id).await?;
    if let Some(media) = media {
        state.media.remove(&media.reference).await;
    }
    Ok(Json(MessageResponse::ok("post deleted")))
}
