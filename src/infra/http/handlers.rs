//! Route handlers: passthrough proxying plus the typed analytics API.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use pulseboard_api_types::{
    CommentView, CommentsResponse, PostView, TopUser, TopUsersResponse, UserPostsResponse,
};

use super::error::{ApiError, proxy_error_response};
use super::state::ApiState;

pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// POST /auth: re-authenticate against the upstream, refresh the cached
/// token and relay the upstream token response.
pub async fn refresh_auth(State(state): State<ApiState>) -> Response {
    match state.upstream.refresh_auth().await {
        Ok(body) => Json(body).into_response(),
        Err(err) => proxy_error_response("infra::http::refresh_auth", err),
    }
}

/// POST /register: pure passthrough, no token injection.
pub async fn register(State(state): State<ApiState>, Json(payload): Json<Value>) -> Response {
    match state.upstream.register(payload).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => proxy_error_response("infra::http::register", err),
    }
}

pub async fn proxy_users(State(state): State<ApiState>) -> Response {
    match state.upstream.forward_get("users").await {
        Ok(body) => Json(body).into_response(),
        Err(err) => proxy_error_response("infra::http::proxy_users", err),
    }
}

pub async fn proxy_user_posts(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Response {
    match state
        .upstream
        .forward_get(&format!("users/{user_id}/posts"))
        .await
    {
        Ok(body) => Json(body).into_response(),
        Err(err) => proxy_error_response("infra::http::proxy_user_posts", err),
    }
}

pub async fn proxy_post_comments(
    State(state): State<ApiState>,
    Path(post_id): Path<String>,
) -> Response {
    match state
        .upstream
        .forward_get(&format!("posts/{post_id}/comments"))
        .await
    {
        Ok(body) => Json(body).into_response(),
        Err(err) => proxy_error_response("infra::http::proxy_post_comments", err),
    }
}

/// GET /api/v1/analytics/top-users: the ranking pipeline's output.
pub async fn top_users(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let ranked = state.ranking.top_users().await?;

    let users = ranked
        .into_iter()
        .map(|user| TopUser {
            id: user.id,
            name: user.name,
            post_count: user.post_count,
        })
        .collect();

    Ok(Json(TopUsersResponse { users }))
}

pub async fn user_posts(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.directory.list_posts(&user_id).await?;

    let posts = posts
        .into_iter()
        .map(|post| PostView {
            id: post.id,
            user_id: post.user_id,
            content: post.content,
        })
        .collect();

    Ok(Json(UserPostsResponse { posts }))
}

/// Comments are fetched fresh on every expansion; any memoization belongs
/// to the viewer's session, not to the service, so a new view always sees
/// the current upstream state.
pub async fn post_comments(
    State(state): State<ApiState>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.directory.list_comments(post_id).await?;

    let comments = comments
        .into_iter()
        .map(|comment| CommentView {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
        })
        .collect();

    Ok(Json(CommentsResponse { comments }))
}
