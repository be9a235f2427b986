mod error;
mod handlers;
mod middleware;
mod state;

pub use error::{ApiError, codes, proxy_error_response};
pub use state::ApiState;

use axum::Router;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};

/// Build the full router: the verbatim proxy surface at the root plus the
/// typed analytics API under `/api/v1`.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/auth", post(handlers::refresh_auth))
        .route("/register", post(handlers::register))
        .route("/users", get(handlers::proxy_users))
        .route("/users/{user_id}/posts", get(handlers::proxy_user_posts))
        .route(
            "/posts/{post_id}/comments",
            get(handlers::proxy_post_comments),
        )
        .route("/api/v1/analytics/top-users", get(handlers::top_users))
        .route("/api/v1/users/{user_id}/posts", get(handlers::user_posts))
        .route(
            "/api/v1/posts/{post_id}/comments",
            get(handlers::post_comments),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
}
