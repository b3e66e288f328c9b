pub mod auth;
pub mod dm;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod state;
pub mod users;

pub use middleware::RateLimiter;
pub use state::AppState;

use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    timestamp: String,
}

pub fn create_router(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Everything except signup/login/health sits behind the session middleware.
    let protected = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Users and the follow graph
        .route("/api/users/follow/:id", post(users::follow_user))
        .route("/api/users/profile/:username", get(users::get_profile))
        .route("/api/users/suggested", get(users::get_suggested))
        .route("/api/users/update", post(users::update_profile))
        // Feeds
        .route("/api/posts/all", get(posts::get_all_posts))
        .route("/api/posts/following", get(posts::get_following_posts))
        .route("/api/posts/user/:username", get(posts::get_user_posts))
        .route("/api/posts/likes/:id", get(posts::get_liked_posts))
        .route("/api/posts/bookmarks/:id", get(posts::get_bookmarked_posts))
        .route("/api/posts/reposts/:id", get(posts::get_reposted_posts))
        // Post management
        .route("/api/posts/create", post(posts::create_post))
        .route("/api/posts/like/:id", post(posts::like_post))
        .route("/api/posts/bookmark/:id", post(posts::bookmark_post))
        .route("/api/posts/repost/:id", post(posts::repost_post))
        .route("/api/posts/comment/:id", post(posts::comment_on_post))
        .route("/api/posts/:id", delete(posts::delete_post))
        // Notifications
        .route(
            "/api/notifications",
            get(notifications::get_notifications).delete(notifications::delete_notifications),
        )
        // Direct messaging
        .route("/api/dm/start", post(dm::start_conversation))
        .route("/api/dm/message/:id", post(dm::send_message))
        .route("/api/dm/conversations", get(dm::get_conversations))
        .route("/api/dm/:id/messages", get(dm::get_messages))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .layer(axum_middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            middleware::rate_limit_middleware(limiter, req, next)
        }))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
