use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::db::models::PostView;
use crate::db::{
    Interaction, NotificationKind, NotificationRepository, PostRepository, UserRepository,
};
use crate::error::{ApiError, FieldError};

const MAX_TEXT_LEN: usize = 5000;
const MAX_PAGE_SIZE: i64 = 50;
const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// page >= 1, limit 1..=50 (default 10). Out-of-range values are rejected,
/// not clamped.
fn parse_pagination(query: &FeedQuery) -> Result<(i64, i64), ApiError> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(ApiError::validation_fields(
            "Invalid query parameters",
            vec![FieldError::new("page", "Page must be at least 1")],
        ));
    }

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::validation_fields(
            "Invalid query parameters",
            vec![FieldError::new("limit", "Limit must be between 1 and 50")],
        ));
    }

    Ok((page, limit))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub text: Option<String>,
    pub img: Option<String>,
}

/// POST /api/posts/create. The image, when present, is the retrieval URL the
/// external image host produced; it is stored as an opaque string.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let img = req.img.filter(|i| !i.is_empty());

    if text.is_none() && img.is_none() {
        return Err(ApiError::validation("Post must contain text or an image"));
    }
    if let Some(text) = &text {
        if text.len() > MAX_TEXT_LEN {
            return Err(ApiError::validation_fields(
                "Post text is too long",
                vec![FieldError::new("text", "Text must be at most 5000 characters")],
            ));
        }
    }

    let post = PostRepository::create(&state.db, &user_id, text, img).await?;
    tracing::info!(post_id = %post.id, author = %user_id, "post created");

    let mut views = PostRepository::hydrate(&state.db, vec![post]).await?;
    let view = views
        .pop()
        .ok_or_else(|| ApiError::Internal("Failed to resolve created post".to_string()))?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /api/posts/:id — author only.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Path(post_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let post = PostRepository::get(&state.db, &post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.user_id != user_id {
        return Err(ApiError::Forbidden(
            "You can only delete your own posts".to_string(),
        ));
    }

    if let Some(img) = &post.img {
        // The image host owns the asset; surface the orphaned URL for reaping.
        tracing::info!(post_id = %post.id, img = %img, "post image orphaned by deletion");
    }

    PostRepository::delete(&state.db, &post_id).await?;
    tracing::info!(post_id = %post_id, "post deleted");

    Ok(Json(serde_json::json!({ "message": "Post deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// POST /api/posts/comment/:id — append-only; returns the updated post view.
pub async fn comment_on_post(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Path(post_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::validation_fields(
            "Comment text is required",
            vec![FieldError::new("text", "Text field is required")],
        ));
    }

    let post = PostRepository::get(&state.db, &post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    PostRepository::add_comment(&state.db, &post.id, &user_id, &text).await?;

    let mut views = PostRepository::hydrate(&state.db, vec![post]).await?;
    let view = views
        .pop()
        .ok_or_else(|| ApiError::Internal("Failed to resolve commented post".to_string()))?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Toggle the actor's membership in one of the post's interaction sets and
/// return the updated member list. A fresh like notifies the author; bookmark
/// and repost toggles generate no notifications.
async fn toggle(
    state: &AppState,
    interaction: Interaction,
    post_id: &str,
    user_id: &str,
) -> Result<Vec<String>, ApiError> {
    let outcome =
        PostRepository::toggle_interaction(&state.db, interaction, post_id, user_id).await?;

    if outcome.added && interaction == Interaction::Like {
        NotificationRepository::notify(
            &state.db,
            user_id,
            &outcome.author_id,
            NotificationKind::Like,
        )
        .await?;
    }

    PostRepository::interaction_member_ids(&state.db, interaction, post_id).await
}

/// POST /api/posts/like/:id
pub async fn like_post(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(toggle(&state, Interaction::Like, &post_id, &user_id).await?))
}

/// POST /api/posts/bookmark/:id
pub async fn bookmark_post(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(toggle(&state, Interaction::Bookmark, &post_id, &user_id).await?))
}

/// POST /api/posts/repost/:id
pub async fn repost_post(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(toggle(&state, Interaction::Repost, &post_id, &user_id).await?))
}

/// GET /api/posts/all
pub async fn get_all_posts(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let (page, limit) = parse_pagination(&query)?;
    let posts = PostRepository::global_feed(&state.db, page, limit).await?;
    Ok(Json(PostRepository::hydrate(&state.db, posts).await?))
}

/// GET /api/posts/following
pub async fn get_following_posts(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let (page, limit) = parse_pagination(&query)?;
    let posts = PostRepository::following_feed(&state.db, &user_id, page, limit).await?;
    Ok(Json(PostRepository::hydrate(&state.db, posts).await?))
}

/// GET /api/posts/user/:username
pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let (page, limit) = parse_pagination(&query)?;
    let user = UserRepository::get_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let posts = PostRepository::user_feed(&state.db, &user.id, page, limit).await?;
    Ok(Json(PostRepository::hydrate(&state.db, posts).await?))
}

async fn interaction_feed(
    state: &AppState,
    interaction: Interaction,
    user_id: &str,
    query: &FeedQuery,
) -> Result<Vec<PostView>, ApiError> {
    let (page, limit) = parse_pagination(query)?;
    if !UserRepository::exists(&state.db, user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let posts =
        PostRepository::interaction_feed(&state.db, interaction, user_id, page, limit).await?;
    PostRepository::hydrate(&state.db, posts).await
}

/// GET /api/posts/likes/:id
pub async fn get_liked_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    Ok(Json(interaction_feed(&state, Interaction::Like, &user_id, &query).await?))
}

/// GET /api/posts/bookmarks/:id
pub async fn get_bookmarked_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    Ok(Json(interaction_feed(&state, Interaction::Bookmark, &user_id, &query).await?))
}

/// GET /api/posts/reposts/:id
pub async fn get_reposted_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    Ok(Json(interaction_feed(&state, Interaction::Repost, &user_id, &query).await?))
}
