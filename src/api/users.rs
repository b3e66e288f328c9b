use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::auth::{validate_email, validate_username};
use crate::api::state::AppState;
use crate::auth::{generate_salt, hash_password, verify_password};
use crate::db::{NotificationKind, NotificationRepository, PublicProfile, UserRepository};
use crate::error::{ApiError, FieldError};

/// POST /api/users/follow/:id — toggle follow state on the target user.
/// Following emits a `follow` notification; unfollowing emits nothing.
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Path(target_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if target_id == user_id {
        return Err(ApiError::validation("You cannot follow/unfollow yourself"));
    }

    if !UserRepository::exists(&state.db, &target_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let currently_following = UserRepository::is_following(&state.db, &user_id, &target_id).await?;

    if currently_following {
        UserRepository::unfollow(&state.db, &user_id, &target_id).await?;
        tracing::debug!(actor = %user_id, target = %target_id, "unfollowed");
        Ok(Json(serde_json::json!({
            "following": false,
            "message": "User unfollowed successfully"
        })))
    } else {
        UserRepository::follow(&state.db, &user_id, &target_id).await?;
        NotificationRepository::notify(&state.db, &user_id, &target_id, NotificationKind::Follow)
            .await?;
        tracing::debug!(actor = %user_id, target = %target_id, "followed");
        Ok(Json(serde_json::json!({
            "following": true,
            "message": "User followed successfully"
        })))
    }
}

/// GET /api/users/profile/:username
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<crate::db::models::ProfileView>, ApiError> {
    let user = UserRepository::get_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let profile = UserRepository::profile_view(&state.db, &user).await?;
    Ok(Json(profile))
}

/// GET /api/users/suggested — a few accounts the viewer does not follow yet.
pub async fn get_suggested(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
) -> Result<Json<Vec<PublicProfile>>, ApiError> {
    let users = UserRepository::suggested(&state.db, &user_id, 4).await?;
    Ok(Json(users.iter().map(|u| u.public()).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
}

/// POST /api/users/update — edit the authenticated user's profile. Identity
/// fields are re-checked for uniqueness; a password change needs the current
/// password.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<crate::db::models::ProfileView>, ApiError> {
    let mut user = UserRepository::get_by_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if req.current_password.is_some() != req.new_password.is_some() {
        return Err(ApiError::validation(
            "Please provide both current password and new password",
        ));
    }

    if let (Some(current), Some(new)) = (&req.current_password, &req.new_password) {
        if !verify_password(current, &user.password_hash, &user.password_salt)? {
            return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
        }
        if new.len() < 6 {
            return Err(ApiError::validation_fields(
                "Password must be at least 6 characters long",
                vec![FieldError::new(
                    "newPassword",
                    "Password must be at least 6 characters",
                )],
            ));
        }
        let salt = generate_salt();
        user.password_hash = hash_password(new, &salt)?.to_vec();
        user.password_salt = salt.to_vec();
    }

    if let Some(username) = &req.username {
        let username = validate_username(username)?;
        if username != user.username {
            if UserRepository::get_by_username(&state.db, &username).await?.is_some() {
                return Err(ApiError::Conflict("Username is already taken".to_string()));
            }
            user.username = username;
        }
    }

    if let Some(email) = &req.email {
        let email = validate_email(email)?;
        if email != user.email {
            if UserRepository::get_by_email(&state.db, &email).await?.is_some() {
                return Err(ApiError::Conflict("Email is already taken".to_string()));
            }
            user.email = email;
        }
    }

    if let Some(full_name) = req.full_name {
        let full_name = full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(ApiError::validation_fields(
                "Full name is required",
                vec![FieldError::new("fullName", "Full name is required")],
            ));
        }
        user.full_name = full_name;
    }
    if let Some(bio) = req.bio {
        user.bio = bio;
    }
    if let Some(link) = req.link {
        user.link = link;
    }
    if let Some(profile_img) = req.profile_img {
        user.profile_img = profile_img;
    }
    if let Some(cover_img) = req.cover_img {
        user.cover_img = cover_img;
    }

    let updated = UserRepository::update(&state.db, &user).await?;
    tracing::info!(user_id = %updated.id, "profile updated");

    let profile = UserRepository::profile_view(&state.db, &updated).await?;
    Ok(Json(profile))
}
