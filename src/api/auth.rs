use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::auth::{
    clear_session_cookie, generate_salt, hash_password, issue_token, session_cookie,
    verify_password,
};
use crate::db::UserRepository;
use crate::error::{ApiError, FieldError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Validate and sanitize username
pub(crate) fn validate_username(username: &str) -> Result<String, ApiError> {
    let trimmed = username.trim();

    if trimmed.len() < 3 || trimmed.len() > 32 {
        return Err(ApiError::validation_fields(
            "Invalid username",
            vec![FieldError::new("username", "Username must be 3-32 characters")],
        ));
    }

    if !trimmed.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::validation_fields(
            "Invalid username",
            vec![FieldError::new(
                "username",
                "Username must be alphanumeric, underscore, or hyphen",
            )],
        ));
    }

    Ok(trimmed.to_lowercase())
}

/// Shape check equivalent to the classic `local@domain.tld` pattern:
/// no whitespace, exactly one '@', a dot-separated domain.
pub(crate) fn validate_email(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim();
    let invalid = || {
        ApiError::validation_fields(
            "Invalid email format",
            vec![FieldError::new("email", "Invalid email format")],
        )
    };

    let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || local.chars().any(char::is_whitespace)
        || domain.contains('@')
        || domain.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    let mut segments = domain.split('.');
    let head = segments.next().unwrap_or("");
    let rest: Vec<&str> = segments.collect();
    if head.is_empty() || rest.is_empty() || rest.iter().any(|s| s.is_empty()) {
        return Err(invalid());
    }

    Ok(trimmed.to_string())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 {
        return Err(ApiError::validation_fields(
            "Password must be at least 6 characters long",
            vec![FieldError::new(
                "password",
                "Password must be at least 6 characters",
            )],
        ));
    }
    Ok(())
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = validate_username(&req.username)?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;

    let full_name = req.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ApiError::validation_fields(
            "Full name is required",
            vec![FieldError::new("fullName", "Full name is required")],
        ));
    }

    if UserRepository::get_by_username(&state.db, &username).await?.is_some() {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }
    if UserRepository::get_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email is already taken".to_string()));
    }

    let salt = generate_salt();
    let password_hash = hash_password(&req.password, &salt)?;

    let user =
        UserRepository::create(&state.db, username, email, full_name, &password_hash, &salt)
            .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    let token = issue_token(&user.id, &state.config.token_secret, state.config.token_expiry_days)?;
    let cookie = session_cookie(&token, state.config.token_expiry_days);
    let profile = UserRepository::profile_view(&state.db, &user).await?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(profile),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_lowercase();

    let user = UserRepository::get_by_username(&state.db, &username).await?;

    // Run the hash either way so a missing username costs the same as a
    // mismatched password. Failure is uniform: no enumeration signal.
    let valid = match &user {
        Some(user) => verify_password(&req.password, &user.password_hash, &user.password_salt)?,
        None => {
            let _ = hash_password(&req.password, &[0u8; 32])?;
            false
        }
    };

    let user = match (user, valid) {
        (Some(user), true) => user,
        _ => {
            return Err(ApiError::Unauthorized(
                "Invalid username or password".to_string(),
            ))
        }
    };

    tracing::info!(user_id = %user.id, "user logged in");

    let token = issue_token(&user.id, &state.config.token_secret, state.config.token_expiry_days)?;
    let cookie = session_cookie(&token, state.config.token_expiry_days);
    let profile = UserRepository::profile_view(&state.db, &user).await?;

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(profile)))
}

/// POST /api/auth/logout (requires auth). Sessions are stateless; logging out
/// means telling the client to drop the cookie.
pub async fn logout() -> Result<impl IntoResponse, ApiError> {
    Ok((
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    ))
}

/// GET /api/auth/me (requires auth)
pub async fn me(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserRepository::get_by_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let profile = UserRepository::profile_view(&state.db, &user).await?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("  Ada_99 ").unwrap(), "ada_99");
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada@sub.example.com").is_ok());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("ada@nodot").is_err());
        assert!(validate_email("a da@example.com").is_err());
        assert!(validate_email("ada@exa mple.com").is_err());
    }
}
