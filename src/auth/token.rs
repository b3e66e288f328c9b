use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Cookie the session token travels in.
pub const SESSION_COOKIE: &str = "sid";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user id the token was issued for.
    sub: String,
    /// Expiry, unix seconds.
    exp: i64,
    /// Issued at, unix seconds.
    iat: i64,
}

/// Sign a session token for `user_id`, valid for `expiry_days`.
pub fn issue_token(user_id: &str, secret: &str, expiry_days: i64) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + expiry_days * 24 * 3600,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token signing failed: {}", e)))
}

/// Verify signature and expiry; returns the subject user id.
/// Any decode failure maps to Unauthorized without distinguishing causes.
pub fn verify_token(token: &str, secret: &str) -> Result<String, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Invalid or expired session token".to_string()))?;

    Ok(data.claims.sub)
}

/// Set-Cookie value carrying the session token. HTTP-only and SameSite=Strict,
/// matching the transport contract of the API.
pub fn session_cookie(token: &str, expiry_days: i64) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE,
        token,
        expiry_days * 24 * 3600
    )
}

/// Set-Cookie value that instructs the client to discard the session token.
pub fn clear_session_cookie() -> String {
    format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Strict", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_verify_roundtrip() {
        let token = issue_token("user-1", "secret", 15).unwrap();
        assert_eq!(verify_token(&token, "secret").unwrap(), "user-1");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("user-1", "secret", 15).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_rejected() {
        // Negative expiry puts exp in the past.
        let token = issue_token("user-1", "secret", -1).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }
}
