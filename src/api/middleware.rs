use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::api::state::AppState;
use crate::auth::{verify_token, SESSION_COOKIE};
use crate::db::UserRepository;
use crate::error::ApiError;

/// Pull the session token off the request: the `sid` cookie is the primary
/// transport, a Bearer header is accepted as an equivalent.
fn extract_token(request: &Request) -> Option<String> {
    if let Some(cookies) = request.headers().get("Cookie").and_then(|h| h.to_str().ok()) {
        for pair in cookies.split(';') {
            let pair = pair.trim();
            if let Some(value) = pair.strip_prefix(SESSION_COOKIE) {
                if let Some(token) = value.strip_prefix('=') {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Session middleware. Verifies the signed token, confirms the subject still
/// exists, and stores the user id in request extensions for handlers.
///
/// A valid signature whose subject has vanished is NotFound, not Unauthorized:
/// the credential was genuine, the account is gone.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("No session token provided".to_string()))?;

    let user_id = verify_token(&token, &state.config.token_secret)?;

    if !UserRepository::exists(&state.db, &user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    request.extensions_mut().insert(user_id);

    Ok(next.run(request).await)
}

/// Simple in-memory rate limiter, tracked per client IP.
#[derive(Clone)]
pub struct RateLimiter {
    // IP -> (count, window_start)
    state: Arc<Mutex<HashMap<IpAddr, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub async fn check(&self, ip: IpAddr) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let entry = state.entry(ip).or_insert((0, now));

        if now.duration_since(entry.1) > self.window {
            *entry = (1, now);
            return true;
        }

        if entry.0 < self.max_requests {
            entry.0 += 1;
            true
        } else {
            false
        }
    }

    /// Drop entries whose window is long past.
    pub async fn cleanup(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.retain(|_, (_, start)| now.duration_since(*start) <= self.window * 2);
    }
}

pub async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = request
        .extensions()
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)));

    if !limiter.check(ip).await {
        return Err(ApiError::Forbidden("Rate limit exceeded".to_string()));
    }

    Ok(next.run(request).await)
}
