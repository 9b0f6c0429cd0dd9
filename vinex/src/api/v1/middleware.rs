//! Bearer key check for the protected v1 routes.
//!
//! Keys come from `VINEX_API_KEYS`. With no keys configured the protected
//! routes stay locked while `/health` and the docs remain reachable.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

/// Why a request was turned away. The `Display` text is the client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denied {
    NoKeysConfigured,
    MissingHeader,
    MalformedHeader,
    UnknownKey,
}

impl Denied {
    fn message(self) -> &'static str {
        match self {
            Self::NoKeysConfigured => {
                "API keys not configured. Set VINEX_API_KEYS to enable access."
            }
            Self::MissingHeader => "Missing authorization header",
            Self::MalformedHeader => {
                "Invalid authorization header format. Expected: Bearer <token>"
            }
            Self::UnknownKey => "Invalid API key",
        }
    }
}

fn authorize(keys: &[String], headers: &HeaderMap) -> Result<(), Denied> {
    if keys.is_empty() {
        return Err(Denied::NoKeysConfigured);
    }

    let header = headers.get(AUTHORIZATION).ok_or(Denied::MissingHeader)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(Denied::MalformedHeader)?;

    if keys.iter().any(|key| key == token) {
        Ok(())
    } else {
        Err(Denied::UnknownKey)
    }
}

pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match authorize(&state.config.server.api_keys, request.headers()) {
        Ok(()) => next.run(request).await,
        Err(denied) => {
            tracing::debug!(reason = ?denied, path = %request.uri().path(), "Rejected request");
            ApiResponse::<()>::error(ErrorCode::Unauthorized, denied.message()).into_response()
        }
    }
}
