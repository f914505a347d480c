//! HTTP API: router, shared state, error taxonomy, and the bearer-token
//! extractor used by every protected handler.

mod kids;
mod users;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AuthError};
use crate::config::Settings;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<Settings>,
}

pub fn create_router(db: Database, settings: Settings) -> Router {
    let state = AppState {
        db,
        settings: Arc::new(settings),
    };

    Router::new()
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/me", get(users::me))
        .route("/logout", post(users::logout))
        .route("/kids/signup", post(kids::signup))
        .route("/kids/", get(kids::list))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error taxonomy for every handler. Expected domain errors carry their
/// own status and message; anything unanticipated becomes a 500 with a
/// generic body and a server-side log entry.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Could not validate credentials")]
    Unauthorized,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(String),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        Self::Unauthorized
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(err) => {
                // Full detail stays server-side.
                tracing::error!(error = ?err, "internal error while handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// The verified parent identity, extracted from `Authorization: Bearer`.
/// Holds the token's subject email; handlers still resolve it to an
/// account, which can fail with 404 if the account is gone.
pub struct Parent(pub String);

impl FromRequestParts<AppState> for Parent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let email = auth::verify_token(token, &state.settings.secret_key)?;
        Ok(Parent(email))
    }
}

/// Shared name rule for parents and kids: 2..=50 chars after trimming.
fn validate_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < 2 {
        return Err(ApiError::Validation(
            "Name must be at least 2 characters long".into(),
        ));
    }
    if trimmed.chars().count() > 50 {
        return Err(ApiError::Validation(
            "Name must be less than 50 characters".into(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_bounded() {
        assert_eq!(validate_name("  Zaid  ").unwrap(), "Zaid");
        assert!(validate_name(" a ").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
        assert_eq!(validate_name(&"x".repeat(50)).unwrap().len(), 50);
    }
}
