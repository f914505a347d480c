//! Parent account endpoints: signup, login, current account, logout.

use anyhow::anyhow;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use crate::auth;
use crate::db;
use crate::models::{Account, LoginInput, SignupInput, SignupResponse, TokenResponse};

use super::{validate_name, ApiError, AppState, Parent};

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let name = validate_name(&input.name)?;
    validate_email(&input.email)?;
    validate_password(&input.password)?;

    // Pre-query for a friendly error; the unique index still backstops
    // concurrent signups below.
    if state.db.get_account_by_email(&input.email)?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    // Hashing is intentionally slow; keep it off the async executor.
    let password = input.password;
    let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| anyhow!(e))?
        .map_err(|_| anyhow!("password hashing failed"))?;

    let account = state
        .db
        .create_account(&name, &input.email, &password_hash)
        .map_err(|e| {
            if db::is_constraint_violation(&e) {
                ApiError::Conflict("Email already registered".into())
            } else {
                ApiError::Internal(e)
            }
        })?;

    tracing::info!(email = %account.email, "new account registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully".into(),
            user_id: account.id,
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<TokenResponse>, ApiError> {
    // Unknown email and wrong password produce the same response, so a
    // caller cannot enumerate accounts.
    let Some((account, stored_hash)) = state.db.credentials_for_email(&input.email)? else {
        tracing::warn!(email = %input.email, "login attempt for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    let password = input.password;
    let matches =
        tokio::task::spawn_blocking(move || auth::verify_password(&password, &stored_hash))
            .await
            .map_err(|e| anyhow!(e))?;
    if !matches {
        tracing::warn!(email = %account.email, "failed login attempt");
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::create_access_token(
        &account.email,
        &state.settings.secret_key,
        state.settings.token_ttl(),
    );

    tracing::info!(email = %account.email, "successful login");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".into(),
        expires_in: state.settings.token_expire_minutes * 60,
    }))
}

/// GET /me
pub async fn me(
    State(state): State<AppState>,
    Parent(email): Parent,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .db
        .get_account_by_email(&email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(account))
}

/// POST /logout
///
/// Stateless: no revocation exists server-side, the client discards the
/// token and it stays valid until natural expiry.
pub async fn logout() -> Json<serde_json::Value> {
    Json(json!({ "message": "Successfully logged out" }))
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation("Invalid email address".into()))
    }
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters long".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::Validation(
            "Password must contain at least one uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ApiError::Validation(
            "Password must contain at least one lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::Validation(
            "Password must contain at least one digit".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_policy() {
        assert!(validate_password("SecurePass123").is_ok());
        assert!(validate_password("Short1A").is_err()); // too short
        assert!(validate_password("alllowercase1").is_err()); // no uppercase
        assert!(validate_password("ALLUPPERCASE1").is_err()); // no lowercase
        assert!(validate_password("NoDigitsHere").is_err()); // no digit
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("test@nodot").is_err());
    }
}
