//! Child-profile endpoints. Both require a verified parent identity.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::db;
use crate::models::{Kid, KidSignupInput};

use super::{validate_name, ApiError, AppState, Parent};

/// POST /kids/signup
pub async fn signup(
    State(state): State<AppState>,
    Parent(email): Parent,
    Json(mut input): Json<KidSignupInput>,
) -> Result<(StatusCode, Json<Kid>), ApiError> {
    input.name = validate_name(&input.name)?;

    let parent = state
        .db
        .get_account_by_email(&email)?
        .ok_or_else(|| ApiError::NotFound("Parent user not found".into()))?;

    if state.db.get_kid_by_name(parent.id, &input.name)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Kid '{}' already exists",
            input.name
        )));
    }

    let kid = state.db.create_kid(parent.id, &input).map_err(|e| {
        if db::is_constraint_violation(&e) {
            ApiError::Conflict(format!("Kid '{}' already exists", input.name))
        } else {
            ApiError::Internal(e)
        }
    })?;

    tracing::info!(parent = %parent.email, kid = %kid.name, "kid profile created");

    Ok((StatusCode::CREATED, Json(kid)))
}

/// GET /kids/
pub async fn list(
    State(state): State<AppState>,
    Parent(email): Parent,
) -> Result<Json<Vec<Kid>>, ApiError> {
    let parent = state
        .db
        .get_account_by_email(&email)?
        .ok_or_else(|| ApiError::NotFound("Parent not found".into()))?;

    let kids = state.db.kids_for_parent(parent.id)?;
    Ok(Json(kids))
}
