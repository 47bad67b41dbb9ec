//! Registration, login, and token refresh.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use super::{AppState, ApiJson, required_text};
use crate::auth::{Caller, hash_password, verify_password};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub(super) struct RegisterBody {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

pub(super) async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> ApiResult<impl IntoResponse> {
    let name = required_text(body.name, "name")?;
    let email = required_text(body.email, "email")?;
    let password = required_text(body.password, "password")?;

    if state.db.email_exists(&email)? {
        return Err(ApiError::already_exists("User").with_field("email"));
    }
    let hash = hash_password(&password, state.password_cost).await?;
    let user = state.db.create_user(name.trim(), &email, &hash)?;

    tracing::info!(user_id = user.id, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully", "user": user })),
    ))
}

pub(super) async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> ApiResult<impl IntoResponse> {
    let email = required_text(body.email, "email")?;
    let password = required_text(body.password, "password")?;

    let Some((user, stored_hash)) = state.db.find_user_credentials(&email)? else {
        return Err(ApiError::user_not_found());
    };
    if !verify_password(&password, &stored_hash).await? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state.tokens.issue(user.id, &user.email)?;
    Ok(Json(json!({ "token": token })))
}

/// A fresh token for the authenticated caller.
pub(super) async fn update_token(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .get_user(caller.id)?
        .ok_or_else(ApiError::user_not_found)?;
    let token = state.tokens.issue(user.id, &user.email)?;
    Ok(Json(json!({ "token": token })))
}
