//! State catalogue endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use super::{AppState, ApiJson, ApiPath, optional_text, required_text};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub(super) struct CreateStateBody {
    name: Option<String>,
    color: Option<String>,
    slug: Option<String>,
}

/// Display fields only. A `slug` in the body is ignored.
#[derive(Debug, Deserialize)]
pub(super) struct UpdateStateBody {
    name: Option<String>,
    color: Option<String>,
}

pub(super) async fn create_state(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateStateBody>,
) -> ApiResult<impl IntoResponse> {
    let name = required_text(body.name, "name")?;
    let color = required_text(body.color, "color")?;
    let slug = required_text(body.slug, "slug")?;

    let created = state
        .db
        .create_state(name.trim(), color.trim(), slug.trim())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "State created successfully", "state": created })),
    ))
}

pub(super) async fn list_states(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let states = state.db.list_states()?;
    Ok(Json(json!({ "states": states })))
}

pub(super) async fn update_state(
    State(state): State<AppState>,
    ApiPath(state_id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateStateBody>,
) -> ApiResult<impl IntoResponse> {
    let name = optional_text(body.name);
    let color = optional_text(body.color);

    let updated = state
        .db
        .update_state(state_id, name.as_deref(), color.as_deref())?
        .ok_or_else(|| ApiError::state_not_found(state_id))?;
    Ok(Json(json!({ "message": "State updated successfully", "state": updated })))
}

pub(super) async fn delete_state(
    State(state): State<AppState>,
    ApiPath(state_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    if !state.db.delete_state(state_id)? {
        return Err(ApiError::state_not_found(state_id));
    }
    Ok(Json(json!({ "message": "State deleted successfully" })))
}
