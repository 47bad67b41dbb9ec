//! Project endpoints and the day plan.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use super::{AppState, ApiJson, ApiPath, optional_text, provider_hint, required_text};
use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub(super) struct CreateProjectBody {
    name: Option<String>,
    description: Option<String>,
}

pub(super) async fn create_project(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<CreateProjectBody>,
) -> ApiResult<impl IntoResponse> {
    let name = required_text(body.name, "name")?;
    let description = optional_text(body.description).unwrap_or_default();

    // A valid token can outlive its user row.
    if state.db.get_user(caller.id)?.is_none() {
        return Err(ApiError::user_not_found());
    }
    let project = state
        .db
        .create_project(caller.id, name.trim(), &description)?;

    tracing::info!(project_id = project.id, owner_id = caller.id, "Created project");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Project created successfully", "project": project })),
    ))
}

pub(super) async fn list_projects(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let projects = state.db.list_project_summaries(caller.id)?;
    Ok(Json(json!({ "response": projects })))
}

pub(super) async fn delete_project(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(project_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .db
        .get_project(project_id)?
        .ok_or_else(|| ApiError::project_not_found(project_id))?;
    if project.owner_id != caller.id {
        return Err(ApiError::forbidden("Only the owner can delete a project."));
    }
    if !state.db.delete_project(project_id)? {
        return Err(ApiError::project_not_found(project_id));
    }

    tracing::info!(project_id, "Deleted project");
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

pub(super) async fn day_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(project_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let plan = state
        .assistant
        .compose_plan(project_id, provider_hint(&headers))
        .await?;
    Ok(Json(json!({ "planAnnotated": plan })))
}
