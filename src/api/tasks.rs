//! Task endpoints, including the generated description and proposal.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use super::{
    AppState, ApiJson, ApiPath, ApiQuery, OptionalJson, optional_text, provider_hint, required_id,
    required_text,
};
use crate::assist::DescribeRequest;
use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateTaskBody {
    name: Option<String>,
    description: Option<String>,
    project_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UpdateTaskBody {
    name: Option<String>,
    description: Option<String>,
}

/// `?taskName=&taskDescription=`, accepted alongside the body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateTaskQuery {
    task_name: Option<String>,
    task_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DescribeBody {
    task_name: Option<String>,
    task_description: Option<String>,
    project_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DescribeByIdBody {
    task_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProposeBody {
    project_id: Option<i64>,
}

pub(super) async fn create_task(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<CreateTaskBody>,
) -> ApiResult<impl IntoResponse> {
    let name = required_text(body.name, "name")?;
    let project_id = required_id(body.project_id, "projectId")?;
    let description = optional_text(body.description);

    let (task, entry) =
        state
            .db
            .create_task(project_id, name.trim(), description.as_deref(), caller.id)?;

    tracing::info!(task_id = task.id, project_id, "Created task");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Task created successfully",
            "task": task,
            "taskState": entry,
        })),
    ))
}

/// Non-archived tasks of a project with state, history and comments.
pub(super) async fn list_tasks(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_project(project_id)?.is_none() {
        return Err(ApiError::project_not_found(project_id));
    }
    let tasks = state.db.list_active_task_views(project_id)?;
    Ok(Json(json!({ "tasks": tasks })))
}

pub(super) async fn update_task(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UpdateTaskQuery>,
    OptionalJson(body): OptionalJson<UpdateTaskBody>,
) -> ApiResult<impl IntoResponse> {
    // Blank values leave the field unchanged; the body wins over the query.
    let name = optional_text(body.name).or_else(|| optional_text(query.task_name));
    let description =
        optional_text(body.description).or_else(|| optional_text(query.task_description));
    let task = state
        .db
        .update_task(task_id, name.as_deref().map(str::trim), description.as_deref())?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    Ok(Json(json!({ "message": "Task updated successfully", "task": task })))
}

pub(super) async fn archive_task(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let task = state
        .db
        .archive_task(task_id)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    Ok(Json(json!({ "message": "Task archived successfully", "task": task })))
}

pub(super) async fn delete_task(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    if !state.db.delete_task(task_id)? {
        return Err(ApiError::task_not_found(task_id));
    }
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

pub(super) async fn generate_description(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<DescribeBody>,
) -> ApiResult<impl IntoResponse> {
    let request = DescribeRequest {
        task_name: required_text(body.task_name, "taskName")?,
        task_description: optional_text(body.task_description),
        project_id: required_id(body.project_id, "projectId")?,
    };
    let description = state
        .assistant
        .describe_task(&request, provider_hint(&headers))
        .await?;
    Ok(Json(json!({
        "message": "Description generated successfully",
        "description": description,
    })))
}

pub(super) async fn generate_description_by_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<DescribeByIdBody>,
) -> ApiResult<impl IntoResponse> {
    let task_id = required_id(body.task_id, "taskId")?;
    let description = state
        .assistant
        .describe_task_by_id(task_id, provider_hint(&headers))
        .await?;
    Ok(Json(json!({
        "message": "Description generated successfully",
        "description": description,
    })))
}

pub(super) async fn propose_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ProposeBody>,
) -> ApiResult<impl IntoResponse> {
    let project_id = required_id(body.project_id, "projectId")?;
    let task = state
        .assistant
        .propose_task(project_id, provider_hint(&headers))
        .await?;
    Ok(Json(json!({ "message": "Task proposed successfully", "task": task })))
}
