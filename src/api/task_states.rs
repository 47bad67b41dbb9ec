//! Task state assignments.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use super::{AppState, ApiJson, ApiPath, required_id};
use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::history;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AssignStateBody {
    task_id: Option<i64>,
    state_id: Option<i64>,
}

pub(super) async fn assign_state(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<AssignStateBody>,
) -> ApiResult<impl IntoResponse> {
    let task_id = required_id(body.task_id, "taskId")?;
    let state_id = required_id(body.state_id, "stateId")?;

    let entry = state.db.assign_state(task_id, state_id, caller.id)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Task state assigned successfully", "taskState": entry })),
    ))
}

/// A task's state log, oldest first, with its derived current state.
pub(super) async fn task_history(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .db
        .get_task_record(task_id)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    let todo = state.db.todo_state()?;

    Ok(Json(json!({
        "taskId": task_id,
        "currentState": history::current_state(&record.history, &todo),
        "history": history::chronological(&record.history),
    })))
}
