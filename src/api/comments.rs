//! Comment endpoints and machine replies.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use super::{AppState, ApiJson, ApiPath, provider_hint, required_id, required_text};
use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::types::CommentOrigin;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateCommentBody {
    task_id: Option<i64>,
    text: Option<String>,
    #[serde(default, rename = "isFromAI")]
    is_from_ai: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateCommentBody {
    text: Option<String>,
}

pub(super) async fn create_comment(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<CreateCommentBody>,
) -> ApiResult<impl IntoResponse> {
    let task_id = required_id(body.task_id, "taskId")?;
    let text = required_text(body.text, "text")?;
    let origin = if body.is_from_ai {
        CommentOrigin::Machine
    } else {
        CommentOrigin::Human { user_id: caller.id }
    };

    let comment = state.db.create_comment(task_id, &text, origin)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment created successfully", "comment": comment })),
    ))
}

pub(super) async fn update_comment(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateCommentBody>,
) -> ApiResult<impl IntoResponse> {
    let text = required_text(body.text, "text")?;
    let comment = state
        .db
        .update_comment(comment_id, &text)?
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    Ok(Json(json!({ "message": "Comment updated successfully", "comment": comment })))
}

pub(super) async fn delete_comment(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    if !state.db.delete_comment(comment_id)? {
        return Err(ApiError::comment_not_found(comment_id));
    }
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}

/// Generate and store a machine reply to a comment.
pub(super) async fn respond(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(comment_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let comment = state
        .assistant
        .compose_reply(comment_id, provider_hint(&headers))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Response generated successfully", "comment": comment })),
    ))
}
