//! Generated task descriptions.

use super::Assistant;
use crate::error::{ApiError, ApiResult};
use crate::generation::GenerationError;
use crate::prompts::TASK_ASSISTANT_ROLE;
use serde::Deserialize;

/// Input for describing a task that may not exist yet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeRequest {
    pub task_name: String,
    #[serde(default)]
    pub task_description: Option<String>,
    pub project_id: i64,
}

impl Assistant {
    /// Markdown description with done criteria, steps, and estimated effort.
    pub async fn describe_task(
        &self,
        request: &DescribeRequest,
        hint: Option<&str>,
    ) -> ApiResult<String> {
        let project = self
            .db
            .get_project(request.project_id)?
            .ok_or_else(|| ApiError::project_not_found(request.project_id))?;

        let prompt = self.prompts.task_description(
            &request.task_name,
            request.task_description.as_deref(),
            &project,
        );
        let text = self
            .generators
            .generate(hint, TASK_ASSISTANT_ROLE, &prompt)
            .await?;
        if text.trim().is_empty() {
            return Err(GenerationError::InvalidPayload("empty description".to_string()).into());
        }
        Ok(text.trim().to_string())
    }

    /// Describe a stored task using its current name and description.
    pub async fn describe_task_by_id(&self, task_id: i64, hint: Option<&str>) -> ApiResult<String> {
        let task = self
            .db
            .get_task(task_id)?
            .ok_or_else(|| ApiError::task_not_found(task_id))?;
        let request = DescribeRequest {
            task_name: task.name,
            task_description: task.description,
            project_id: task.project_id,
        };
        self.describe_task(&request, hint).await
    }
}
