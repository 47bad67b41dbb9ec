//! Task proposals. Proposals are returned to the caller, never stored.

use super::Assistant;
use crate::error::{ApiError, ApiResult};
use crate::generation::GenerationError;
use crate::prompts::TASK_ASSISTANT_ROLE;
use crate::types::ProposedTask;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ProposalReply {
    name: String,
    #[serde(default)]
    description: String,
}

/// Parse the generator's `{name, description}` object for a project.
pub fn parse_proposal(text: &str, project_id: i64) -> Result<ProposedTask, GenerationError> {
    let reply: ProposalReply = serde_json::from_str(text.trim())
        .map_err(|e| GenerationError::Unparsable(format!("task proposal: {}", e)))?;
    let name = reply.name.trim();
    if name.is_empty() {
        return Err(GenerationError::InvalidPayload(
            "task proposal has an empty name".to_string(),
        ));
    }
    Ok(ProposedTask {
        name: name.to_string(),
        description: reply.description.trim().to_string(),
        project_id,
    })
}

impl Assistant {
    pub async fn propose_task(&self, project_id: i64, hint: Option<&str>) -> ApiResult<ProposedTask> {
        let snapshot = self
            .db
            .project_snapshot(project_id)?
            .ok_or_else(|| ApiError::project_not_found(project_id))?;

        let names: Vec<&str> = snapshot
            .tasks
            .iter()
            .map(|record| record.task.name.as_str())
            .collect();
        let prompt = self.prompts.task_proposal(&snapshot.project, &names);

        let text = self
            .generators
            .generate(hint, TASK_ASSISTANT_ROLE, &prompt)
            .await?;
        let proposal = parse_proposal(&text, project_id)?;
        tracing::debug!(project_id, name = %proposal.name, "Proposed task");
        Ok(proposal)
    }
}
