//! Day plan composition.
//!
//! The generator picks task ids from a list it is shown. Its answer is
//! parsed strictly and then filtered against the ids it was allowed to pick:
//! archived, done, and unknown ids never reach the response. The "at most
//! three tasks" rule lives only in the prompt and is not enforced here.

use super::Assistant;
use crate::error::{ApiError, ApiResult};
use crate::generation::GenerationError;
use crate::history::{self, DONE_SLUG};
use crate::prompts::PLANNER_ROLE;
use crate::types::{DayPlan, PlannedTask, State, TaskRecord};
use serde::Deserialize;

/// The JSON object the planner prompt asks for.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanReply {
    pub day_title: String,
    pub day_summary: String,
    pub tasks_ids: Vec<i64>,
}

/// An active task as shown to the planner.
#[derive(Debug, Clone)]
pub struct PlanCandidate {
    pub id: i64,
    pub name: String,
    pub state: State,
}

impl PlanCandidate {
    pub fn is_selectable(&self) -> bool {
        self.state.slug != DONE_SLUG
    }

    fn planned(&self) -> PlannedTask {
        PlannedTask {
            id: self.id,
            name: self.name.clone(),
            current_state: self.state.name.clone(),
        }
    }
}

/// Non-archived tasks with their derived current state, in task order.
pub fn candidates(tasks: &[TaskRecord], todo: &State) -> Vec<PlanCandidate> {
    tasks
        .iter()
        .filter(|record| !record.task.is_archived)
        .map(|record| PlanCandidate {
            id: record.task.id,
            name: record.task.name.clone(),
            state: history::current_state(&record.history, todo),
        })
        .collect()
}

/// Parse the generator's answer as a plan object.
pub fn parse_plan_reply(text: &str) -> Result<PlanReply, GenerationError> {
    let reply: PlanReply = serde_json::from_str(text.trim())
        .map_err(|e| GenerationError::Unparsable(format!("day plan: {}", e)))?;
    if reply.day_title.trim().is_empty() {
        return Err(GenerationError::InvalidPayload(
            "day plan has an empty dayTitle".to_string(),
        ));
    }
    Ok(reply)
}

/// Build the plan from the candidates the reply names and may select.
pub fn assemble_plan(reply: PlanReply, candidates: &[PlanCandidate]) -> DayPlan {
    let dropped: Vec<i64> = reply
        .tasks_ids
        .iter()
        .copied()
        .filter(|id| {
            !candidates
                .iter()
                .any(|candidate| candidate.id == *id && candidate.is_selectable())
        })
        .collect();
    if !dropped.is_empty() {
        tracing::debug!(?dropped, "Dropped plan ids outside the selectable set");
    }

    let tasks = candidates
        .iter()
        .filter(|candidate| candidate.is_selectable() && reply.tasks_ids.contains(&candidate.id))
        .map(PlanCandidate::planned)
        .collect();

    DayPlan {
        day_title: reply.day_title,
        day_summary: reply.day_summary,
        tasks,
    }
}

impl Assistant {
    /// Ask the generator for a day plan over a project's active tasks.
    pub async fn compose_plan(&self, project_id: i64, hint: Option<&str>) -> ApiResult<DayPlan> {
        let snapshot = self
            .db
            .project_snapshot(project_id)?
            .ok_or_else(|| ApiError::project_not_found(project_id))?;

        let candidates = candidates(&snapshot.tasks, &snapshot.todo);
        if candidates.is_empty() {
            return Err(ApiError::invalid_value("projectId", "Project has no tasks."));
        }

        let shown: Vec<PlannedTask> = candidates.iter().map(PlanCandidate::planned).collect();
        let selectable: Vec<i64> = candidates
            .iter()
            .filter(|candidate| candidate.is_selectable())
            .map(|candidate| candidate.id)
            .collect();
        let prompt = self
            .prompts
            .day_plan(&snapshot.project, &shown, &selectable);

        let text = self.generators.generate(hint, PLANNER_ROLE, &prompt).await?;
        let reply = parse_plan_reply(&text)?;
        let plan = assemble_plan(reply, &candidates);

        tracing::info!(
            project_id,
            candidates = candidates.len(),
            selected = plan.tasks.len(),
            "Composed day plan"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{DOING_SLUG, TODO_SLUG};
    use crate::types::{Task, TaskStateEntry};

    fn state(id: i64, slug: &str, name: &str) -> State {
        State {
            id,
            name: name.to_string(),
            color: "#000000".to_string(),
            slug: slug.to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn record(id: i64, archived: bool, slug: &str) -> TaskRecord {
        let name = match slug {
            TODO_SLUG => "To Do",
            DOING_SLUG => "Doing",
            _ => "Done",
        };
        TaskRecord {
            task: Task {
                id,
                name: format!("task {id}"),
                description: None,
                is_archived: archived,
                project_id: 1,
                created_by: 1,
                created_at: id,
                updated_at: id,
            },
            history: vec![TaskStateEntry {
                id: id * 100,
                task_id: id,
                state: state(id, slug, name),
                assigned_by: 1,
                created_at: id,
            }],
        }
    }

    fn reply(ids: &[i64]) -> PlanReply {
        PlanReply {
            day_title: "Focus".to_string(),
            day_summary: "A calm day".to_string(),
            tasks_ids: ids.to_vec(),
        }
    }

    #[test]
    fn done_and_unknown_ids_are_dropped() {
        let tasks = vec![
            record(1, false, TODO_SLUG),
            record(2, false, TODO_SLUG),
            record(3, false, DOING_SLUG),
            record(4, false, DONE_SLUG),
        ];
        let todo = State::conventional_todo();
        let plan = assemble_plan(reply(&[1, 4, 9]), &candidates(&tasks, &todo));

        let ids: Vec<i64> = plan.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(plan.tasks[0].current_state, "To Do");
        assert_eq!(plan.day_title, "Focus");
    }

    #[test]
    fn archived_tasks_are_not_candidates() {
        let tasks = vec![record(1, true, DOING_SLUG), record(2, false, DOING_SLUG)];
        let todo = State::conventional_todo();
        let candidates = candidates(&tasks, &todo);
        assert_eq!(candidates.len(), 1);

        let plan = assemble_plan(reply(&[1, 2]), &candidates);
        let ids: Vec<i64> = plan.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn more_than_three_valid_ids_are_kept() {
        let tasks: Vec<_> = (1..=5).map(|id| record(id, false, TODO_SLUG)).collect();
        let todo = State::conventional_todo();
        let plan = assemble_plan(reply(&[5, 4, 3, 2]), &candidates(&tasks, &todo));
        assert_eq!(plan.tasks.len(), 4);
        // Output follows task order, not reply order.
        assert_eq!(plan.tasks[0].id, 2);
    }

    #[test]
    fn task_without_history_is_todo() {
        let mut bare = record(7, false, DOING_SLUG);
        bare.history.clear();
        let todo = State::conventional_todo();
        let candidates = candidates(&[bare], &todo);
        assert_eq!(candidates[0].state.slug, TODO_SLUG);
        assert!(candidates[0].is_selectable());
    }

    #[test]
    fn parse_requires_json_object() {
        let parsed = parse_plan_reply(
            r#" {"dayTitle":"Go","daySummary":"Two things","tasksIds":[1,2]} "#,
        )
        .unwrap();
        assert_eq!(parsed.tasks_ids, vec![1, 2]);

        assert!(matches!(
            parse_plan_reply("Sure! Here is your plan"),
            Err(GenerationError::Unparsable(_))
        ));
        assert!(matches!(
            parse_plan_reply(r#"{"dayTitle":"Go","daySummary":"x"}"#),
            Err(GenerationError::Unparsable(_))
        ));
        assert!(matches!(
            parse_plan_reply(r#"{"dayTitle":"Go","daySummary":"x","tasksIds":["a"]}"#),
            Err(GenerationError::Unparsable(_))
        ));
        assert!(matches!(
            parse_plan_reply(r#"{"dayTitle":" ","daySummary":"x","tasksIds":[]}"#),
            Err(GenerationError::InvalidPayload(_))
        ));
    }
}
