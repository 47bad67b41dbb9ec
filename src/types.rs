//! Core types for the taskboard backend.
//!
//! Wire format is camelCase to match the HTTP surface; timestamps are
//! milliseconds since the Unix epoch.

use serde::{Deserialize, Serialize};

/// Registered user. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: i64,
}

/// A project owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub owner_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A named lifecycle stage. The slug is the stable identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl State {
    /// The `to-do` state used for tasks without any recorded assignment
    /// when the seeded row is missing from the store.
    pub fn conventional_todo() -> Self {
        Self {
            id: 0,
            name: "To Do".to_string(),
            color: "#10a5e5".to_string(),
            slug: crate::history::TODO_SLUG.to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// A task inside a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_archived: bool,
    pub project_id: i64,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One entry of a task's append-only state log, joined with its state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateEntry {
    pub id: i64,
    pub task_id: i64,
    pub state: State,
    pub assigned_by: i64,
    pub created_at: i64,
}

/// Who wrote a comment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommentOrigin {
    Human {
        #[serde(rename = "userId")]
        user_id: i64,
    },
    Machine,
}

impl CommentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentOrigin::Human { .. } => "human",
            CommentOrigin::Machine => "machine",
        }
    }

    pub fn author_id(&self) -> Option<i64> {
        match self {
            CommentOrigin::Human { user_id } => Some(*user_id),
            CommentOrigin::Machine => None,
        }
    }

    /// Rebuild an origin from its stored columns.
    pub fn from_columns(origin: &str, author_id: Option<i64>) -> Option<Self> {
        match (origin, author_id) {
            ("human", Some(user_id)) => Some(CommentOrigin::Human { user_id }),
            ("machine", None) => Some(CommentOrigin::Machine),
            _ => None,
        }
    }

    pub fn is_machine(&self) -> bool {
        matches!(self, CommentOrigin::Machine)
    }
}

/// A comment on a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub text: String,
    pub origin: CommentOrigin,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task together with its state log, as loaded for derived views.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task: Task,
    pub history: Vec<TaskStateEntry>,
}

/// A task with its derived current state, history, and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub current_state: State,
    pub state_history: Vec<TaskStateEntry>,
    pub comments: Vec<Comment>,
}

/// Per-state task counts for the three seeded states.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetrics {
    pub todo_count: usize,
    pub doing_count: usize,
    pub done_count: usize,
}

impl TaskMetrics {
    pub fn total(&self) -> usize {
        self.todo_count + self.doing_count + self.done_count
    }
}

/// A project with its active task metrics, for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub tasks_metrics: TaskMetrics,
}

/// A task selected for the day plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTask {
    pub id: i64,
    pub name: String,
    pub current_state: String,
}

/// A generated day plan over a project's active tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day_title: String,
    pub day_summary: String,
    pub tasks: Vec<PlannedTask>,
}

/// A task suggested by the generator. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProposedTask {
    pub name: String,
    pub description: String,
    pub project_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_origin_serializes_as_tagged() {
        let human = serde_json::to_value(CommentOrigin::Human { user_id: 7 }).unwrap();
        assert_eq!(human, serde_json::json!({"kind": "human", "userId": 7}));

        let machine = serde_json::to_value(CommentOrigin::Machine).unwrap();
        assert_eq!(machine, serde_json::json!({"kind": "machine"}));
    }

    #[test]
    fn comment_origin_rejects_inconsistent_columns() {
        assert_eq!(
            CommentOrigin::from_columns("human", Some(3)),
            Some(CommentOrigin::Human { user_id: 3 })
        );
        assert_eq!(
            CommentOrigin::from_columns("machine", None),
            Some(CommentOrigin::Machine)
        );
        assert_eq!(CommentOrigin::from_columns("human", None), None);
        assert_eq!(CommentOrigin::from_columns("machine", Some(1)), None);
    }

    #[test]
    fn task_view_flattens_task_fields() {
        let view = TaskView {
            task: Task {
                id: 1,
                name: "Write docs".to_string(),
                description: None,
                is_archived: false,
                project_id: 2,
                created_by: 3,
                created_at: 10,
                updated_at: 10,
            },
            current_state: State::conventional_todo(),
            state_history: vec![],
            comments: vec![],
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Write docs");
        assert_eq!(json["isArchived"], false);
        assert_eq!(json["currentState"]["slug"], "to-do");
    }
}
