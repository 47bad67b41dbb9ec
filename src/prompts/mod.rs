//! Prompt templates for the assisted endpoints.
//!
//! Templates are markdown files with `{{placeholder}}` slots:
//! - `day-plan.md` - choose today's tasks, reply as JSON
//! - `comment-reply.md` - answer a user comment
//! - `task-description.md` - rewrite a task description
//! - `task-proposal.md` - propose a new task, reply as JSON
//!
//! Files are loaded from layered directories (user overrides project overrides defaults):
//! 1. ~/.taskboard/prompts/
//! 2. taskboard/prompts/
//! 3. defaults/prompts/, embedded at compile time

use crate::config::ConfigPaths;
use crate::types::{Comment, PlannedTask, Project};
use std::collections::HashMap;
use std::path::PathBuf;

/// Default prompts embedded at compile time.
pub mod defaults {
    pub const DAY_PLAN: &str = include_str!("../../defaults/prompts/day-plan.md");
    pub const COMMENT_REPLY: &str = include_str!("../../defaults/prompts/comment-reply.md");
    pub const TASK_DESCRIPTION: &str = include_str!("../../defaults/prompts/task-description.md");
    pub const TASK_PROPOSAL: &str = include_str!("../../defaults/prompts/task-proposal.md");
}

/// Role instruction for day plans.
pub const PLANNER_ROLE: &str =
    "You are an helpful assistant to support the choice of tasks for today.";

/// Role instruction for comment replies.
pub const REPLY_ROLE: &str = "You are a helpful chat assistant specialized in task management \
     that make short comments with hints and suggestions.";

/// Role instruction for descriptions and proposals.
pub const TASK_ASSISTANT_ROLE: &str =
    "You are a helpful assistant specialized in task management.";

/// The templates this crate renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    DayPlan,
    CommentReply,
    TaskDescription,
    TaskProposal,
}

impl PromptKind {
    pub const ALL: [PromptKind; 4] = [
        PromptKind::DayPlan,
        PromptKind::CommentReply,
        PromptKind::TaskDescription,
        PromptKind::TaskProposal,
    ];

    /// File stem of the template.
    pub fn name(&self) -> &'static str {
        match self {
            PromptKind::DayPlan => "day-plan",
            PromptKind::CommentReply => "comment-reply",
            PromptKind::TaskDescription => "task-description",
            PromptKind::TaskProposal => "task-proposal",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            PromptKind::DayPlan => defaults::DAY_PLAN,
            PromptKind::CommentReply => defaults::COMMENT_REPLY,
            PromptKind::TaskDescription => defaults::TASK_DESCRIPTION,
            PromptKind::TaskProposal => defaults::TASK_PROPOSAL,
        }
    }
}

/// Configuration for prompt directories.
#[derive(Debug, Clone, Default)]
pub struct PromptsConfig {
    /// User-level prompts directory (~/.taskboard/prompts/)
    pub user_dir: Option<PathBuf>,
    /// Project-level prompts directory (taskboard/prompts/)
    pub project_dir: Option<PathBuf>,
}

impl PromptsConfig {
    /// `prompts/` under each configuration tier directory.
    pub fn from_paths(paths: &ConfigPaths) -> Self {
        Self {
            user_dir: paths.user_dir.as_ref().map(|dir| dir.join("prompts")),
            project_dir: paths.project_dir.as_ref().map(|dir| dir.join("prompts")),
        }
    }
}

/// Load a prompt template, checking user, project, then embedded defaults.
pub fn load_prompt(kind: PromptKind, config: &PromptsConfig) -> String {
    let filename = format!("{}.md", kind.name());

    for dir in [&config.user_dir, &config.project_dir].into_iter().flatten() {
        let path = dir.join(&filename);
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    tracing::debug!(path = %path.display(), "Loaded prompt override");
                    return content;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Unreadable prompt override")
                }
            }
        }
    }

    kind.embedded().to_string()
}

/// Substitute `{{key}}` slots in one pass. Unknown keys are left as-is, and
/// substituted values are never rescanned.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// The loaded template set.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<PromptKind, String>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::embedded()
    }
}

impl PromptLibrary {
    /// Only the compiled-in templates.
    pub fn embedded() -> Self {
        Self {
            templates: PromptKind::ALL
                .iter()
                .map(|kind| (*kind, kind.embedded().to_string()))
                .collect(),
        }
    }

    pub fn load(config: &PromptsConfig) -> Self {
        Self {
            templates: PromptKind::ALL
                .iter()
                .map(|kind| (*kind, load_prompt(*kind, config)))
                .collect(),
        }
    }

    fn template(&self, kind: PromptKind) -> &str {
        self.templates
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.embedded())
    }

    /// Day plan prompt. `tasks` are all active tasks; `selectable` the ids
    /// the generator may pick from.
    pub fn day_plan(&self, project: &Project, tasks: &[PlannedTask], selectable: &[i64]) -> String {
        let task_lines = tasks
            .iter()
            .map(|t| format!("    - [id={}] \"{}\" (state={})", t.id, t.name, t.current_state))
            .collect::<Vec<_>>()
            .join("\n");
        let selectable_ids = selectable
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        render(
            self.template(PromptKind::DayPlan),
            &[
                ("project_name", project.name.as_str()),
                ("project_description", project.description.as_str()),
                ("task_lines", task_lines.as_str()),
                ("selectable_ids", selectable_ids.as_str()),
            ],
        )
    }

    /// Reply prompt; `recent` is rendered in the order given.
    pub fn comment_reply(
        &self,
        comment: &Comment,
        task_name: &str,
        task_description: Option<&str>,
        recent: &[Comment],
    ) -> String {
        let recent_comments = recent
            .iter()
            .map(|c| format!("- <start of comment>\"{}\"<end of comment>", c.text))
            .collect::<Vec<_>>()
            .join("\n");

        render(
            self.template(PromptKind::CommentReply),
            &[
                ("comment_text", comment.text.as_str()),
                ("task_name", task_name),
                ("task_description", task_description.unwrap_or("")),
                ("recent_comments", recent_comments.as_str()),
            ],
        )
    }

    pub fn task_description(
        &self,
        task_name: &str,
        task_description: Option<&str>,
        project: &Project,
    ) -> String {
        render(
            self.template(PromptKind::TaskDescription),
            &[
                ("task_name", task_name),
                ("task_description", task_description.unwrap_or("")),
                ("project_name", project.name.as_str()),
                ("project_description", project.description.as_str()),
            ],
        )
    }

    pub fn task_proposal(&self, project: &Project, task_names: &[&str]) -> String {
        let task_names = task_names
            .iter()
            .map(|name| format!("- {}", name))
            .collect::<Vec<_>>()
            .join("\n");

        render(
            self.template(PromptKind::TaskProposal),
            &[
                ("project_name", project.name.as_str()),
                ("project_description", project.description.as_str()),
                ("task_names", task_names.as_str()),
            ],
        )
    }
}
