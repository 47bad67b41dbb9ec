//! Project CRUD and per-project summaries.

use super::states::todo_state_internal;
use super::tasks::project_task_records_internal;
use super::{Database, now_ms, optional};
use crate::history;
use crate::types::{Project, ProjectSummary, State, TaskRecord};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

/// A project and its active tasks, read together for plan composition.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub project: Project,
    pub tasks: Vec<TaskRecord>,
    pub todo: State,
}

fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        owner_id: row.get("owner_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn get_project_internal(conn: &Connection, project_id: i64) -> Result<Option<Project>> {
    optional(conn.query_row(
        "SELECT * FROM projects WHERE id = ?1",
        params![project_id],
        parse_project_row,
    ))
}

impl Database {
    pub fn create_project(&self, owner_id: i64, name: &str, description: &str) -> Result<Project> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (name, description, owner_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![name, description, owner_id, now],
            )?;
            Ok(Project {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                description: description.to_string(),
                owner_id,
                created_at: now,
                updated_at: now,
            })
        })
    }

    pub fn get_project(&self, project_id: i64) -> Result<Option<Project>> {
        self.with_conn(|conn| get_project_internal(conn, project_id))
    }

    /// Projects owned by a user, each with metrics over its active tasks.
    pub fn list_project_summaries(&self, owner_id: i64) -> Result<Vec<ProjectSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM projects WHERE owner_id = ?1 ORDER BY created_at ASC, id ASC",
            )?;
            let projects = stmt
                .query_map(params![owner_id], parse_project_row)?
                .collect::<Result<Vec<_>, _>>()?;

            let mut summaries = Vec::with_capacity(projects.len());
            for project in projects {
                let records = project_task_records_internal(conn, project.id, false)?;
                summaries.push(ProjectSummary {
                    id: project.id,
                    name: project.name,
                    description: project.description,
                    created_at: project.created_at,
                    updated_at: project.updated_at,
                    tasks_metrics: history::active_metrics(&records),
                });
            }
            Ok(summaries)
        })
    }

    /// Project, active tasks, and the `to-do` fallback under one lock.
    pub fn project_snapshot(&self, project_id: i64) -> Result<Option<ProjectSnapshot>> {
        self.with_conn(|conn| {
            let Some(project) = get_project_internal(conn, project_id)? else {
                return Ok(None);
            };
            let tasks = project_task_records_internal(conn, project_id, false)?;
            let todo = todo_state_internal(conn)?;
            Ok(Some(ProjectSnapshot {
                project,
                tasks,
                todo,
            }))
        })
    }

    /// Delete a project. Tasks, their comments and state logs cascade.
    pub fn delete_project(&self, project_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
            if deleted > 0 {
                tracing::debug!(project_id, "Deleted project");
            }
            Ok(deleted > 0)
        })
    }
}
