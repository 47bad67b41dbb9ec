//! Task CRUD and the joined task views.

use super::comments::comments_for_project_internal;
use super::projects::get_project_internal;
use super::state_transitions::{
    history_for_project_internal, history_for_task_internal, record_assignment,
};
use super::states::{get_state_by_slug_internal, todo_state_internal};
use super::{Database, now_ms, optional};
use crate::error::ApiError;
use crate::history::{self, TODO_SLUG};
use crate::types::{Task, TaskRecord, TaskStateEntry, TaskView};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let is_archived: i32 = row.get("is_archived")?;
    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        is_archived: is_archived != 0,
        project_id: row.get("project_id")?,
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    optional(conn.query_row(
        "SELECT * FROM tasks WHERE id = ?1",
        params![task_id],
        parse_task_row,
    ))
}

/// Tasks of a project in creation order, with their state logs attached.
pub(crate) fn project_task_records_internal(
    conn: &Connection,
    project_id: i64,
    include_archived: bool,
) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM tasks
         WHERE project_id = ?1 AND (?2 OR is_archived = 0)
         ORDER BY created_at ASC, id ASC",
    )?;
    let tasks = stmt
        .query_map(params![project_id, include_archived], parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut histories = history_for_project_internal(conn, project_id)?;
    Ok(tasks
        .into_iter()
        .map(|task| TaskRecord {
            history: histories.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect())
}

impl Database {
    /// Create a task and its initial `to-do` assignment in one transaction.
    pub fn create_task(
        &self,
        project_id: i64,
        name: &str,
        description: Option<&str>,
        created_by: i64,
    ) -> Result<(Task, TaskStateEntry)> {
        let now = now_ms();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if get_project_internal(&tx, project_id)?.is_none() {
                return Err(ApiError::project_not_found(project_id).into());
            }
            let todo = get_state_by_slug_internal(&tx, TODO_SLUG)?
                .ok_or_else(|| anyhow!("state '{}' is missing from the catalogue", TODO_SLUG))?;

            tx.execute(
                "INSERT INTO tasks (name, description, is_archived, project_id, created_by, created_at, updated_at)
                 VALUES (?1, ?2, 0, ?3, ?4, ?5, ?5)",
                params![name, description, project_id, created_by, now],
            )?;
            let task = Task {
                id: tx.last_insert_rowid(),
                name: name.to_string(),
                description: description.map(String::from),
                is_archived: false,
                project_id,
                created_by,
                created_at: now,
                updated_at: now,
            };
            let entry = record_assignment(&tx, task.id, &todo, created_by)?;
            tx.commit()?;

            tracing::debug!(task_id = task.id, project_id, "Created task");
            Ok((task, entry))
        })
    }

    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// A task with its state log, read under a single lock.
    pub fn get_task_record(&self, task_id: i64) -> Result<Option<TaskRecord>> {
        self.with_conn(|conn| {
            let Some(task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };
            let history = history_for_task_internal(conn, task_id)?;
            Ok(Some(TaskRecord { task, history }))
        })
    }

    /// Tasks of a project with their state logs.
    pub fn get_project_task_records(
        &self,
        project_id: i64,
        include_archived: bool,
    ) -> Result<Vec<TaskRecord>> {
        self.with_conn(|conn| project_task_records_internal(conn, project_id, include_archived))
    }

    /// Non-archived tasks of a project with derived state, history and comments.
    pub fn list_active_task_views(&self, project_id: i64) -> Result<Vec<TaskView>> {
        self.with_conn(|conn| {
            let todo = todo_state_internal(conn)?;
            let records = project_task_records_internal(conn, project_id, false)?;
            let mut comments = comments_for_project_internal(conn, project_id)?;

            Ok(records
                .into_iter()
                .map(|record| TaskView {
                    current_state: history::current_state(&record.history, &todo),
                    state_history: history::chronological(&record.history),
                    comments: comments.remove(&record.task.id).unwrap_or_default(),
                    task: record.task,
                })
                .collect())
        })
    }

    /// Partial update of name and description.
    pub fn update_task(
        &self,
        task_id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Task>> {
        let now = now_ms();
        self.with_conn(|conn| {
            let Some(mut task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };
            if let Some(name) = name {
                task.name = name.to_string();
            }
            if let Some(description) = description {
                task.description = Some(description.to_string());
            }
            task.updated_at = now;
            conn.execute(
                "UPDATE tasks SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![task.name, task.description, now, task_id],
            )?;
            Ok(Some(task))
        })
    }

    /// Set the archived flag. History and comments are kept.
    pub fn archive_task(&self, task_id: i64) -> Result<Option<Task>> {
        let now = now_ms();
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE tasks SET is_archived = 1, updated_at = ?1 WHERE id = ?2",
                params![now, task_id],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            get_task_internal(conn, task_id)
        })
    }

    /// Hard delete. Comments and state log rows cascade.
    pub fn delete_task(&self, task_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            if deleted > 0 {
                tracing::debug!(task_id, "Deleted task");
            }
            Ok(deleted > 0)
        })
    }
}
