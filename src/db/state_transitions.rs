//! Append-only task state log.
//!
//! Each assignment is a new row; nothing here updates or deletes rows. The
//! current state is derived in `crate::history`.

use super::states::{get_state_internal, parse_state_row};
use super::tasks::get_task_internal;
use super::{Database, now_ms};
use crate::error::ApiError;
use crate::types::{State, TaskStateEntry};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use std::collections::HashMap;

const ENTRY_SELECT: &str = "SELECT ts.id AS entry_id, ts.task_id, ts.assigned_by,
            ts.created_at AS entry_created_at,
            s.id, s.name, s.color, s.slug, s.created_at, s.updated_at
     FROM task_states ts
     JOIN states s ON s.id = ts.state_id";

fn parse_entry_row(row: &Row) -> rusqlite::Result<TaskStateEntry> {
    Ok(TaskStateEntry {
        id: row.get("entry_id")?,
        task_id: row.get("task_id")?,
        state: parse_state_row(row)?,
        assigned_by: row.get("assigned_by")?,
        created_at: row.get("entry_created_at")?,
    })
}

/// Append an assignment using an existing connection or transaction.
pub(crate) fn record_assignment(
    conn: &Connection,
    task_id: i64,
    state: &State,
    assigned_by: i64,
) -> Result<TaskStateEntry> {
    let now = now_ms();
    conn.execute(
        "INSERT INTO task_states (task_id, state_id, assigned_by, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![task_id, state.id, assigned_by, now],
    )?;
    Ok(TaskStateEntry {
        id: conn.last_insert_rowid(),
        task_id,
        state: state.clone(),
        assigned_by,
        created_at: now,
    })
}

pub(crate) fn history_for_task_internal(
    conn: &Connection,
    task_id: i64,
) -> Result<Vec<TaskStateEntry>> {
    let sql = format!(
        "{} WHERE ts.task_id = ?1 ORDER BY ts.created_at ASC, ts.id ASC",
        ENTRY_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params![task_id], parse_entry_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// All assignments of a project's tasks, grouped by task id, oldest first.
pub(crate) fn history_for_project_internal(
    conn: &Connection,
    project_id: i64,
) -> Result<HashMap<i64, Vec<TaskStateEntry>>> {
    let sql = format!(
        "{} JOIN tasks t ON t.id = ts.task_id
         WHERE t.project_id = ?1
         ORDER BY ts.created_at ASC, ts.id ASC",
        ENTRY_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![project_id])?;

    let mut grouped: HashMap<i64, Vec<TaskStateEntry>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let entry = parse_entry_row(row)?;
        grouped.entry(entry.task_id).or_default().push(entry);
    }
    Ok(grouped)
}

impl Database {
    /// Place a task in a state on behalf of a user.
    pub fn assign_state(
        &self,
        task_id: i64,
        state_id: i64,
        assigned_by: i64,
    ) -> Result<TaskStateEntry> {
        self.with_conn(|conn| {
            if get_task_internal(conn, task_id)?.is_none() {
                return Err(ApiError::task_not_found(task_id).into());
            }
            let Some(state) = get_state_internal(conn, state_id)? else {
                return Err(ApiError::state_not_found(state_id).into());
            };
            let entry = record_assignment(conn, task_id, &state, assigned_by)?;
            tracing::debug!(task_id, slug = %state.slug, entry_id = entry.id, "Recorded state assignment");
            Ok(entry)
        })
    }

    /// The full state log of a task, oldest first.
    pub fn get_task_state_history(&self, task_id: i64) -> Result<Vec<TaskStateEntry>> {
        self.with_conn(|conn| history_for_task_internal(conn, task_id))
    }
}
