//! State catalogue: creation, display updates, and guarded deletion.

use super::{Database, now_ms, optional};
use crate::error::ApiError;
use crate::history::TODO_SLUG;
use crate::types::State;
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_state_row(row: &Row) -> rusqlite::Result<State> {
    Ok(State {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        slug: row.get("slug")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn get_state_internal(conn: &Connection, state_id: i64) -> Result<Option<State>> {
    optional(conn.query_row(
        "SELECT * FROM states WHERE id = ?1",
        params![state_id],
        parse_state_row,
    ))
}

pub(crate) fn get_state_by_slug_internal(conn: &Connection, slug: &str) -> Result<Option<State>> {
    optional(conn.query_row(
        "SELECT * FROM states WHERE slug = ?1",
        params![slug],
        parse_state_row,
    ))
}

/// The seeded `to-do` state, or its conventional stand-in.
pub(crate) fn todo_state_internal(conn: &Connection) -> Result<State> {
    Ok(get_state_by_slug_internal(conn, TODO_SLUG)?.unwrap_or_else(State::conventional_todo))
}

impl Database {
    pub fn create_state(&self, name: &str, color: &str, slug: &str) -> Result<State> {
        let now = now_ms();
        self.with_conn(|conn| {
            if get_state_by_slug_internal(conn, slug)?.is_some() {
                return Err(ApiError::already_exists(&format!("State with slug '{}'", slug))
                    .with_field("slug")
                    .into());
            }
            conn.execute(
                "INSERT INTO states (name, color, slug, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![name, color, slug, now],
            )?;
            Ok(State {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                color: color.to_string(),
                slug: slug.to_string(),
                created_at: now,
                updated_at: now,
            })
        })
    }

    pub fn list_states(&self) -> Result<Vec<State>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM states ORDER BY id ASC")?;
            let states = stmt
                .query_map([], parse_state_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(states)
        })
    }

    pub fn get_state(&self, state_id: i64) -> Result<Option<State>> {
        self.with_conn(|conn| get_state_internal(conn, state_id))
    }

    pub fn get_state_by_slug(&self, slug: &str) -> Result<Option<State>> {
        self.with_conn(|conn| get_state_by_slug_internal(conn, slug))
    }

    pub fn todo_state(&self) -> Result<State> {
        self.with_conn(todo_state_internal)
    }

    /// Update display fields. The slug is never touched.
    pub fn update_state(
        &self,
        state_id: i64,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Option<State>> {
        let now = now_ms();
        self.with_conn(|conn| {
            let Some(mut state) = get_state_internal(conn, state_id)? else {
                return Ok(None);
            };
            if let Some(name) = name {
                state.name = name.to_string();
            }
            if let Some(color) = color {
                state.color = color.to_string();
            }
            state.updated_at = now;
            conn.execute(
                "UPDATE states SET name = ?1, color = ?2, updated_at = ?3 WHERE id = ?4",
                params![state.name, state.color, now, state_id],
            )?;
            Ok(Some(state))
        })
    }

    /// Number of assignments pointing at a state.
    pub fn count_state_references(&self, state_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM task_states WHERE state_id = ?1",
                params![state_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Delete a state that no assignment references.
    ///
    /// Returns `Ok(false)` when the state does not exist, a `StateInUse`
    /// error while any assignment still points at it, and a `ProtectedState`
    /// error for the initial `to-do` state.
    pub fn delete_state(&self, state_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(state) = get_state_internal(&tx, state_id)? else {
                return Ok(false);
            };
            if state.slug == TODO_SLUG {
                return Err(ApiError::protected_state(&state.slug).into());
            }
            let references: i64 = tx.query_row(
                "SELECT COUNT(*) FROM task_states WHERE state_id = ?1",
                params![state_id],
                |row| row.get(0),
            )?;
            if references > 0 {
                return Err(ApiError::state_in_use(&state.slug, references).into());
            }
            tx.execute("DELETE FROM states WHERE id = ?1", params![state_id])?;
            tx.commit()?;
            Ok(true)
        })
    }
}
