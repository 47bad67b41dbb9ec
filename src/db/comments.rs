//! Task comments, human or machine authored.

use super::tasks::get_task_internal;
use super::{Database, now_ms, optional};
use crate::error::ApiError;
use crate::types::{Comment, CommentOrigin, Task};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};
use std::collections::HashMap;

/// Number of recent comments given to the generator as context.
pub const REPLY_CONTEXT_COMMENTS: usize = 3;

fn parse_comment_row(row: &Row) -> rusqlite::Result<Comment> {
    let origin: String = row.get("origin")?;
    let author_id: Option<i64> = row.get("author_id")?;
    let origin = CommentOrigin::from_columns(&origin, author_id).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(
            0,
            "origin".to_string(),
            rusqlite::types::Type::Text,
        )
    })?;
    Ok(Comment {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        text: row.get("text")?,
        origin,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn get_comment_internal(conn: &Connection, comment_id: i64) -> Result<Option<Comment>> {
    optional(conn.query_row(
        "SELECT * FROM comments WHERE id = ?1",
        params![comment_id],
        parse_comment_row,
    ))
}

pub(crate) fn comments_for_task_internal(conn: &Connection, task_id: i64) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM comments WHERE task_id = ?1 ORDER BY created_at ASC, id ASC",
    )?;
    let comments = stmt
        .query_map(params![task_id], parse_comment_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

/// Comments of every task in a project, grouped by task, oldest first.
pub(crate) fn comments_for_project_internal(
    conn: &Connection,
    project_id: i64,
) -> Result<HashMap<i64, Vec<Comment>>> {
    let mut stmt = conn.prepare(
        "SELECT c.* FROM comments c
         JOIN tasks t ON t.id = c.task_id
         WHERE t.project_id = ?1
         ORDER BY c.created_at ASC, c.id ASC",
    )?;
    let mut rows = stmt.query(params![project_id])?;

    let mut grouped: HashMap<i64, Vec<Comment>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let comment = parse_comment_row(row)?;
        grouped.entry(comment.task_id).or_default().push(comment);
    }
    Ok(grouped)
}

/// The `limit` most recent comments of a task, returned oldest first.
pub(crate) fn recent_comments_internal(
    conn: &Connection,
    task_id: i64,
    limit: usize,
) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM comments WHERE task_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let mut comments = stmt
        .query_map(params![task_id, limit as i64], parse_comment_row)?
        .collect::<Result<Vec<_>, _>>()?;
    comments.reverse();
    Ok(comments)
}

/// Everything the reply composer reads, taken under one lock.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub comment: Comment,
    pub task: Task,
    pub recent: Vec<Comment>,
}

impl Database {
    /// Insert a comment on an existing task.
    pub fn create_comment(&self, task_id: i64, text: &str, origin: CommentOrigin) -> Result<Comment> {
        let now = now_ms();
        self.with_conn(|conn| {
            if get_task_internal(conn, task_id)?.is_none() {
                return Err(ApiError::task_not_found(task_id).into());
            }
            conn.execute(
                "INSERT INTO comments (text, task_id, origin, author_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![text, task_id, origin.as_str(), origin.author_id(), now],
            )?;
            let comment = Comment {
                id: conn.last_insert_rowid(),
                task_id,
                text: text.to_string(),
                origin,
                created_at: now,
                updated_at: now,
            };
            tracing::debug!(comment_id = comment.id, task_id, origin = origin.as_str(), "Created comment");
            Ok(comment)
        })
    }

    pub fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        self.with_conn(|conn| get_comment_internal(conn, comment_id))
    }

    /// Comments of a task in display order.
    pub fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>> {
        self.with_conn(|conn| comments_for_task_internal(conn, task_id))
    }

    pub fn recent_comments(&self, task_id: i64, limit: usize) -> Result<Vec<Comment>> {
        self.with_conn(|conn| recent_comments_internal(conn, task_id, limit))
    }

    pub fn count_comments(&self, task_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE task_id = ?1",
                params![task_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Load a comment, its task, and the task's recent comments.
    pub fn reply_context(&self, comment_id: i64) -> Result<ReplyContext> {
        self.with_conn(|conn| {
            let comment = get_comment_internal(conn, comment_id)?
                .ok_or_else(|| anyhow!(ApiError::comment_not_found(comment_id)))?;
            let task = get_task_internal(conn, comment.task_id)?
                .ok_or_else(|| anyhow!(ApiError::task_not_found(comment.task_id)))?;
            let recent = recent_comments_internal(conn, task.id, REPLY_CONTEXT_COMMENTS)?;
            Ok(ReplyContext {
                comment,
                task,
                recent,
            })
        })
    }

    pub fn update_comment(&self, comment_id: i64, text: &str) -> Result<Option<Comment>> {
        let now = now_ms();
        self.with_conn(|conn| {
            let Some(mut comment) = get_comment_internal(conn, comment_id)? else {
                return Ok(None);
            };
            conn.execute(
                "UPDATE comments SET text = ?1, updated_at = ?2 WHERE id = ?3",
                params![text, now, comment_id],
            )?;
            comment.text = text.to_string();
            comment.updated_at = now;
            Ok(Some(comment))
        })
    }

    pub fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", params![comment_id])?;
            Ok(deleted > 0)
        })
    }
}
