//! User registration and lookup.

use super::{Database, now_ms, optional};
use crate::types::User;
use anyhow::Result;
use rusqlite::{Row, params};

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// Insert a user. The email is stored lower-cased.
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, email, password_hash, now],
            )?;
            Ok(User {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                email,
                created_at: now,
            })
        })
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| {
            optional(conn.query_row(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                params![user_id],
                parse_user_row,
            ))
        })
    }

    /// Case-insensitive lookup returning the user and stored password hash.
    pub fn find_user_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        let email = email.trim().to_lowercase();
        self.with_conn(|conn| {
            optional(conn.query_row(
                "SELECT id, name, email, created_at, password_hash
                 FROM users WHERE email = ?1 COLLATE NOCASE",
                params![email],
                |row| Ok((parse_user_row(row)?, row.get("password_hash")?)),
            ))
        })
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        let email = email.trim().to_lowercase();
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1 COLLATE NOCASE",
                params![email],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }
}
