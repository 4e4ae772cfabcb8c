use rusqlite::{params, OptionalExtension};

use super::user::User;
use crate::db::DbPool;
use crate::error::StoreResult;

/// Server-side half of a bearer session. Rows are keyed by the SHA-256 of
/// the token; the token itself is only ever held by the client.
pub struct Session;

impl Session {
    pub fn create(
        pool: &DbPool,
        token_hash: &str,
        user_id: i64,
        expires_at: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at, ip_address, user_agent)
             VALUES (?1, ?2, datetime('now'), ?3, ?4, ?5)",
            params![token_hash, user_id, expires_at, ip, user_agent],
        )?;
        Ok(())
    }

    /// The user owning an unexpired session.
    pub fn user(pool: &DbPool, token_hash: &str) -> StoreResult<Option<User>> {
        let conn = pool.get()?;
        let cols = User::SELECT_COLS
            .split(", ")
            .map(|c| format!("u.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM sessions s JOIN users u ON u.id = s.user_id
                     WHERE s.token_hash = ?1 AND s.expires_at > datetime('now')",
                    cols
                ),
                params![token_hash],
                User::from_row,
            )
            .optional()?)
    }

    pub fn delete(pool: &DbPool, token_hash: &str) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
        Ok(())
    }

    pub fn cleanup_expired(pool: &DbPool) -> StoreResult<usize> {
        let conn = pool.get()?;
        Ok(conn.execute("DELETE FROM sessions WHERE expires_at <= datetime('now')", [])?)
    }
}
