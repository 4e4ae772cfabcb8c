use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::Serialize;

use crate::db::DbPool;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub last_active: NaiveDateTime,
}

/// Entry of the "who is online" list.
#[derive(Debug, Serialize, Clone)]
pub struct OnlineUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub last_active: NaiveDateTime,
}

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registered {
    pub id: i64,
    pub is_admin: bool,
}

const LAST_ADMIN: &str = "Cannot remove the last admin";

impl User {
    pub(crate) fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            is_admin: row.get(4)?,
            created_at: row.get(5)?,
            last_active: row.get(6)?,
        })
    }

    pub(crate) const SELECT_COLS: &'static str =
        "id, username, email, password_hash, is_admin, created_at, last_active";

    // ── Lookups ──

    pub fn get_by_id(pool: &DbPool, id: i64) -> StoreResult<Option<User>> {
        let conn = pool.get()?;
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", Self::SELECT_COLS),
                params![id],
                Self::from_row,
            )
            .optional()?)
    }

    pub fn get_by_username(pool: &DbPool, username: &str) -> StoreResult<Option<User>> {
        let conn = pool.get()?;
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", Self::SELECT_COLS),
                params![username],
                Self::from_row,
            )
            .optional()?)
    }

    pub fn list_all(pool: &DbPool) -> StoreResult<Vec<User>> {
        let conn = pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            Self::SELECT_COLS
        ))?;
        let rows = stmt.query_map([], Self::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Users seen within the last `minutes`.
    pub fn list_online(pool: &DbPool, minutes: i64) -> StoreResult<Vec<OnlineUser>> {
        let conn = pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, is_admin, last_active FROM users
             WHERE last_active > datetime('now', ?1)
             ORDER BY last_active DESC",
        )?;
        let rows = stmt.query_map(params![format!("-{} minutes", minutes.max(1))], |row| {
            Ok(OnlineUser {
                id: row.get(0)?,
                username: row.get(1)?,
                is_admin: row.get(2)?,
                last_active: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Create ──

    /// Insert a new account. The very first account becomes admin; the
    /// admin count is read and the row written under one write lock.
    pub fn register(
        pool: &DbPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<Registered> {
        let mut conn = pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let admins: i64 =
            tx.query_row("SELECT COUNT(*) FROM users WHERE is_admin = 1", [], |row| {
                row.get(0)
            })?;
        let is_admin = admins == 0;
        tx.execute(
            "INSERT INTO users (username, email, password_hash, is_admin) VALUES (?1, ?2, ?3, ?4)",
            params![username, email, password_hash, is_admin],
        )
        .map_err(|e| StoreError::from(e).unique_as_conflict("Username or email already taken"))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Registered { id, is_admin })
    }

    // ── Update ──

    pub fn touch_last_active(pool: &DbPool, id: i64) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            "UPDATE users SET last_active = CURRENT_TIMESTAMP WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    /// Grant or revoke admin rights. Revoking fails with `Conflict` when
    /// the target is the only remaining admin.
    pub fn set_admin(pool: &DbPool, id: i64, is_admin: bool) -> StoreResult<()> {
        let mut conn = pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let was_admin = Self::target_is_admin(&tx, id)?;
        if was_admin && !is_admin && Self::other_admins(&tx, id)? == 0 {
            return Err(StoreError::Conflict(LAST_ADMIN.to_string()));
        }
        tx.execute(
            "UPDATE users SET is_admin = ?1 WHERE id = ?2",
            params![is_admin, id],
        )
        .map_err(last_admin_trigger)?;
        tx.commit()?;
        Ok(())
    }

    // ── Delete ──

    /// Delete an account. Sessions, comments and likes cascade; authored
    /// posts and log entries keep a NULL owner.
    pub fn delete(pool: &DbPool, id: i64) -> StoreResult<()> {
        let mut conn = pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let was_admin = Self::target_is_admin(&tx, id)?;
        if was_admin && Self::other_admins(&tx, id)? == 0 {
            return Err(StoreError::Conflict(LAST_ADMIN.to_string()));
        }
        tx.execute("DELETE FROM users WHERE id = ?1", params![id])
            .map_err(last_admin_trigger)?;
        tx.commit()?;
        Ok(())
    }

    fn target_is_admin(conn: &rusqlite::Connection, id: i64) -> StoreResult<bool> {
        conn.query_row(
            "SELECT is_admin FROM users WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(StoreError::NotFound("User"))
    }

    fn other_admins(conn: &rusqlite::Connection, id: i64) -> StoreResult<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM users WHERE is_admin = 1 AND id != ?1",
            params![id],
            |row| row.get(0),
        )?)
    }
}

fn last_admin_trigger(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(ref f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER =>
        {
            StoreError::Conflict(LAST_ADMIN.to_string())
        }
        other => StoreError::from(other),
    }
}
