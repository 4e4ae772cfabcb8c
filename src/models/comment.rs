use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::{StoreError, StoreResult};

/// Visibility state of a comment. The schema's CHECK constraint allows
/// exactly these three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Pending,
    Approved,
    Spam,
}

impl CommentStatus {
    pub const ALL: [CommentStatus; 3] = [
        CommentStatus::Pending,
        CommentStatus::Approved,
        CommentStatus::Spam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
            CommentStatus::Spam => "spam",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommentStatus::Pending),
            "approved" => Ok(CommentStatus::Approved),
            "spam" => Ok(CommentStatus::Spam),
            other => Err(format!("Invalid comment status: {}", other)),
        }
    }
}

impl ToSql for CommentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CommentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub post_title: Option<String>,
    #[serde(rename = "comment")]
    pub body: String,
    pub status: CommentStatus,
    pub created_at: NaiveDateTime,
}

/// Filters for the comment listing. `None` means "any".
#[derive(Debug, Default, Clone)]
pub struct CommentFilter {
    pub post_id: Option<i64>,
    pub status: Option<CommentStatus>,
}

/// Per-status totals shown to admins.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: i64,
    pub approved: i64,
    pub pending: i64,
    pub spam: i64,
}

const SELECT_JOINED: &str = "SELECT c.id, c.post_id, c.user_id, c.body, c.status, c.created_at,
            u.username AS username, p.title AS post_title
     FROM comments c
     LEFT JOIN users u ON c.user_id = u.id
     LEFT JOIN posts p ON c.post_id = p.id";

impl Comment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: row.get("id")?,
            post_id: row.get("post_id")?,
            user_id: row.get("user_id")?,
            username: row.get("username")?,
            post_title: row.get("post_title")?,
            body: row.get("body")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> StoreResult<Option<Self>> {
        let conn = pool.get()?;
        let mut stmt = conn.prepare(&format!("{} WHERE c.id = ?1", SELECT_JOINED))?;
        let mut rows = stmt.query_map(params![id], Self::from_row)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list(pool: &DbPool, filter: &CommentFilter) -> StoreResult<Vec<Self>> {
        let conn = pool.get()?;

        let mut sql = format!("{} WHERE 1=1", SELECT_JOINED);
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
        let mut idx = 1;

        if let Some(post_id) = filter.post_id {
            sql.push_str(&format!(" AND c.post_id = ?{}", idx));
            params_vec.push(Box::new(post_id));
            idx += 1;
        }
        if let Some(status) = filter.status {
            sql.push_str(&format!(" AND c.status = ?{}", idx));
            params_vec.push(Box::new(status));
        }
        sql.push_str(" ORDER BY c.created_at DESC, c.id DESC");

        let param_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn counts(pool: &DbPool) -> StoreResult<StatusCounts> {
        let conn = pool.get()?;
        let counts = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'approved'), 0),
                    COALESCE(SUM(status = 'pending'), 0),
                    COALESCE(SUM(status = 'spam'), 0)
             FROM comments",
            [],
            |row| {
                Ok(StatusCounts {
                    all: row.get(0)?,
                    approved: row.get(1)?,
                    pending: row.get(2)?,
                    spam: row.get(3)?,
                })
            },
        )?;
        Ok(counts)
    }

    pub fn create(
        pool: &DbPool,
        post_id: i64,
        user_id: i64,
        body: &str,
        status: CommentStatus,
    ) -> StoreResult<i64> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO comments (post_id, user_id, body, status) VALUES (?1, ?2, ?3, ?4)",
            params![post_id, user_id, body, status],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_body(pool: &DbPool, id: i64, body: &str) -> StoreResult<()> {
        let conn = pool.get()?;
        let n = conn.execute(
            "UPDATE comments SET body = ?1 WHERE id = ?2",
            params![body, id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound("Comment"));
        }
        Ok(())
    }

    pub fn update_status(pool: &DbPool, id: i64, status: CommentStatus) -> StoreResult<()> {
        let conn = pool.get()?;
        let n = conn.execute(
            "UPDATE comments SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound("Comment"));
        }
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> StoreResult<()> {
        let conn = pool.get()?;
        let n = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(StoreError::NotFound("Comment"));
        }
        Ok(())
    }

    // ── Bulk ──

    /// Set `status` on every id in one statement. Returns rows affected.
    /// The id set is bound as a single JSON array, so its size is not
    /// limited by SQLite's bound-variable cap.
    pub fn bulk_update_status(
        pool: &DbPool,
        ids: &[i64],
        status: CommentStatus,
    ) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = pool.get()?;
        Ok(conn.execute(
            "UPDATE comments SET status = ?1 WHERE id IN (SELECT value FROM json_each(?2))",
            params![status, id_array(ids)],
        )?)
    }

    /// Delete every id in one statement. Returns rows affected.
    pub fn bulk_delete(pool: &DbPool, ids: &[i64]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = pool.get()?;
        Ok(conn.execute(
            "DELETE FROM comments WHERE id IN (SELECT value FROM json_each(?1))",
            params![id_array(ids)],
        )?)
    }
}

/// `[1,2,3]`: the JSON text `json_each` expands back into rows.
fn id_array(ids: &[i64]) -> String {
    let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
    format!("[{}]", joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_known_values() {
        for s in CommentStatus::ALL {
            assert_eq!(s.as_str().parse::<CommentStatus>().unwrap(), s);
        }
        assert!("rejected".parse::<CommentStatus>().is_err());
        assert!("".parse::<CommentStatus>().is_err());
    }

    #[test]
    fn id_array_is_json_text() {
        assert_eq!(id_array(&[4, -1, 90]), "[4,-1,90]");
        assert_eq!(id_array(&[7]), "[7]");
    }
}
