use rusqlite::params;

use crate::db::DbPool;
use crate::error::StoreResult;

pub struct Like;

impl Like {
    /// Insert-if-absent. Returns whether a new row was written.
    pub fn add(pool: &DbPool, post_id: i64, user_id: i64) -> StoreResult<bool> {
        let conn = pool.get()?;
        let n = conn.execute(
            "INSERT OR IGNORE INTO likes (post_id, user_id) VALUES (?1, ?2)",
            params![post_id, user_id],
        )?;
        Ok(n > 0)
    }

    /// Delete-if-present. Returns whether a row was removed.
    pub fn remove(pool: &DbPool, post_id: i64, user_id: i64) -> StoreResult<bool> {
        let conn = pool.get()?;
        let n = conn.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        Ok(n > 0)
    }

    pub fn exists(pool: &DbPool, post_id: i64, user_id: i64) -> StoreResult<bool> {
        let conn = pool.get()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn count_for_post(pool: &DbPool, post_id: i64) -> StoreResult<i64> {
        let conn = pool.get()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?)
    }
}
