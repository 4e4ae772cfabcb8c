use chrono::{NaiveDateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Row};
use serde::Serialize;

use super::analytics::{daily_counts, fill_daily, DailyCount};
use crate::db::DbPool;
use crate::error::StoreResult;

#[derive(Debug, Serialize, Clone)]
pub struct ActivityEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A new audit record. Borrowed so call sites can build it inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewActivity<'a> {
    pub user_id: Option<i64>,
    pub action: &'a str,
    pub entity_type: Option<&'a str>,
    pub entity_id: Option<i64>,
    pub details: Option<&'a str>,
    pub ip_address: Option<&'a str>,
}

#[derive(Debug, Default, Clone)]
pub struct ActivityQuery {
    pub search: Option<String>,
    pub action_filter: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ActivityStats {
    pub by_action: Vec<ActionCount>,
    pub daily: Vec<DailyCount>,
}

const SELECT_JOINED: &str = "SELECT a.id, a.user_id, u.username AS username, a.action, a.entity_type,
            a.entity_id, a.details, a.ip_address, a.created_at
     FROM activity_logs a
     LEFT JOIN users u ON a.user_id = u.id";

impl ActivityEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ActivityEntry {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            username: row.get("username")?,
            action: row.get("action")?,
            entity_type: row.get("entity_type")?,
            entity_id: row.get("entity_id")?,
            details: row.get("details")?,
            ip_address: row.get("ip_address")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn insert(pool: &DbPool, entry: &NewActivity<'_>) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO activity_logs (user_id, action, entity_type, entity_id, details, ip_address)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.user_id,
                entry.action,
                entry.entity_type,
                entry.entity_id,
                entry.details,
                entry.ip_address
            ],
        )?;
        Ok(())
    }

    /// WHERE clause and bound values shared by `list` and `count`.
    fn filter_clause(q: &ActivityQuery) -> (String, Vec<Box<dyn ToSql>>) {
        let mut sql = " WHERE 1=1".to_string();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
        let mut idx = 1;

        if let Some(s) = q.search.as_deref().filter(|s| !s.is_empty()) {
            sql.push_str(&format!(
                " AND (a.action LIKE ?{i} ESCAPE '\\' OR a.entity_type LIKE ?{i} ESCAPE '\\'
                   OR a.details LIKE ?{i} ESCAPE '\\' OR u.username LIKE ?{i} ESCAPE '\\')",
                i = idx
            ));
            params_vec.push(Box::new(format!("%{}%", escape_like(s))));
            idx += 1;
        }
        if let Some(a) = q.action_filter.as_deref().filter(|a| !a.is_empty()) {
            sql.push_str(&format!(" AND a.action = ?{}", idx));
            params_vec.push(Box::new(a.to_string()));
        }
        (sql, params_vec)
    }

    /// Newest first, paginated.
    pub fn list(pool: &DbPool, q: &ActivityQuery) -> StoreResult<Vec<Self>> {
        let conn = pool.get()?;
        let (where_sql, mut params_vec) = Self::filter_clause(q);
        let n = params_vec.len();
        let sql = format!(
            "{}{} ORDER BY a.created_at DESC, a.id DESC LIMIT ?{} OFFSET ?{}",
            SELECT_JOINED,
            where_sql,
            n + 1,
            n + 2
        );
        params_vec.push(Box::new(q.limit));
        params_vec.push(Box::new(q.offset));

        let param_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count(pool: &DbPool, q: &ActivityQuery) -> StoreResult<i64> {
        let conn = pool.get()?;
        let (where_sql, params_vec) = Self::filter_clause(q);
        let sql = format!(
            "SELECT COUNT(*) FROM activity_logs a LEFT JOIN users u ON a.user_id = u.id{}",
            where_sql
        );
        let param_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        Ok(conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?)
    }

    /// Every entry, newest first.
    pub fn all(pool: &DbPool) -> StoreResult<Vec<Self>> {
        let conn = pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY a.created_at DESC, a.id DESC",
            SELECT_JOINED
        ))?;
        let rows = stmt.query_map([], Self::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Histogram by action plus a `days`-long daily series.
    pub fn stats(pool: &DbPool, days: i64) -> StoreResult<ActivityStats> {
        let conn = pool.get()?;
        let by_action = {
            let mut stmt = conn.prepare(
                "SELECT action, COUNT(*) AS n FROM activity_logs
                 GROUP BY action ORDER BY n DESC, action ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ActionCount {
                    action: row.get(0)?,
                    count: row.get(1)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        let raw = daily_counts(&conn, "activity_logs", "created_at", days)?;
        Ok(ActivityStats {
            by_action,
            daily: fill_daily(&raw, days, Utc::now().date_naive()),
        })
    }
}

/// Make `%`, `_` and `\` match literally inside a LIKE pattern.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("delete"), "delete");
    }
}
