use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::DbPool;
use crate::error::StoreResult;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct Totals {
    pub posts: i64,
    pub projects: i64,
    pub users: i64,
    pub comments: i64,
    pub views: i64,
    pub likes: i64,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct Recent {
    pub posts: i64,
    pub comments: i64,
    pub users: i64,
}

#[derive(Debug, Serialize, Default)]
pub struct OverviewStats {
    pub totals: Totals,
    pub recent: Recent,
}

#[derive(Debug, Serialize)]
pub struct TopPost {
    pub id: i64,
    pub title: String,
    pub created_at: NaiveDateTime,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

#[derive(Debug, Serialize)]
pub struct Engagement {
    pub comments: Vec<DailyCount>,
    pub likes: Vec<DailyCount>,
}

pub struct PostView;

impl PostView {
    pub fn record(
        pool: &DbPool,
        post_id: i64,
        user_id: Option<i64>,
        ip_address: Option<&str>,
    ) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO post_views (post_id, user_id, ip_address) VALUES (?1, ?2, ?3)",
            params![post_id, user_id, ip_address],
        )?;
        Ok(())
    }

    pub fn overview(pool: &DbPool) -> StoreResult<OverviewStats> {
        let conn = pool.get()?;
        let count = |sql: &str| -> StoreResult<i64> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
        let week = "datetime('now', '-7 days')";

        Ok(OverviewStats {
            totals: Totals {
                posts: count("SELECT COUNT(*) FROM posts")?,
                projects: count("SELECT COUNT(*) FROM projects")?,
                users: count("SELECT COUNT(*) FROM users")?,
                comments: count("SELECT COUNT(*) FROM comments")?,
                views: count("SELECT COUNT(*) FROM post_views")?,
                likes: count("SELECT COUNT(*) FROM likes")?,
            },
            recent: Recent {
                posts: count(&format!("SELECT COUNT(*) FROM posts WHERE created_at >= {}", week))?,
                comments: count(&format!(
                    "SELECT COUNT(*) FROM comments WHERE created_at >= {}",
                    week
                ))?,
                users: count(&format!("SELECT COUNT(*) FROM users WHERE created_at >= {}", week))?,
            },
        })
    }

    /// Posts ranked by views, then likes.
    pub fn top_posts(pool: &DbPool, limit: i64) -> StoreResult<Vec<TopPost>> {
        let conn = pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.title, p.created_at,
                    (SELECT COUNT(*) FROM post_views v WHERE v.post_id = p.id) AS views,
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments
             FROM posts p
             ORDER BY views DESC, likes DESC, p.id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(TopPost {
                id: row.get(0)?,
                title: row.get(1)?,
                created_at: row.get(2)?,
                views: row.get(3)?,
                likes: row.get(4)?,
                comments: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn engagement(pool: &DbPool, days: i64) -> StoreResult<Engagement> {
        let conn = pool.get()?;
        let today = Utc::now().date_naive();
        Ok(Engagement {
            comments: fill_daily(&daily_counts(&conn, "comments", "created_at", days)?, days, today),
            likes: fill_daily(&daily_counts(&conn, "likes", "created_at", days)?, days, today),
        })
    }

    pub fn user_growth(pool: &DbPool, days: i64) -> StoreResult<Vec<DailyCount>> {
        let conn = pool.get()?;
        let today = Utc::now().date_naive();
        Ok(fill_daily(&daily_counts(&conn, "users", "created_at", days)?, days, today))
    }
}

/// Raw per-day counts for the last `days` days (today included).
/// `table` and `column` are compile-time identifiers, never user input.
pub(crate) fn daily_counts(
    conn: &Connection,
    table: &str,
    column: &str,
    days: i64,
) -> StoreResult<Vec<DailyCount>> {
    let sql = format!(
        "SELECT date({col}) AS day, COUNT(*) FROM {table}
         WHERE date({col}) >= date('now', ?1)
         GROUP BY day ORDER BY day ASC",
        col = column,
        table = table
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![format!("-{} days", days.max(1) - 1)], |row| {
        Ok(DailyCount {
            date: row.get(0)?,
            count: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// One entry per day for the `days` days ending at `today`, oldest first;
/// days absent from `rows` count zero.
pub fn fill_daily(rows: &[DailyCount], days: i64, today: NaiveDate) -> Vec<DailyCount> {
    let known: HashMap<&str, i64> = rows.iter().map(|r| (r.date.as_str(), r.count)).collect();
    let days = days.max(1);
    (0..days)
        .rev()
        .map(|back| {
            let date = (today - Duration::days(back)).format("%Y-%m-%d").to_string();
            let count = known.get(date.as_str()).copied().unwrap_or(0);
            DailyCount { date, count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_daily_pads_missing_days_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let rows = vec![
            DailyCount { date: "2024-02-28".into(), count: 4 },
            DailyCount { date: "2024-03-02".into(), count: 1 },
        ];
        let filled = fill_daily(&rows, 4, today);
        let dates: Vec<&str> = filled.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-02-28", "2024-02-29", "2024-03-01", "2024-03-02"]);
        let counts: Vec<i64> = filled.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![4, 0, 0, 1]);
    }

    #[test]
    fn fill_daily_ignores_rows_outside_window() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let rows = vec![DailyCount { date: "2023-12-01".into(), count: 9 }];
        let filled = fill_daily(&rows, 2, today);
        assert_eq!(filled.len(), 2);
        assert!(filled.iter().all(|d| d.count == 0));
    }
}
