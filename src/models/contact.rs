use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::StoreResult;

#[derive(Debug, Serialize, Clone)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Default)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ContactMessage {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            subject: row.get("subject")?,
            message: row.get("message")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn create(pool: &DbPool, form: &ContactForm) -> StoreResult<i64> {
        let conn = pool.get()?;
        let subject = form
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        conn.execute(
            "INSERT INTO contacts (name, email, subject, message) VALUES (?1, ?2, ?3, ?4)",
            params![form.name.trim(), form.email.trim(), subject, form.message],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list(pool: &DbPool) -> StoreResult<Vec<Self>> {
        let conn = pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM contacts ORDER BY created_at DESC, id DESC")?;
        let rows = stmt.query_map([], Self::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
