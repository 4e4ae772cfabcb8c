use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::tag::{deserialize_tags, Tag, CONTENT_PROJECT};
use crate::db::DbPool;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Serialize, Clone)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub link: String,
    pub image: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProjectForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub image: String,
}

impl ProjectForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Missing required field: title".to_string());
        }
        Ok(())
    }
}

impl Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            tags: Vec::new(),
            link: row.get("link")?,
            image: row.get("image")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> StoreResult<Option<Self>> {
        let conn = pool.get()?;
        let project = conn
            .query_row("SELECT * FROM projects WHERE id = ?1", params![id], Self::from_row)
            .optional()?;
        match project {
            Some(mut p) => {
                p.tags = Tag::for_content(&conn, p.id, CONTENT_PROJECT)?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    pub fn list(pool: &DbPool) -> StoreResult<Vec<Self>> {
        let conn = pool.get()?;
        let mut projects = {
            let mut stmt =
                conn.prepare("SELECT * FROM projects ORDER BY created_at DESC, id DESC")?;
            let rows = stmt.query_map([], Self::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        for p in projects.iter_mut() {
            p.tags = Tag::for_content(&conn, p.id, CONTENT_PROJECT)?;
        }
        Ok(projects)
    }

    pub fn create(pool: &DbPool, form: &ProjectForm) -> StoreResult<i64> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO projects (title, description, link, image) VALUES (?1, ?2, ?3, ?4)",
            params![form.title.trim(), form.description, form.link, form.image],
        )?;
        let id = tx.last_insert_rowid();
        Tag::set_for_content(&tx, id, CONTENT_PROJECT, &form.tags)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update(pool: &DbPool, id: i64, form: &ProjectForm) -> StoreResult<()> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;
        let n = tx.execute(
            "UPDATE projects SET title = ?1, description = ?2, link = ?3, image = ?4 WHERE id = ?5",
            params![form.title.trim(), form.description, form.link, form.image, id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound("Project"));
        }
        Tag::set_for_content(&tx, id, CONTENT_PROJECT, &form.tags)?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> StoreResult<()> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;
        let n = tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(StoreError::NotFound("Project"));
        }
        Tag::clear_for_content(&tx, id, CONTENT_PROJECT)?;
        tx.commit()?;
        Ok(())
    }
}
