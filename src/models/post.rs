use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::comment::{Comment, CommentFilter, CommentStatus};
use super::tag::{deserialize_tags, Tag, CONTENT_POST};
use crate::db::DbPool;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Serialize, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image: String,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub likes: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A single post together with its comments.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: String,
}

impl PostForm {
    /// Title and content are required; everything else may be blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err("Missing required fields: title or content".to_string());
        }
        Ok(())
    }
}

const SELECT_COLS: &str = "SELECT p.id, p.title, p.content, p.excerpt, p.category, p.image,
            p.author_id, p.created_at, p.updated_at,
            u.username AS author_name,
            (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes
     FROM posts p
     LEFT JOIN users u ON p.author_id = u.id";

impl Post {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            excerpt: row.get("excerpt")?,
            category: row.get("category")?,
            tags: Vec::new(),
            image: row.get("image")?,
            author_id: row.get("author_id")?,
            author_name: row.get("author_name")?,
            likes: row.get("likes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn with_tags(conn: &Connection, mut post: Post) -> StoreResult<Post> {
        post.tags = Tag::for_content(conn, post.id, CONTENT_POST)?;
        Ok(post)
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> StoreResult<Option<Self>> {
        let conn = pool.get()?;
        let post = conn
            .query_row(
                &format!("{} WHERE p.id = ?1", SELECT_COLS),
                params![id],
                Self::from_row,
            )
            .optional()?;
        match post {
            Some(p) => Ok(Some(Self::with_tags(&conn, p)?)),
            None => Ok(None),
        }
    }

    /// Post with its comments. Unless `all_comments`, only approved ones.
    pub fn detail(pool: &DbPool, id: i64, all_comments: bool) -> StoreResult<Option<PostDetail>> {
        let post = match Self::find_by_id(pool, id)? {
            Some(p) => p,
            None => return Ok(None),
        };
        let filter = CommentFilter {
            post_id: Some(id),
            status: if all_comments { None } else { Some(CommentStatus::Approved) },
        };
        let comments = Comment::list(pool, &filter)?;
        Ok(Some(PostDetail { post, comments }))
    }

    pub fn exists(pool: &DbPool, id: i64) -> StoreResult<bool> {
        let conn = pool.get()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn list(pool: &DbPool) -> StoreResult<Vec<Self>> {
        let conn = pool.get()?;
        let posts = {
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY p.created_at DESC, p.id DESC",
                SELECT_COLS
            ))?;
            let rows = stmt.query_map([], Self::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        posts
            .into_iter()
            .map(|p| Self::with_tags(&conn, p))
            .collect()
    }

    pub fn create(pool: &DbPool, form: &PostForm, author_id: i64) -> StoreResult<i64> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO posts (title, content, excerpt, category, image, author_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.title.trim(),
                form.content,
                form.excerpt,
                form.category,
                form.image,
                author_id
            ],
        )?;
        let id = tx.last_insert_rowid();
        Tag::set_for_content(&tx, id, CONTENT_POST, &form.tags)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update(pool: &DbPool, id: i64, form: &PostForm) -> StoreResult<()> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;
        let n = tx.execute(
            "UPDATE posts SET title = ?1, content = ?2, excerpt = ?3, category = ?4, image = ?5,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?6",
            params![
                form.title.trim(),
                form.content,
                form.excerpt,
                form.category,
                form.image,
                id
            ],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound("Post"));
        }
        Tag::set_for_content(&tx, id, CONTENT_POST, &form.tags)?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> StoreResult<()> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;
        let n = tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(StoreError::NotFound("Post"));
        }
        Tag::clear_for_content(&tx, id, CONTENT_POST)?;
        tx.commit()?;
        Ok(())
    }
}
