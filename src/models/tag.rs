use rusqlite::{params, Connection};
use serde::{Deserialize, Deserializer};

use crate::error::StoreResult;

pub const CONTENT_POST: &str = "post";
pub const CONTENT_PROJECT: &str = "project";

/// Ordered tag names attached to a post or project.
pub struct Tag;

impl Tag {
    pub fn for_content(
        conn: &Connection,
        content_id: i64,
        content_type: &str,
    ) -> StoreResult<Vec<String>> {
        let mut stmt = conn.prepare_cached(
            "SELECT t.name FROM tags t
             JOIN content_tags ct ON ct.tag_id = t.id
             WHERE ct.content_id = ?1 AND ct.content_type = ?2
             ORDER BY ct.position",
        )?;
        let rows = stmt.query_map(params![content_id, content_type], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    /// Replace the tags of one item, keeping the given order.
    /// Call inside the transaction that writes the item itself.
    pub fn set_for_content(
        conn: &Connection,
        content_id: i64,
        content_type: &str,
        names: &[String],
    ) -> StoreResult<()> {
        conn.execute(
            "DELETE FROM content_tags WHERE content_id = ?1 AND content_type = ?2",
            params![content_id, content_type],
        )?;

        for (position, name) in names.iter().enumerate() {
            let tag_id = Self::find_or_create(conn, name)?;
            conn.execute(
                "INSERT OR IGNORE INTO content_tags (content_id, content_type, tag_id, position)
                 VALUES (?1, ?2, ?3, ?4)",
                params![content_id, content_type, tag_id, position as i64],
            )?;
        }
        Ok(())
    }

    pub fn clear_for_content(conn: &Connection, content_id: i64, content_type: &str) -> StoreResult<()> {
        conn.execute(
            "DELETE FROM content_tags WHERE content_id = ?1 AND content_type = ?2",
            params![content_id, content_type],
        )?;
        Ok(())
    }

    fn find_or_create(conn: &Connection, name: &str) -> StoreResult<i64> {
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])?;
        Ok(conn.query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
            row.get(0)
        })?)
    }
}

/// Trim, drop empties and duplicates, keep first-seen order.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for t in raw {
        let t = t.as_ref().trim();
        if !t.is_empty() && !out.iter().any(|seen| seen == t) {
            out.push(t.to_string());
        }
    }
    out
}

/// Accepts either `["a", "b"]` or `"a, b"` for a tags field.
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TagsInput {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<TagsInput>::deserialize(deserializer)? {
        Some(TagsInput::List(v)) => normalize_tags(v),
        Some(TagsInput::Joined(s)) => normalize_tags(s.split(',')),
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_tags")]
        tags: Vec<String>,
    }

    #[test]
    fn tags_accept_list_or_comma_string() {
        let a: Holder = serde_json::from_str(r#"{"tags": ["rust", " web ", ""]}"#).unwrap();
        assert_eq!(a.tags, vec!["rust", "web"]);

        let b: Holder = serde_json::from_str(r#"{"tags": "rust, web,,rust"}"#).unwrap();
        assert_eq!(b.tags, vec!["rust", "web"]);

        let c: Holder = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert!(c.tags.is_empty());

        let d: Holder = serde_json::from_str("{}").unwrap();
        assert!(d.tags.is_empty());
    }
}
