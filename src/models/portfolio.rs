use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Classify an upload by its MIME type. Anything other than image/* or video/* is rejected.
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let ct = content_type.trim().to_ascii_lowercase();
        if ct.starts_with("image/") {
            Ok(MediaKind::Image)
        } else if ct.starts_with("video/") {
            Ok(MediaKind::Video)
        } else {
            Err(AppError::Validation(format!(
                "unsupported media type '{}', only images and videos are allowed",
                content_type
            )))
        }
    }
}

impl FromStr for MediaKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(AppError::Validation(format!("unknown media kind '{}'", other))),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: String,
    pub media_kind: MediaKind,
    pub source_url: String,
    pub thumbnail_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub id: String,
    pub media_kind: MediaKind,
    pub source_url: String,
    pub thumbnail_url: Option<String>,
}

impl PortfolioItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let kind: String = row.get("media_kind")?;
        let media_kind = kind.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("bad media_kind '{}'", kind).into(),
            )
        })?;
        Ok(PortfolioItem {
            id: row.get("id")?,
            media_kind,
            source_url: row.get("source_url")?,
            thumbnail_url: row.get("thumbnail_url")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Self>> {
        let conn = pool.get()?;
        let item = conn
            .query_row(
                "SELECT * FROM portfolio_items WHERE id = ?1",
                params![id],
                Self::from_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn exists(pool: &DbPool, id: &str) -> Result<bool> {
        let conn = pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM portfolio_items WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list(pool: &DbPool) -> Result<Vec<Self>> {
        let conn = pool.get()?;
        let mut stmt =
            conn.prepare("SELECT * FROM portfolio_items ORDER BY created_at DESC, id ASC")?;
        let items = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn count(pool: &DbPool) -> Result<i64> {
        let conn = pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM portfolio_items", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn create(pool: &DbPool, item: &NewItem) -> Result<Self> {
        let conn = pool.get()?;
        let created_at = Utc::now().naive_utc();

        let inserted = conn.execute(
            "INSERT INTO portfolio_items (id, media_kind, source_url, thumbnail_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.id,
                item.media_kind.as_str(),
                item.source_url,
                item.thumbnail_url,
                created_at,
            ],
        );

        match inserted {
            Ok(_) => Ok(PortfolioItem {
                id: item.id.clone(),
                media_kind: item.media_kind,
                source_url: item.source_url.clone(),
                thumbnail_url: item.thumbnail_url.clone(),
                created_at,
            }),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(AppError::Conflict(item.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Soft-mark the item's engagement rows and remove the item, in one transaction.
    /// Returns (likes_marked, shares_marked).
    pub fn delete_with_engagement(pool: &DbPool, id: &str) -> Result<(usize, usize)> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;

        let present: i64 = tx.query_row(
            "SELECT COUNT(*) FROM portfolio_items WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if present == 0 {
            return Err(AppError::NotFound(id.to_string()));
        }

        let now = Utc::now().naive_utc();
        let likes_marked = tx.execute(
            "UPDATE likes SET item_deleted = 1, deleted_at = ?2
             WHERE item_id = ?1 AND item_deleted = 0",
            params![id, now],
        )?;
        let shares_marked = tx.execute(
            "UPDATE shares SET item_deleted = 1, deleted_at = ?2
             WHERE item_id = ?1 AND item_deleted = 0",
            params![id, now],
        )?;
        tx.execute("DELETE FROM portfolio_items WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok((likes_marked, shares_marked))
    }
}
