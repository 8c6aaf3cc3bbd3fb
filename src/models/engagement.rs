use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::{AppError, Result};

/// Which engagement table a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    Like,
    Share,
}

impl EngagementKind {
    pub fn table(&self) -> &'static str {
        match self {
            EngagementKind::Like => "likes",
            EngagementKind::Share => "shares",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMethod {
    Native,
    Copy,
}

impl ShareMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareMethod::Native => "native",
            ShareMethod::Copy => "copy",
        }
    }
}

impl FromStr for ShareMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "native" => Ok(ShareMethod::Native),
            "copy" => Ok(ShareMethod::Copy),
            other => Err(AppError::Validation(format!("unknown share method '{}'", other))),
        }
    }
}

impl fmt::Display for ShareMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

impl FromStr for LikeAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "like" => Ok(LikeAction::Like),
            "unlike" => Ok(LikeAction::Unlike),
            other => Err(AppError::Validation(format!("unknown like action '{}'", other))),
        }
    }
}

/// Read shape shared by like and share rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementRecord {
    pub id: i64,
    pub item_id: String,
    pub actor: String,
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ShareMethod>,
    pub created_at: NaiveDateTime,
    pub item_deleted: bool,
    pub deleted_at: Option<NaiveDateTime>,
}

impl EngagementRecord {
    fn from_row(row: &Row, kind: EngagementKind) -> rusqlite::Result<Self> {
        let method = match kind {
            EngagementKind::Like => None,
            EngagementKind::Share => {
                let raw: String = row.get("method")?;
                raw.parse().ok()
            }
        };
        let deleted: i64 = row.get("item_deleted")?;
        Ok(EngagementRecord {
            id: row.get("id")?,
            item_id: row.get("item_id")?,
            actor: row.get("ip_hash")?,
            user_agent: row.get("user_agent")?,
            method,
            created_at: row.get("created_at")?,
            item_deleted: deleted != 0,
            deleted_at: row.get("deleted_at")?,
        })
    }

    /// All rows for one item, oldest first. Includes soft-deleted history.
    pub fn for_item(pool: &DbPool, kind: EngagementKind, item_id: &str) -> Result<Vec<Self>> {
        let conn = pool.get()?;
        let sql = format!(
            "SELECT * FROM {} WHERE item_id = ?1 ORDER BY id ASC",
            kind.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![item_id], |row| Self::from_row(row, kind))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn recent(pool: &DbPool, kind: EngagementKind, limit: i64) -> Result<Vec<Self>> {
        let conn = pool.get()?;
        let sql = format!(
            "SELECT * FROM {} ORDER BY created_at DESC, id DESC LIMIT ?1",
            kind.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit], |row| Self::from_row(row, kind))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ── Likes ───────────────────────────────────────────────

pub struct Like;

impl Like {
    /// Insert the actor's live like. Returns false if the actor already likes the item.
    /// Fails with NotFound when the item does not exist; the existence check and the
    /// insert are one statement so a concurrent delete cannot slip between them.
    pub fn add(pool: &DbPool, item_id: &str, ip_hash: &str, user_agent: Option<&str>) -> Result<bool> {
        let conn = pool.get()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO likes (item_id, ip_hash, user_agent, created_at)
             SELECT ?1, ?2, ?3, ?4
             WHERE EXISTS (SELECT 1 FROM portfolio_items WHERE id = ?1)",
            params![item_id, ip_hash, user_agent, Utc::now().naive_utc()],
        )?;
        if inserted > 0 {
            return Ok(true);
        }
        let present: i64 = conn.query_row(
            "SELECT COUNT(*) FROM portfolio_items WHERE id = ?1",
            params![item_id],
            |row| row.get(0),
        )?;
        if present == 0 {
            return Err(AppError::NotFound(item_id.to_string()));
        }
        Ok(false)
    }

    /// Remove the actor's live like. Soft-deleted history is never touched.
    pub fn remove(pool: &DbPool, item_id: &str, ip_hash: &str) -> Result<usize> {
        let conn = pool.get()?;
        let removed = conn.execute(
            "DELETE FROM likes WHERE item_id = ?1 AND ip_hash = ?2 AND item_deleted = 0",
            params![item_id, ip_hash],
        )?;
        Ok(removed)
    }

    pub fn count_live(pool: &DbPool, item_id: &str) -> Result<i64> {
        let conn = pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE item_id = ?1 AND item_deleted = 0",
            params![item_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn exists(pool: &DbPool, item_id: &str, ip_hash: &str) -> Result<bool> {
        let conn = pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE item_id = ?1 AND ip_hash = ?2 AND item_deleted = 0",
            params![item_id, ip_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

// ── Shares ──────────────────────────────────────────────

pub struct Share;

impl Share {
    /// Append one share event. Fails with NotFound when the item does not exist.
    pub fn add(
        pool: &DbPool,
        item_id: &str,
        ip_hash: &str,
        user_agent: Option<&str>,
        method: ShareMethod,
    ) -> Result<i64> {
        let conn = pool.get()?;
        let inserted = conn.execute(
            "INSERT INTO shares (item_id, ip_hash, user_agent, method, created_at)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE EXISTS (SELECT 1 FROM portfolio_items WHERE id = ?1)",
            params![item_id, ip_hash, user_agent, method.as_str(), Utc::now().naive_utc()],
        )?;
        if inserted == 0 {
            return Err(AppError::NotFound(item_id.to_string()));
        }
        Ok(conn.last_insert_rowid())
    }

    pub fn count_live(pool: &DbPool, item_id: &str) -> Result<i64> {
        let conn = pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM shares WHERE item_id = ?1 AND item_deleted = 0",
            params![item_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ── Orphan sweep ────────────────────────────────────────

/// Soft-mark live engagement rows whose item no longer exists.
/// Returns (likes_marked, shares_marked). Safe to run any number of times.
pub fn sweep_orphans(pool: &DbPool) -> Result<(usize, usize)> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    let now = Utc::now().naive_utc();

    let likes = tx.execute(
        "UPDATE likes SET item_deleted = 1, deleted_at = ?1
         WHERE item_deleted = 0
           AND NOT EXISTS (SELECT 1 FROM portfolio_items p WHERE p.id = likes.item_id)",
        params![now],
    )?;
    let shares = tx.execute(
        "UPDATE shares SET item_deleted = 1, deleted_at = ?1
         WHERE item_deleted = 0
           AND NOT EXISTS (SELECT 1 FROM portfolio_items p WHERE p.id = shares.item_id)",
        params![now],
    )?;

    tx.commit()?;
    Ok((likes, shares))
}
