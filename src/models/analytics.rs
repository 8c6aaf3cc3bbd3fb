use rusqlite::params;
use serde::Serialize;

use crate::db::DbPool;
use crate::error::Result;
use crate::models::engagement::EngagementKind;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSummary {
    pub likes_active: i64,
    pub likes_for_deleted_items: i64,
    pub shares_active: i64,
    pub shares_for_deleted_items: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub item_id: String,
    pub count: i64,
    /// True if any record in the group belongs to a deleted item.
    pub item_deleted: bool,
}

/// (active, for_deleted_items) counts for one table.
fn partition_counts(pool: &DbPool, kind: EngagementKind) -> Result<(i64, i64)> {
    let conn = pool.get()?;
    let sql = format!(
        "SELECT
            COALESCE(SUM(CASE WHEN item_deleted = 0 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN item_deleted != 0 THEN 1 ELSE 0 END), 0)
         FROM {}",
        kind.table()
    );
    let counts = conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?;
    Ok(counts)
}

impl EngagementSummary {
    pub fn load(pool: &DbPool) -> Result<Self> {
        let (likes_active, likes_for_deleted_items) = partition_counts(pool, EngagementKind::Like)?;
        let (shares_active, shares_for_deleted_items) =
            partition_counts(pool, EngagementKind::Share)?;
        Ok(EngagementSummary {
            likes_active,
            likes_for_deleted_items,
            shares_active,
            shares_for_deleted_items,
        })
    }
}

impl TopItem {
    pub fn leaderboard(pool: &DbPool, kind: EngagementKind, limit: i64) -> Result<Vec<Self>> {
        let conn = pool.get()?;
        let sql = format!(
            "SELECT item_id, COUNT(*) AS count, MAX(item_deleted) AS any_deleted
             FROM {}
             GROUP BY item_id
             ORDER BY count DESC, item_id ASC
             LIMIT ?1",
            kind.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let any_deleted: i64 = row.get("any_deleted")?;
                Ok(TopItem {
                    item_id: row.get("item_id")?,
                    count: row.get("count")?,
                    item_deleted: any_deleted != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
