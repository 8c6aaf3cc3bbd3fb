use serde::Serialize;

use crate::error::Result;
use crate::models::analytics::{EngagementSummary, TopItem};
use crate::models::engagement::{EngagementKind, EngagementRecord};
use crate::store::Store;

pub const DEFAULT_TOP_LIMIT: i64 = 20;
pub const DEFAULT_RECENT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;

/// Clamp a caller-supplied limit into `0..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(0, MAX_LIMIT)
}

/// Admin panel payload for one engagement kind.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindReport {
    pub summary: KindSummary,
    pub top_items: Vec<TopItem>,
    pub recent: Vec<EngagementRecord>,
}

#[derive(Debug, Serialize)]
pub struct KindSummary {
    pub active: i64,
    #[serde(rename = "forDeletedItems")]
    pub for_deleted_items: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemHistory {
    pub item_id: String,
    pub item_exists: bool,
    pub likes: Vec<EngagementRecord>,
    pub shares: Vec<EngagementRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub summary: EngagementSummary,
    pub items: i64,
    pub top_by_likes: Vec<TopItem>,
    pub top_by_shares: Vec<TopItem>,
}

pub fn summarize(store: &dyn Store) -> Result<EngagementSummary> {
    store.engagement_summary()
}

pub fn top_items_by_likes(store: &dyn Store, limit: i64) -> Result<Vec<TopItem>> {
    top_items(store, EngagementKind::Like, limit)
}

pub fn top_items_by_shares(store: &dyn Store, limit: i64) -> Result<Vec<TopItem>> {
    top_items(store, EngagementKind::Share, limit)
}

pub fn recent_likes(store: &dyn Store, limit: i64) -> Result<Vec<EngagementRecord>> {
    recent(store, EngagementKind::Like, limit)
}

pub fn recent_shares(store: &dyn Store, limit: i64) -> Result<Vec<EngagementRecord>> {
    recent(store, EngagementKind::Share, limit)
}

fn top_items(store: &dyn Store, kind: EngagementKind, limit: i64) -> Result<Vec<TopItem>> {
    if limit <= 0 {
        return Ok(Vec::new());
    }
    store.engagement_top(kind, limit.min(MAX_LIMIT))
}

fn recent(store: &dyn Store, kind: EngagementKind, limit: i64) -> Result<Vec<EngagementRecord>> {
    if limit <= 0 {
        return Ok(Vec::new());
    }
    store.engagement_recent(kind, limit.min(MAX_LIMIT))
}

pub fn report(store: &dyn Store, kind: EngagementKind, top: i64, recent_limit: i64) -> Result<KindReport> {
    let summary = store.engagement_summary()?;
    let (active, for_deleted_items) = match kind {
        EngagementKind::Like => (summary.likes_active, summary.likes_for_deleted_items),
        EngagementKind::Share => (summary.shares_active, summary.shares_for_deleted_items),
    };
    let (top_items, recent) = match kind {
        EngagementKind::Like => (
            top_items_by_likes(store, top)?,
            recent_likes(store, recent_limit)?,
        ),
        EngagementKind::Share => (
            top_items_by_shares(store, top)?,
            recent_shares(store, recent_limit)?,
        ),
    };
    Ok(KindReport {
        summary: KindSummary {
            active,
            for_deleted_items,
        },
        top_items,
        recent,
    })
}

/// Every like and share ever recorded for one id, soft-deleted history included.
/// Works after the item is gone, so the admin can audit what a deletion kept.
pub fn item_history(store: &dyn Store, item_id: &str) -> Result<ItemHistory> {
    Ok(ItemHistory {
        item_id: item_id.to_string(),
        item_exists: store.item_exists(item_id)?,
        likes: store.engagement_for_item(EngagementKind::Like, item_id)?,
        shares: store.engagement_for_item(EngagementKind::Share, item_id)?,
    })
}

pub fn overview(store: &dyn Store, limit: i64) -> Result<Overview> {
    Ok(Overview {
        summary: summarize(store)?,
        items: store.item_count()?,
        top_by_likes: top_items_by_likes(store, limit)?,
        top_by_shares: top_items_by_shares(store, limit)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_defaults_and_bounds() {
        assert_eq!(clamp_limit(None, DEFAULT_TOP_LIMIT), 20);
        assert_eq!(clamp_limit(Some(-3), DEFAULT_TOP_LIMIT), 0);
        assert_eq!(clamp_limit(Some(10_000), DEFAULT_RECENT_LIMIT), MAX_LIMIT);
        assert_eq!(clamp_limit(Some(7), DEFAULT_RECENT_LIMIT), 7);
    }
}
