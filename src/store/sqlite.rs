use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::analytics::{EngagementSummary, TopItem};
use crate::models::engagement::{self, EngagementKind, EngagementRecord, Like, Share, ShareMethod};
use crate::models::portfolio::{NewItem, PortfolioItem};
use crate::models::session::Session;
use crate::models::settings::Setting;

use super::Store;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<()> {
        crate::db::run_migrations(&self.pool).map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    fn seed_defaults(&self) -> Result<()> {
        crate::db::seed_defaults(&self.pool).map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        Setting::get(&self.pool, key)
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<()> {
        Setting::set(&self.pool, key, value)
    }

    // ── Portfolio items ─────────────────────────────────────────────

    fn item_find(&self, id: &str) -> Result<Option<PortfolioItem>> {
        PortfolioItem::find_by_id(&self.pool, id)
    }

    fn item_exists(&self, id: &str) -> Result<bool> {
        PortfolioItem::exists(&self.pool, id)
    }

    fn item_list(&self) -> Result<Vec<PortfolioItem>> {
        PortfolioItem::list(&self.pool)
    }

    fn item_count(&self) -> Result<i64> {
        PortfolioItem::count(&self.pool)
    }

    fn item_create(&self, item: &NewItem) -> Result<PortfolioItem> {
        PortfolioItem::create(&self.pool, item)
    }

    fn item_delete_cascade(&self, id: &str) -> Result<(usize, usize)> {
        PortfolioItem::delete_with_engagement(&self.pool, id)
    }

    // ── Likes ───────────────────────────────────────────────────────

    fn like_add(&self, item_id: &str, actor: &str, user_agent: Option<&str>) -> Result<bool> {
        Like::add(&self.pool, item_id, actor, user_agent)
    }

    fn like_remove(&self, item_id: &str, actor: &str) -> Result<usize> {
        Like::remove(&self.pool, item_id, actor)
    }

    fn like_exists(&self, item_id: &str, actor: &str) -> Result<bool> {
        Like::exists(&self.pool, item_id, actor)
    }

    fn like_count(&self, item_id: &str) -> Result<i64> {
        Like::count_live(&self.pool, item_id)
    }

    // ── Shares ──────────────────────────────────────────────────────

    fn share_add(
        &self,
        item_id: &str,
        actor: &str,
        user_agent: Option<&str>,
        method: ShareMethod,
    ) -> Result<i64> {
        Share::add(&self.pool, item_id, actor, user_agent, method)
    }

    fn share_count(&self, item_id: &str) -> Result<i64> {
        Share::count_live(&self.pool, item_id)
    }

    // ── Engagement analytics ────────────────────────────────────────

    fn engagement_summary(&self) -> Result<EngagementSummary> {
        EngagementSummary::load(&self.pool)
    }

    fn engagement_top(&self, kind: EngagementKind, limit: i64) -> Result<Vec<TopItem>> {
        TopItem::leaderboard(&self.pool, kind, limit)
    }

    fn engagement_recent(&self, kind: EngagementKind, limit: i64) -> Result<Vec<EngagementRecord>> {
        EngagementRecord::recent(&self.pool, kind, limit)
    }

    fn engagement_for_item(
        &self,
        kind: EngagementKind,
        item_id: &str,
    ) -> Result<Vec<EngagementRecord>> {
        EngagementRecord::for_item(&self.pool, kind, item_id)
    }

    fn engagement_sweep_orphans(&self) -> Result<(usize, usize)> {
        engagement::sweep_orphans(&self.pool)
    }

    // ── Admin sessions ──────────────────────────────────────────────

    fn session_create(
        &self,
        expiry_hours: i64,
        ip_hash: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<String> {
        Session::create(&self.pool, expiry_hours, ip_hash, user_agent)
    }

    fn session_validate(&self, token: &str) -> bool {
        Session::is_valid(&self.pool, token).unwrap_or(false)
    }

    fn session_delete(&self, token: &str) -> Result<()> {
        Session::delete(&self.pool, token)
    }

    fn session_cleanup_expired(&self) -> Result<usize> {
        Session::cleanup_expired(&self.pool)
    }
}
