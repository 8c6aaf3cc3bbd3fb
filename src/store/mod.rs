use crate::error::Result;
use crate::models::analytics::{EngagementSummary, TopItem};
use crate::models::engagement::{EngagementKind, EngagementRecord, ShareMethod};
use crate::models::portfolio::{NewItem, PortfolioItem};

pub mod sqlite;

/// Unified data-access trait. Every database operation goes through here.
/// `SqliteStore` wraps rusqlite/r2d2 and delegates to the model methods.
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<()>;
    fn seed_defaults(&self) -> Result<()>;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Option<String>;
    fn setting_get_or(&self, key: &str, default: &str) -> String {
        self.setting_get(key).unwrap_or_else(|| default.to_string())
    }
    fn setting_get_i64(&self, key: &str) -> i64 {
        self.setting_get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
    fn setting_set(&self, key: &str, value: &str) -> Result<()>;

    // ── Portfolio items ─────────────────────────────────────────────
    fn item_find(&self, id: &str) -> Result<Option<PortfolioItem>>;
    fn item_exists(&self, id: &str) -> Result<bool>;
    fn item_list(&self) -> Result<Vec<PortfolioItem>>;
    fn item_count(&self) -> Result<i64>;
    /// Fails with `Conflict` if the id is taken.
    fn item_create(&self, item: &NewItem) -> Result<PortfolioItem>;
    /// Soft-mark engagement then remove the item, atomically.
    /// Returns (likes_marked, shares_marked); `NotFound` if absent.
    fn item_delete_cascade(&self, id: &str) -> Result<(usize, usize)>;

    // ── Likes ───────────────────────────────────────────────────────
    /// Returns false when the actor already had a live like.
    fn like_add(&self, item_id: &str, actor: &str, user_agent: Option<&str>) -> Result<bool>;
    fn like_remove(&self, item_id: &str, actor: &str) -> Result<usize>;
    fn like_exists(&self, item_id: &str, actor: &str) -> Result<bool>;
    fn like_count(&self, item_id: &str) -> Result<i64>;

    // ── Shares ──────────────────────────────────────────────────────
    fn share_add(
        &self,
        item_id: &str,
        actor: &str,
        user_agent: Option<&str>,
        method: ShareMethod,
    ) -> Result<i64>;
    fn share_count(&self, item_id: &str) -> Result<i64>;

    // ── Engagement analytics ────────────────────────────────────────
    fn engagement_summary(&self) -> Result<EngagementSummary>;
    fn engagement_top(&self, kind: EngagementKind, limit: i64) -> Result<Vec<TopItem>>;
    fn engagement_recent(&self, kind: EngagementKind, limit: i64) -> Result<Vec<EngagementRecord>>;
    fn engagement_for_item(&self, kind: EngagementKind, item_id: &str)
        -> Result<Vec<EngagementRecord>>;
    /// Soft-mark live rows whose item is gone. Returns (likes_marked, shares_marked).
    fn engagement_sweep_orphans(&self) -> Result<(usize, usize)>;

    // ── Admin sessions ──────────────────────────────────────────────
    fn session_create(
        &self,
        expiry_hours: i64,
        ip_hash: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<String>;
    fn session_validate(&self, token: &str) -> bool;
    fn session_delete(&self, token: &str) -> Result<()>;
    fn session_cleanup_expired(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::portfolio::MediaKind;
    use crate::store::sqlite::SqliteStore;

    /// Create a fresh in-memory SqliteStore with migrations applied.
    /// The admin hash is pre-seeded so seed_defaults skips the slow bcrypt call.
    fn test_store() -> SqliteStore {
        let manager = r2d2_sqlite::SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .build(manager)
            .expect("Failed to create in-memory pool");
        let store = SqliteStore::new(pool);
        store.run_migrations().expect("migrations failed");
        store
            .setting_set("admin_password_hash", "x")
            .expect("pre-seed failed");
        store.seed_defaults().expect("seed failed");
        store
    }

    fn new_item(id: &str) -> NewItem {
        NewItem {
            id: id.to_string(),
            media_kind: MediaKind::Image,
            source_url: format!("https://cdn.example.com/{}.jpg", id),
            thumbnail_url: None,
        }
    }

    // ── Settings ────────────────────────────────────────────────────

    #[test]
    fn test_settings_seeded() {
        let s = test_store();
        assert_eq!(s.setting_get_or("admin_username", ""), "admin");
        assert_eq!(s.setting_get_i64("login_rate_limit"), 5);
        // Pre-seeded hash was not overwritten
        assert_eq!(s.setting_get("admin_password_hash"), Some("x".to_string()));
    }

    // ── Items ───────────────────────────────────────────────────────

    #[test]
    fn test_item_create_and_find() {
        let s = test_store();
        let created = s.item_create(&new_item("a")).unwrap();
        let found = s.item_find("a").unwrap().unwrap();
        assert_eq!(found, created);
        assert!(s.item_exists("a").unwrap());
        assert!(s.item_find("missing").unwrap().is_none());
        assert_eq!(s.item_count().unwrap(), 1);
    }

    #[test]
    fn test_item_duplicate_conflicts() {
        let s = test_store();
        s.item_create(&new_item("dup")).unwrap();
        let mut again = new_item("dup");
        again.source_url = "https://cdn.example.com/other.jpg".to_string();
        assert!(matches!(s.item_create(&again), Err(AppError::Conflict(_))));
        let kept = s.item_find("dup").unwrap().unwrap();
        assert_eq!(kept.source_url, "https://cdn.example.com/dup.jpg");
    }

    #[test]
    fn test_item_delete_cascade_marks_engagement() {
        let s = test_store();
        s.item_create(&new_item("gone")).unwrap();
        s.like_add("gone", "actor1", Some("ua")).unwrap();
        s.like_add("gone", "actor2", None).unwrap();
        s.share_add("gone", "actor1", None, ShareMethod::Copy).unwrap();

        let (likes, shares) = s.item_delete_cascade("gone").unwrap();
        assert_eq!((likes, shares), (2, 1));
        assert!(s.item_find("gone").unwrap().is_none());

        let rows = s.engagement_for_item(EngagementKind::Like, "gone").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.item_deleted && r.deleted_at.is_some()));

        assert!(matches!(
            s.item_delete_cascade("gone"),
            Err(AppError::NotFound(_))
        ));
    }

    // ── Likes ───────────────────────────────────────────────────────

    #[test]
    fn test_likes() {
        let s = test_store();
        s.item_create(&new_item("l")).unwrap();

        assert!(!s.like_exists("l", "iphash1").unwrap());
        assert!(s.like_add("l", "iphash1", None).unwrap());
        assert!(s.like_exists("l", "iphash1").unwrap());
        // Second like from the same actor is ignored
        assert!(!s.like_add("l", "iphash1", None).unwrap());
        assert_eq!(s.like_count("l").unwrap(), 1);

        assert_eq!(s.like_remove("l", "iphash1").unwrap(), 1);
        assert!(!s.like_exists("l", "iphash1").unwrap());
        assert_eq!(s.like_count("l").unwrap(), 0);
    }

    #[test]
    fn test_like_missing_item() {
        let s = test_store();
        assert!(matches!(
            s.like_add("nope", "iphash1", None),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(s.engagement_summary().unwrap().likes_active, 0);
    }

    // ── Shares ──────────────────────────────────────────────────────

    #[test]
    fn test_shares_always_append() {
        let s = test_store();
        s.item_create(&new_item("sh")).unwrap();
        s.share_add("sh", "a", None, ShareMethod::Native).unwrap();
        s.share_add("sh", "a", None, ShareMethod::Native).unwrap();
        s.share_add("sh", "b", Some("ua"), ShareMethod::Copy).unwrap();
        assert_eq!(s.share_count("sh").unwrap(), 3);

        let recent = s.engagement_recent(EngagementKind::Share, 10).unwrap();
        assert_eq!(recent[0].method, Some(ShareMethod::Copy));
        assert_eq!(recent[0].actor, "b");
    }

    // ── Orphan sweep ────────────────────────────────────────────────

    #[test]
    fn test_sweep_orphans() {
        let s = test_store();
        s.item_create(&new_item("o")).unwrap();
        s.like_add("o", "a", None).unwrap();
        s.share_add("o", "a", None, ShareMethod::Copy).unwrap();

        // Simulate a crash after the item row was removed but before the sweep
        {
            let conn = s.pool.get().unwrap();
            conn.execute("DELETE FROM portfolio_items WHERE id = 'o'", [])
                .unwrap();
        }

        assert_eq!(s.engagement_sweep_orphans().unwrap(), (1, 1));
        assert_eq!(s.engagement_sweep_orphans().unwrap(), (0, 0));
        let summary = s.engagement_summary().unwrap();
        assert_eq!(summary.likes_for_deleted_items, 1);
        assert_eq!(summary.shares_for_deleted_items, 1);
    }

    // ── Sessions ────────────────────────────────────────────────────

    #[test]
    fn test_session_lifecycle() {
        let s = test_store();
        let token = s.session_create(1, Some("iphash"), Some("ua")).unwrap();
        assert!(s.session_validate(&token));
        assert!(!s.session_validate("bogus"));

        s.session_delete(&token).unwrap();
        assert!(!s.session_validate(&token));
    }
}
