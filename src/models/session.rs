use chrono::{Duration, Utc};
use rusqlite::params;

use crate::db::DbPool;
use crate::error::Result;

pub struct Session;

impl Session {
    pub fn create(
        pool: &DbPool,
        expiry_hours: i64,
        ip_hash: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<String> {
        let conn = pool.get()?;
        let session_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let expires = now + Duration::hours(expiry_hours.max(1));

        conn.execute(
            "INSERT INTO sessions (id, created_at, expires_at, ip_hash, user_agent)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![session_id, now, expires, ip_hash, user_agent],
        )?;

        Ok(session_id)
    }

    pub fn is_valid(pool: &DbPool, session_id: &str) -> Result<bool> {
        let conn = pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE id = ?1 AND expires_at > ?2",
            params![session_id, Utc::now().naive_utc()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn delete(pool: &DbPool, session_id: &str) -> Result<()> {
        let conn = pool.get()?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        Ok(())
    }

    pub fn cleanup_expired(pool: &DbPool) -> Result<usize> {
        let conn = pool.get()?;
        let removed = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![Utc::now().naive_utc()],
        )?;
        Ok(removed)
    }
}
