use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub const DEFAULT_DB_PATH: &str = "website/db/showcase.db";

pub fn init_pool() -> Result<DbPool, String> {
    let path = std::env::var("SHOWCASE_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    init_pool_at(&path)
}

pub fn init_pool_at(path: &str) -> Result<DbPool, String> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(10)
        .build(manager)
        .map_err(|e| e.to_string())?;

    // WAL lets the public read endpoints run while an admin delete holds the write lock
    let conn = pool.get().map_err(|e| e.to_string())?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
        .map_err(|e| e.to_string())?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Portfolio items (ids are assigned by the caller)
        CREATE TABLE IF NOT EXISTS portfolio_items (
            id TEXT PRIMARY KEY,
            media_kind TEXT NOT NULL,
            source_url TEXT NOT NULL,
            thumbnail_url TEXT,
            created_at DATETIME NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_items_created ON portfolio_items(created_at);

        -- Likes tracking (IP-based). No foreign key: rows outlive their item.
        CREATE TABLE IF NOT EXISTS likes (
            id INTEGER PRIMARY KEY,
            item_id TEXT NOT NULL,
            ip_hash TEXT NOT NULL,
            user_agent TEXT,
            created_at DATETIME NOT NULL,
            item_deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at DATETIME
        );

        CREATE INDEX IF NOT EXISTS idx_likes_item ON likes(item_id);
        CREATE INDEX IF NOT EXISTS idx_likes_created ON likes(created_at);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_live_actor
            ON likes(item_id, ip_hash) WHERE item_deleted = 0;

        -- Share events, one row per share
        CREATE TABLE IF NOT EXISTS shares (
            id INTEGER PRIMARY KEY,
            item_id TEXT NOT NULL,
            ip_hash TEXT NOT NULL,
            user_agent TEXT,
            method TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            item_deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at DATETIME
        );

        CREATE INDEX IF NOT EXISTS idx_shares_item ON shares(item_id);
        CREATE INDEX IF NOT EXISTS idx_shares_created ON shares(created_at);

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        -- Admin sessions
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            ip_hash TEXT,
            user_agent TEXT
        );
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_url", "http://localhost:8000"),
        // Security
        ("admin_username", "admin"),
        ("session_expiry_hours", "24"),
        ("login_rate_limit", "5"),
        // Media
        ("media_backend", "local"),
        ("uploads_path", "website/uploads/"),
        ("uploads_max_mb", "50"),
        ("thumb_size", "600x600"),
        // Background tasks (minutes)
        ("task_orphan_sweep_interval", "60"),
        ("task_session_cleanup_interval", "30"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    let admin_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key = 'admin_password_hash'",
        [],
        |row| row.get(0),
    )?;

    if admin_exists == 0 {
        let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            log::warn!("ADMIN_PASSWORD not set, seeding the default admin password");
            "admin".to_string()
        });
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            params![hash],
        )?;
    }

    Ok(())
}
