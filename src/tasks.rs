use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::rate_limit::RateLimiter;
use crate::store::Store;

pub struct BackgroundTasks;

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let store = match rocket.state::<Arc<dyn Store>>() {
            Some(s) => Arc::clone(s),
            None => {
                log::error!("[task] Store not found in managed state, background tasks disabled");
                return;
            }
        };

        // Orphan sweep: soft-mark engagement rows whose item disappeared
        let s = Arc::clone(&store);
        tokio::spawn(async move {
            loop {
                let interval = get_interval(&*s, "task_orphan_sweep_interval", 60);
                tokio::time::sleep(Duration::from_secs(interval * 60)).await;
                if let Err(e) = crate::lifecycle::sweep_orphans(&*s) {
                    log::error!("[task] Orphan sweep failed: {}", e);
                }
            }
        });

        // Session cleanup task
        let s = Arc::clone(&store);
        let limiter = rocket.state::<Arc<RateLimiter>>().cloned();
        tokio::spawn(async move {
            loop {
                let interval = get_interval(&*s, "task_session_cleanup_interval", 30);
                tokio::time::sleep(Duration::from_secs(interval * 60)).await;
                match s.session_cleanup_expired() {
                    Ok(count) => {
                        if count > 0 {
                            log::info!("[task] Cleaned up {} expired sessions", count);
                        }
                    }
                    Err(e) => log::error!("[task] Session cleanup failed: {}", e),
                }
                if let Some(l) = &limiter {
                    l.cleanup(Duration::from_secs(15 * 60));
                }
            }
        });

        log::info!("[task] Background tasks started");
    }
}

fn get_interval(store: &dyn Store, key: &str, default: u64) -> u64 {
    store
        .setting_get_or(key, &default.to_string())
        .parse::<u64>()
        .unwrap_or(default)
        .max(1)
}
