#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::{FileServer, Options};
use rocket::http::Header;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket};
use serde_json::{json, Value};

mod analytics;
mod auth;
mod boot;
mod db;
mod engagement;
mod error;
mod lifecycle;
mod media;
mod models;
mod rate_limit;
mod routes;
mod store;
mod tasks;


use media::MediaHost;
use rate_limit::RateLimiter;
use store::sqlite::SqliteStore;
use store::Store;

pub const API_MOUNT: &str = "/api";
pub const ADMIN_API_MOUNT: &str = "/api/admin";

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info { name: "No-Cache Admin API", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        if req.uri().path().starts_with(ADMIN_API_MOUNT) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(400)]
fn bad_request() -> Json<Value> {
    Json(json!({ "error": "Invalid request" }))
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({ "error": "Authentication required" }))
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Json<Value> {
    Json(json!({ "error": format!("No route for {}", req.uri().path()) }))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    Json(json!({ "error": "Malformed request body" }))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(json!({ "error": "Internal server error" }))
}

/// Assemble the server around an already-migrated store.
/// Static upload serving is mounted separately at launch.
pub fn build_rocket(store: Arc<dyn Store>, media: Arc<dyn MediaHost>) -> Rocket<Build> {
    let limits = Limits::default()
        .limit("json", 1.mebibytes())
        .limit("data-form", 64.mebibytes())
        .limit("file", 64.mebibytes());
    let figment = rocket::Config::figment().merge(("limits", limits));

    rocket::custom(figment)
        .manage(store)
        .manage(media)
        .manage(Arc::new(RateLimiter::new()))
        .attach(NoCacheAdmin)
        .mount(API_MOUNT, routes::api::routes())
        .mount(ADMIN_API_MOUNT, routes::admin_api::routes())
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, server_error],
        )
}

fn open_store() -> Result<Arc<dyn Store>, String> {
    let pool = db::init_pool()?;
    let store = SqliteStore::new(pool);
    store.run_migrations().map_err(|e| e.to_string())?;
    store.seed_defaults().map_err(|e| e.to_string())?;
    Ok(Arc::new(store))
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check: create directories, verify they are writable
    boot::run();

    let store = match open_store() {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Recover from a crash between a delete and its engagement marking
    if let Err(e) = lifecycle::sweep_orphans(&*store) {
        log::warn!("Startup orphan sweep failed: {}", e);
    }

    let media = media::from_settings(&*store);
    log::info!("Media host: {}", media.name());

    let uploads_path = store.setting_get_or("uploads_path", "website/uploads/");
    if let Err(e) = std::fs::create_dir_all(&uploads_path) {
        log::warn!("Cannot create uploads directory {}: {}", uploads_path, e);
    }

    build_rocket(store, media)
        .attach(tasks::BackgroundTasks)
        .mount("/uploads", FileServer::new(uploads_path, Options::Index | Options::Missing))
}
