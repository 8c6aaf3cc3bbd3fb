use std::sync::Arc;
use std::time::Duration;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::CookieJar;
use rocket::serde::json::Json;
use rocket::tokio::io::AsyncReadExt;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::analytics::{self, DEFAULT_RECENT_LIMIT, DEFAULT_TOP_LIMIT};
use crate::auth::{self, AdminUser, ClientIp, UserAgent};
use crate::error::{AppError, Result};
use crate::lifecycle;
use crate::media::MediaHost;
use crate::models::engagement::EngagementKind;
use crate::models::portfolio::NewItem;
use crate::rate_limit::RateLimiter;
use crate::store::Store;

// ── Session ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[post("/login", format = "json", data = "<form>")]
pub fn login(
    store: &State<Arc<dyn Store>>,
    limiter: &State<Arc<RateLimiter>>,
    cookies: &CookieJar<'_>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    form: Json<LoginRequest>,
) -> Result<Json<Value>> {
    let store = &**store.inner();
    let rate_key = format!("login:{}", client_ip.actor());
    let max_attempts = store.setting_get_i64("login_rate_limit").max(1) as u64;
    let window = Duration::from_secs(15 * 60);

    if !limiter.check_and_record(&rate_key, max_attempts, window) {
        return Err(AppError::RateLimited);
    }

    let session_id = auth::login(
        store,
        &form.username,
        &form.password,
        &client_ip.0,
        user_agent.0.as_deref(),
    )?;
    limiter.reset(&rate_key);

    let secure = store.setting_get_or("site_url", "").starts_with("https://");
    auth::set_session_cookie(cookies, &session_id, secure);
    log::info!("Admin session opened");
    Ok(Json(json!({ "success": true })))
}

#[post("/logout")]
pub fn logout(store: &State<Arc<dyn Store>>, cookies: &CookieJar<'_>) -> Json<Value> {
    if let Some(cookie) = cookies.get_private(auth::SESSION_COOKIE) {
        if let Err(e) = store.session_delete(cookie.value()) {
            log::warn!("Session delete failed: {}", e);
        }
    }
    auth::clear_session_cookie(cookies);
    Json(json!({ "success": true }))
}

// ── Items ──────────────────────────────────────────────

#[post("/portfolio", format = "json", data = "<item>")]
pub fn portfolio_create(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    item: Json<NewItem>,
) -> Result<Json<Value>> {
    let created = lifecycle::create_item(&**store.inner(), item.into_inner())?;
    Ok(Json(json!({ "success": true, "item": created })))
}

#[derive(FromForm)]
pub struct UploadForm<'f> {
    pub file: Option<TempFile<'f>>,
}

#[post("/portfolio/upload", data = "<form>")]
pub async fn portfolio_upload(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    host: &State<Arc<dyn MediaHost>>,
    form: Form<UploadForm<'_>>,
) -> Result<Json<Value>> {
    let file = match form.file.as_ref() {
        Some(f) if f.len() > 0 => f,
        _ => return Err(AppError::Validation("no file provided".to_string())),
    };

    let max_mb = store.setting_get_i64("uploads_max_mb").max(1) as u64;
    if file.len() > max_mb * 1024 * 1024 {
        return Err(AppError::Validation(format!("file exceeds {} MB", max_mb)));
    }

    let content_type = file
        .content_type()
        .map(|ct| ct.to_string())
        .unwrap_or_default();
    let filename = file.name().unwrap_or("upload").to_string();

    let mut bytes = Vec::with_capacity(file.len() as usize);
    let reader = file
        .open()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?;
    rocket::tokio::pin!(reader);
    reader
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?;

    let item = lifecycle::create_uploaded_item(
        &**store.inner(),
        &**host.inner(),
        bytes,
        &content_type,
        &filename,
    )
    .await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

#[delete("/portfolio/<id>")]
pub fn portfolio_delete(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    id: &str,
) -> Result<Json<Value>> {
    let report = lifecycle::delete_item(&**store.inner(), id)?;
    Ok(Json(json!({
        "success": true,
        "likesMarked": report.likes_marked,
        "sharesMarked": report.shares_marked,
    })))
}

#[post("/sweep")]
pub fn sweep(_admin: AdminUser, store: &State<Arc<dyn Store>>) -> Result<Json<lifecycle::SweepReport>> {
    Ok(Json(lifecycle::sweep_orphans(&**store.inner())?))
}

// ── Analytics ──────────────────────────────────────────

#[get("/likes?<top>&<recent>")]
pub fn likes_report(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    top: Option<i64>,
    recent: Option<i64>,
) -> Result<Json<analytics::KindReport>> {
    let report = analytics::report(
        &**store.inner(),
        EngagementKind::Like,
        analytics::clamp_limit(top, DEFAULT_TOP_LIMIT),
        analytics::clamp_limit(recent, DEFAULT_RECENT_LIMIT),
    )?;
    Ok(Json(report))
}

#[get("/shares?<top>&<recent>")]
pub fn shares_report(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    top: Option<i64>,
    recent: Option<i64>,
) -> Result<Json<analytics::KindReport>> {
    let report = analytics::report(
        &**store.inner(),
        EngagementKind::Share,
        analytics::clamp_limit(top, DEFAULT_TOP_LIMIT),
        analytics::clamp_limit(recent, DEFAULT_RECENT_LIMIT),
    )?;
    Ok(Json(report))
}

#[get("/portfolio/<id>/engagement")]
pub fn item_history(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    id: &str,
) -> Result<Json<analytics::ItemHistory>> {
    Ok(Json(analytics::item_history(&**store.inner(), id)?))
}

#[get("/analytics?<limit>")]
pub fn analytics_overview(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    limit: Option<i64>,
) -> Result<Json<analytics::Overview>> {
    let overview = analytics::overview(
        &**store.inner(),
        analytics::clamp_limit(limit, DEFAULT_TOP_LIMIT),
    )?;
    Ok(Json(overview))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        login,
        logout,
        portfolio_create,
        portfolio_upload,
        portfolio_delete,
        sweep,
        likes_report,
        shares_report,
        item_history,
        analytics_overview
    ]
}
