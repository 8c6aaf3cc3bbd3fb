use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{ClientIp, UserAgent};
use crate::engagement::{self, LikeState, ShareCount};
use crate::error::Result;
use crate::lifecycle;
use crate::models::portfolio::PortfolioItem;
use crate::store::Store;

// ── Gallery ────────────────────────────────────────────

#[get("/portfolio")]
pub fn portfolio_list(store: &State<Arc<dyn Store>>) -> Result<Json<Value>> {
    let items = lifecycle::list_items(&**store.inner())?;
    Ok(Json(json!({ "items": items })))
}

#[get("/portfolio/<id>")]
pub fn portfolio_get(store: &State<Arc<dyn Store>>, id: &str) -> Result<Json<PortfolioItem>> {
    Ok(Json(lifecycle::get_item(&**store.inner(), id)?))
}

// ── Likes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub state: LikeState,
}

#[get("/portfolio/<id>/likes")]
pub fn like_status(
    store: &State<Arc<dyn Store>>,
    id: &str,
    client_ip: ClientIp,
) -> Result<Json<LikeState>> {
    let state = engagement::get_like_state(&**store.inner(), id, &client_ip.actor())?;
    Ok(Json(state))
}

#[post("/portfolio/<id>/likes", format = "json", data = "<body>")]
pub fn like_toggle(
    store: &State<Arc<dyn Store>>,
    id: &str,
    client_ip: ClientIp,
    user_agent: UserAgent,
    body: Json<LikeRequest>,
) -> Result<Json<LikeResponse>> {
    let action = engagement::parse_action(body.action.as_deref())?;
    let state = engagement::toggle_like(
        &**store.inner(),
        id,
        &client_ip.actor(),
        user_agent.0.as_deref(),
        action,
    )?;
    Ok(Json(LikeResponse {
        success: true,
        state,
    }))
}

// ── Shares ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub method: Option<String>,
}

#[get("/portfolio/<id>/shares")]
pub fn share_count(store: &State<Arc<dyn Store>>, id: &str) -> Result<Json<ShareCount>> {
    Ok(Json(engagement::get_share_count(&**store.inner(), id)?))
}

/// A missing or unparsable body counts as a "copy" share.
#[post("/portfolio/<id>/shares", data = "<body>")]
pub fn share_record(
    store: &State<Arc<dyn Store>>,
    id: &str,
    client_ip: ClientIp,
    user_agent: UserAgent,
    body: Option<Json<ShareRequest>>,
) -> Result<Json<Value>> {
    let raw = body.as_ref().and_then(|b| b.method.as_deref());
    let method = engagement::parse_method(raw)?;
    engagement::record_share(
        &**store.inner(),
        id,
        &client_ip.actor(),
        user_agent.0.as_deref(),
        method,
    )?;
    Ok(Json(json!({ "success": true })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        portfolio_list,
        portfolio_get,
        like_status,
        like_toggle,
        share_count,
        share_record
    ]
}
