use std::sync::Arc;

use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::store::Store;

pub const SESSION_COOKIE: &str = "showcase_session";

// ── Client IP request guard ──

/// Extracts the real client IP from the request.
/// Checks headers in priority order:
///   1. CF-Connecting-IP (Cloudflare)
///   2. True-Client-IP (Cloudflare Enterprise / Akamai)
///   3. X-Real-IP (nginx proxy_set_header)
///   4. X-Forwarded-For (first IP in the chain = original client)
///   5. Rocket's client_ip() (socket peer address)
pub struct ClientIp(pub String);

impl ClientIp {
    /// Coarse actor identity used for like/share attribution.
    pub fn actor(&self) -> String {
        hash_ip(&self.0)
    }
}

fn header_ip(request: &Request<'_>, name: &str) -> Option<String> {
    let value = request.headers().get_one(name)?;
    let ip = value.split(',').next()?.trim();
    if ip.is_empty() {
        None
    } else {
        Some(ip.to_string())
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ip = ["CF-Connecting-IP", "True-Client-IP", "X-Real-IP", "X-Forwarded-For"]
            .iter()
            .find_map(|h| header_ip(request, h))
            .or_else(|| request.client_ip().map(|ip| ip.to_string()))
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

/// User-Agent header, kept for diagnostics only.
pub struct UserAgent(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserAgent {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ua = request
            .headers()
            .get_one("User-Agent")
            .map(|s| s.chars().take(512).collect());
        Outcome::Success(UserAgent(ua))
    }
}

// ── Admin guard ──

/// Guard that ensures the request is from an authenticated admin
pub struct AdminUser;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let store = match request.guard::<&State<Arc<dyn Store>>>().await {
            Outcome::Success(s) => s,
            _ => return Outcome::Error((Status::Unauthorized, ())),
        };

        let cookies = request.cookies();
        let session_id = match cookies.get_private(SESSION_COOKIE) {
            Some(c) => c.value().to_string(),
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        if store.session_validate(&session_id) {
            Outcome::Success(AdminUser)
        } else {
            cookies.remove_private(Cookie::from(SESSION_COOKIE));
            Outcome::Error((Status::Unauthorized, ()))
        }
    }
}

// ── Password utilities ──

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Check the admin credentials and open a session. Returns the session id.
pub fn login(
    store: &dyn Store,
    username: &str,
    password: &str,
    ip: &str,
    user_agent: Option<&str>,
) -> Result<String> {
    let expected_user = store.setting_get_or("admin_username", "admin");
    let stored_hash = store.setting_get("admin_password_hash").unwrap_or_default();

    // Always run bcrypt so a wrong username costs the same as a wrong password
    let password_ok = verify_password(password, &stored_hash);
    if username != expected_user || !password_ok {
        log::warn!("Failed admin login attempt");
        return Err(AppError::Unauthorized);
    }

    let expiry_hours = store.setting_get_i64("session_expiry_hours").max(1);
    let ip_hash = hash_ip(ip);
    store.session_create(expiry_hours, Some(&ip_hash), user_agent)
}

// ── Session cookie ──

pub fn set_session_cookie(cookies: &CookieJar<'_>, session_id: &str, secure: bool) {
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    if secure {
        cookie.set_secure(true);
    }
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

pub fn hash_ip(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ip_is_deterministic_and_opaque() {
        let a = hash_ip("203.0.113.7");
        assert_eq!(a, hash_ip("203.0.113.7"));
        assert_ne!(a, hash_ip("203.0.113.8"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn verify_password_roundtrip() {
        let hash = bcrypt::hash("s3cret", 4).unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }
}
