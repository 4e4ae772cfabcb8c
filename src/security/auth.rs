use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use regex::Regex;
use rocket::http::{HeaderMap, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult, StoreResult};
use crate::models::user::User;
use crate::store::Store;

// ── Client IP request guard ──

/// The client address used for rate limiting and audit rows.
///
/// Forwarding headers are only honoured when `trusted_proxy` is set, since
/// any client can send them. Otherwise the socket peer address is used.
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let trusted_proxy = request
            .rocket()
            .state::<AppConfig>()
            .map(|c| c.trusted_proxy)
            .unwrap_or(false);

        if trusted_proxy {
            if let Some(ip) = forwarded_ip(request.headers()) {
                return Outcome::Success(ClientIp(ip));
            }
        }

        let ip = request
            .remote()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

/// Client address as reported by a reverse proxy, in priority order:
/// CF-Connecting-IP, True-Client-IP, X-Real-IP, then the first
/// X-Forwarded-For entry.
fn forwarded_ip(headers: &HeaderMap<'_>) -> Option<String> {
    ["CF-Connecting-IP", "True-Client-IP", "X-Real-IP"]
        .into_iter()
        .filter_map(|name| headers.get_one(name))
        .chain(
            headers
                .get_one("X-Forwarded-For")
                .and_then(|v| v.split(',').next()),
        )
        .map(str::trim)
        .find(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// The request's User-Agent header, if any.
pub struct UserAgent(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserAgent {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(UserAgent(
            request.headers().get_one("User-Agent").map(str::to_string),
        ))
    }
}

// ── Bearer token ──

/// The raw bearer token presented by the client.
pub struct BearerToken(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match bearer_token(request) {
            Some(t) => Outcome::Success(BearerToken(t)),
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

fn bearer_token(request: &Request<'_>) -> Option<String> {
    let header = request.headers().get_one("Authorization")?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// ── Authenticated user guard ──

/// Guard: any user holding an unexpired session token.
pub struct AuthenticatedUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_session_user(request).await {
            Some(user) => Outcome::Success(AuthenticatedUser { user }),
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

/// Guard: session user with admin rights. Every failure is a 403.
pub struct AdminUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_session_user(request).await {
            Some(user) if user.is_admin => Outcome::Success(AdminUser { user }),
            _ => Outcome::Error((Status::Forbidden, ())),
        }
    }
}

// ── Shared session resolution ──

async fn resolve_session_user(request: &Request<'_>) -> Option<User> {
    let store = request
        .guard::<&State<Arc<dyn Store>>>()
        .await
        .succeeded()?;
    let token = bearer_token(request)?;

    match store.session_user(&hash_token(&token)) {
        Ok(Some(user)) => {
            if let Err(e) = store.user_touch_last_active(user.id) {
                log::warn!("last_active update failed for user {}: {}", user.id, e);
            }
            Some(user)
        }
        Ok(None) => None,
        Err(e) => {
            log::error!("session lookup failed: {}", e);
            None
        }
    }
}

/// Legacy clients send the acting user's id alongside the request. When
/// present it must name the session user.
pub fn ensure_claim(claimed: Option<i64>, user: &User) -> ApiResult<()> {
    match claimed {
        Some(id) if id != user.id => Err(ApiError::Unauthorized),
        _ => Ok(()),
    }
}

/// Re-check admin rights for `actor_id` against the store.
pub fn authorize_admin(store: &dyn Store, actor_id: i64) -> ApiResult<User> {
    match store.user_get_by_id(actor_id)? {
        Some(user) if user.is_admin => Ok(user),
        _ => Err(ApiError::Unauthorized),
    }
}

// ── Password utilities ──

pub fn hash_password(password: &str, cost: u32) -> ApiResult<String> {
    bcrypt::hash(password, cost).map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// ── Session management ──

/// A freshly issued session: the token goes to the client, only its hash is stored.
pub struct IssuedSession {
    pub token: String,
    pub expires_at: String,
}

pub fn create_session(
    store: &dyn Store,
    user_id: i64,
    expiry_hours: i64,
    ip: Option<&str>,
    ua: Option<&str>,
) -> StoreResult<IssuedSession> {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let expires = Utc::now().naive_utc() + Duration::hours(expiry_hours.max(1));
    let expires_at = expires.format("%Y-%m-%d %H:%M:%S").to_string();

    store.session_create(&hash_token(&token), user_id, &expires_at, ip, ua)?;

    Ok(IssuedSession { token, expires_at })
}

pub fn destroy_session(store: &dyn Store, token: &str) -> StoreResult<()> {
    store.session_delete(&hash_token(token))
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn hash_ip(ip: &str) -> String {
    hash_token(ip)
}

// ── Input checks ──

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable_hex() {
        let h = hash_token("abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_token("abc"));
        assert_ne!(h, hash_token("abd"));
    }

    #[test]
    fn forwarded_ip_prefers_proxy_headers_in_order() {
        use rocket::http::Header;

        let mut headers = HeaderMap::new();
        assert_eq!(forwarded_ip(&headers), None);

        headers.add(Header::new("X-Forwarded-For", " 203.0.113.9 , 10.0.0.1"));
        assert_eq!(forwarded_ip(&headers).as_deref(), Some("203.0.113.9"));

        headers.add(Header::new("X-Real-IP", "198.51.100.2"));
        assert_eq!(forwarded_ip(&headers).as_deref(), Some("198.51.100.2"));

        headers.add(Header::new("CF-Connecting-IP", "192.0.2.7"));
        assert_eq!(forwarded_ip(&headers).as_deref(), Some("192.0.2.7"));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn password_round_trip() {
        let h = hash_password("secret1", 4).unwrap();
        assert!(verify_password("secret1", &h));
        assert!(!verify_password("secret2", &h));
        assert!(!verify_password("secret1", "not-a-hash"));
    }

    fn user(id: i64) -> User {
        let now = Utc::now().naive_utc();
        User {
            id,
            username: "u".into(),
            email: "u@example.com".into(),
            password_hash: String::new(),
            is_admin: false,
            created_at: now,
            last_active: now,
        }
    }

    #[test]
    fn claim_must_match_session_user() {
        let u = user(3);
        assert!(ensure_claim(None, &u).is_ok());
        assert!(ensure_claim(Some(3), &u).is_ok());
        assert!(matches!(ensure_claim(Some(4), &u), Err(ApiError::Unauthorized)));
    }
}
