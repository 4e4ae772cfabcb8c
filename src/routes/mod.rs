pub mod activity;
pub mod analytics;
pub mod auth;
pub mod comments;
pub mod contact;
pub mod online_users;
pub mod posts;
pub mod projects;
pub mod system;
pub mod upload;

use std::time::Duration;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Catcher, Request, Route};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::user::User;
use crate::rate_limit::RateLimiter;
use crate::security::auth::{hash_ip, AuthenticatedUser};

/// Every JSON endpoint. Mounted at both `/` and `/api`.
pub fn routes() -> Vec<Route> {
    [
        system::routes(),
        auth::routes(),
        posts::routes(),
        projects::routes(),
        comments::routes(),
        contact::routes(),
        online_users::routes(),
        upload::routes(),
        analytics::routes(),
        activity::routes(),
    ]
    .concat()
}

/// Answers CORS preflight for any path; the CORS fairing adds the headers.
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::Ok
}

#[catch(default)]
fn json_catcher(status: Status, _req: &Request<'_>) -> (Status, Json<Value>) {
    let message = match status.code {
        400 => "Bad request",
        401 => "Authentication required",
        403 => "Unauthorized",
        404 => "Endpoint not found",
        413 => "Payload too large",
        422 => "Malformed request body",
        429 => "Too many requests. Please wait before trying again.",
        500 => "Internal server error",
        _ => status.reason().unwrap_or("Error"),
    };
    (status, Json(json!({ "status": "error", "message": message })))
}

pub fn catchers() -> Vec<Catcher> {
    catchers![json_catcher]
}

// ── Shared handler helpers ──

/// Deserialize a JSON body into `T`. A missing or unreadable body counts as `{}`.
pub(crate) fn parse_body<T: DeserializeOwned>(body: Option<Json<Value>>) -> ApiResult<T> {
    let value = body.map(Json::into_inner).unwrap_or_else(|| json!({}));
    serde_json::from_value(value).map_err(|e| ApiError::invalid(format!("Invalid request body: {}", e)))
}

pub(crate) fn require_user(auth: Option<AuthenticatedUser>) -> ApiResult<User> {
    auth.map(|a| a.user).ok_or(ApiError::Unauthenticated)
}

/// Admin-only actions answer 403 whether the caller is anonymous or not an admin.
pub(crate) fn require_admin(auth: Option<AuthenticatedUser>) -> ApiResult<User> {
    match auth {
        Some(a) if a.user.is_admin => Ok(a.user),
        _ => Err(ApiError::Unauthorized),
    }
}

pub(crate) fn rate_check(
    limiter: &RateLimiter,
    config: &AppConfig,
    bucket: &str,
    ip: &str,
) -> ApiResult<()> {
    let key = format!("{}:{}", bucket, hash_ip(ip));
    let window = Duration::from_secs(config.rate_limit_window_secs);
    if limiter.check_and_record(&key, config.login_rate_limit.max(1), window) {
        Ok(())
    } else {
        log::warn!("rate limit hit on {}", bucket);
        Err(ApiError::RateLimited)
    }
}

/// `value` or `default`, clamped into `min..=max`.
pub(crate) fn clamp_or(value: Option<i64>, default: i64, min: i64, max: i64) -> i64 {
    value.unwrap_or(default).clamp(min, max)
}

/// A strictly positive id, or `InvalidInput` with `message`.
pub(crate) fn positive_id(value: Option<i64>, message: &str) -> ApiResult<i64> {
    match value {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_or_applies_default_and_bounds() {
        assert_eq!(clamp_or(None, 50, 1, 500), 50);
        assert_eq!(clamp_or(Some(0), 50, 1, 500), 1);
        assert_eq!(clamp_or(Some(10_000), 50, 1, 500), 500);
        assert_eq!(clamp_or(Some(-3), 0, 0, i64::MAX), 0);
    }

    #[test]
    fn positive_id_rejects_zero_and_missing() {
        assert_eq!(positive_id(Some(4), "bad").unwrap(), 4);
        assert!(positive_id(Some(0), "bad").is_err());
        assert!(positive_id(None, "bad").is_err());
    }
}
