use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_body, positive_id, rate_check, require_admin, require_user};
use crate::audit::{self, actions};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::activity::NewActivity;
use crate::rate_limit::RateLimiter;
use crate::security::auth::{
    self, ensure_claim, AuthenticatedUser, BearerToken, ClientIp, UserAgent,
};
use crate::store::Store;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// `is_admin` from the client is deliberately not a field here.
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct AdminChange {
    target_user_id: Option<i64>,
    requesting_user_id: Option<i64>,
}

// ── GET /auth ──

#[get("/auth?<action>&<user_id>&<requesting_user_id>")]
pub fn auth_get(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    action: Option<&str>,
    user_id: Option<i64>,
    requesting_user_id: Option<i64>,
) -> ApiResult<Json<Value>> {
    match action.unwrap_or("") {
        "me" => {
            let user = require_user(caller)?;
            Ok(Json(json!({ "status": "success", "user": user })))
        }
        "users" => {
            let admin = require_admin(caller)?;
            ensure_claim(requesting_user_id.or(user_id), &admin)?;
            let users = store.user_list_all()?;
            Ok(Json(json!({ "status": "success", "users": users })))
        }
        _ => Err(ApiError::invalid("Invalid action")),
    }
}

// ── POST /auth ──

#[allow(clippy::too_many_arguments)]
#[post("/auth?<action>", data = "<body>")]
pub fn auth_post(
    store: &State<Arc<dyn Store>>,
    config: &State<AppConfig>,
    limiter: &State<RateLimiter>,
    caller: Option<AuthenticatedUser>,
    token: Option<BearerToken>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    action: Option<&str>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let store = store.inner().as_ref();
    let ip = client_ip.0.as_str();

    match action.unwrap_or("") {
        "login" => {
            rate_check(limiter, config, "login", ip)?;
            let req: LoginRequest = parse_body(body)?;
            login(store, config, req, ip, user_agent.0.as_deref())
        }
        "register" => {
            rate_check(limiter, config, "register", ip)?;
            let req: RegisterRequest = parse_body(body)?;
            register(store, config, req, ip)
        }
        "logout" => {
            let user = require_user(caller)?;
            if let Some(BearerToken(t)) = token {
                auth::destroy_session(store, &t)?;
            }
            audit::record(
                store,
                NewActivity {
                    user_id: Some(user.id),
                    action: actions::LOGOUT,
                    entity_type: Some("user"),
                    entity_id: Some(user.id),
                    ip_address: Some(ip),
                    ..Default::default()
                },
            );
            Ok(Json(json!({ "status": "success", "message": "Logged out" })))
        }
        "make_admin" | "revoke_admin" => {
            let grant = action == Some("make_admin");
            let admin = require_admin(caller)?;
            let req: AdminChange = parse_body(body)?;
            ensure_claim(req.requesting_user_id, &admin)?;
            let target = positive_id(req.target_user_id, "Missing or invalid target_user_id")?;

            store.user_set_admin(target, grant)?;

            let (act, message) = if grant {
                (actions::GRANT_ADMIN, "User has been made admin")
            } else {
                (actions::REVOKE_ADMIN, "Admin privileges revoked")
            };
            audit::record(
                store,
                NewActivity {
                    user_id: Some(admin.id),
                    action: act,
                    entity_type: Some("user"),
                    entity_id: Some(target),
                    ip_address: Some(ip),
                    ..Default::default()
                },
            );
            Ok(Json(json!({ "status": "success", "message": message })))
        }
        _ => Err(ApiError::invalid("Invalid action")),
    }
}

fn login(
    store: &dyn Store,
    config: &AppConfig,
    req: LoginRequest,
    ip: &str,
    ua: Option<&str>,
) -> ApiResult<Json<Value>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::invalid("Username and password are required"));
    }
    let user = match store.user_get_by_username(req.username.trim())? {
        Some(u) if auth::verify_password(&req.password, &u.password_hash) => u,
        _ => return Err(ApiError::InvalidCredentials),
    };

    let session = auth::create_session(store, user.id, config.session_expiry_hours, Some(ip), ua)?;
    store.user_touch_last_active(user.id)?;
    audit::record(
        store,
        NewActivity {
            user_id: Some(user.id),
            action: actions::LOGIN,
            entity_type: Some("user"),
            entity_id: Some(user.id),
            ip_address: Some(ip),
            ..Default::default()
        },
    );
    log::info!("user {} logged in", user.id);

    Ok(Json(json!({
        "status": "success",
        "user": user,
        "token": session.token,
        "expires_at": session.expires_at,
    })))
}

fn register(
    store: &dyn Store,
    config: &AppConfig,
    req: RegisterRequest,
    ip: &str,
) -> ApiResult<Json<Value>> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::invalid("Username, email and password are required"));
    }
    if !auth::is_valid_email(email) {
        return Err(ApiError::invalid("Invalid email address"));
    }
    if req.password.chars().count() < 6 {
        return Err(ApiError::invalid("Password must be at least 6 characters"));
    }

    let hash = auth::hash_password(&req.password, config.bcrypt_cost)?;
    let registered = store.user_register(username, email, &hash)?;

    audit::record(
        store,
        NewActivity {
            user_id: Some(registered.id),
            action: actions::REGISTER,
            entity_type: Some("user"),
            entity_id: Some(registered.id),
            ip_address: Some(ip),
            ..Default::default()
        },
    );
    if registered.is_admin {
        log::info!("first account {} registered as admin", registered.id);
    }

    Ok(Json(json!({
        "status": "success",
        "message": "User registered",
        "user_id": registered.id,
        "is_admin": registered.is_admin,
    })))
}

// ── DELETE /auth ──

#[delete("/auth?<action>&<user_id>&<requesting_user_id>")]
pub fn auth_delete(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    client_ip: ClientIp,
    action: Option<&str>,
    user_id: Option<i64>,
    requesting_user_id: Option<i64>,
) -> ApiResult<Json<Value>> {
    if action != Some("delete_user") {
        return Err(ApiError::invalid("Invalid action"));
    }
    let admin = require_admin(caller)?;
    ensure_claim(requesting_user_id, &admin)?;
    let target = positive_id(user_id, "Missing or invalid user_id")?;

    store.user_delete(target)?;

    let details = format!("Deleted user #{}", target);
    audit::record(
        store.inner().as_ref(),
        NewActivity {
            user_id: Some(admin.id),
            action: actions::DELETE,
            entity_type: Some("user"),
            entity_id: Some(target),
            details: Some(details.as_str()),
            ip_address: Some(client_ip.0.as_str()),
        },
    );
    Ok(Json(json!({ "status": "success", "message": "User deleted" })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![auth_get, auth_post, auth_delete]
}
