use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_body, positive_id, require_admin, require_user};
use crate::audit::{self, actions};
use crate::error::{ApiError, ApiResult};
use crate::models::activity::NewActivity;
use crate::models::post::PostForm;
use crate::security::auth::{ensure_claim, AuthenticatedUser, ClientIp};
use crate::store::Store;

#[derive(Debug, Deserialize)]
struct LikeRequest {
    post_id: Option<i64>,
    user_id: Option<i64>,
}

/// Post body plus the legacy `author_id` claim.
#[derive(Debug, Deserialize)]
struct PostPayload {
    #[serde(flatten)]
    form: PostForm,
    author_id: Option<i64>,
}

fn existing_post(store: &dyn Store, post_id: Option<i64>) -> ApiResult<i64> {
    let id = positive_id(post_id, "Invalid post_id or user_id")?;
    if !store.post_exists(id)? {
        return Err(ApiError::NotFound("Post"));
    }
    Ok(id)
}

// ── GET /posts ──

#[get("/posts?<id>&<action>&<post_id>&<user_id>")]
pub fn posts_get(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    id: Option<i64>,
    action: Option<&str>,
    post_id: Option<i64>,
    user_id: Option<i64>,
) -> ApiResult<Json<Value>> {
    if action == Some("check_like") {
        let user = require_user(caller)?;
        ensure_claim(user_id, &user)?;
        let post_id = positive_id(post_id, "Invalid parameters")?;
        let liked = store.like_exists(post_id, user.id)?;
        return Ok(Json(json!({ "status": "success", "liked": liked })));
    }

    match id {
        Some(id) => {
            let is_admin = caller.as_ref().map(|c| c.user.is_admin).unwrap_or(false);
            let post = store
                .post_detail(id, is_admin)?
                .ok_or(ApiError::NotFound("Post"))?;
            Ok(Json(json!({ "status": "success", "data": post })))
        }
        None => {
            let posts = store.post_list()?;
            Ok(Json(json!({ "status": "success", "data": posts })))
        }
    }
}

// ── POST /posts ──

#[post("/posts?<action>", data = "<body>")]
pub fn posts_post(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    client_ip: ClientIp,
    action: Option<&str>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let store = store.inner().as_ref();

    if action == Some("like") {
        let user = require_user(caller)?;
        let req: LikeRequest = parse_body(body)?;
        ensure_claim(req.user_id, &user)?;
        let post_id = existing_post(store, req.post_id)?;
        let added = store.like_add(post_id, user.id)?;
        let likes = store.like_count(post_id)?;
        return Ok(Json(json!({
            "status": "success",
            "message": "Liked",
            "added": added,
            "likes": likes,
        })));
    }

    let admin = require_admin(caller)?;
    let payload: PostPayload = parse_body(body)?;
    ensure_claim(payload.author_id, &admin)?;
    payload.form.validate().map_err(ApiError::InvalidInput)?;

    let post_id = store.post_create(&payload.form, admin.id)?;

    let details = format!("Created post: {}", payload.form.title.trim());
    audit::record(
        store,
        NewActivity {
            user_id: Some(admin.id),
            action: actions::CREATE,
            entity_type: Some("post"),
            entity_id: Some(post_id),
            details: Some(details.as_str()),
            ip_address: Some(client_ip.0.as_str()),
        },
    );
    Ok(Json(json!({
        "status": "success",
        "message": "Post created successfully",
        "post_id": post_id,
    })))
}

// ── PUT /posts ──

#[put("/posts?<id>", data = "<body>")]
pub fn posts_put(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    client_ip: ClientIp,
    id: Option<i64>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let admin = require_admin(caller)?;
    let id = positive_id(id, "Invalid post ID")?;
    let form: PostForm = parse_body(body)?;
    form.validate().map_err(ApiError::InvalidInput)?;

    store.post_update(id, &form)?;

    let details = format!("Updated post: {}", form.title.trim());
    audit::record(
        store.inner().as_ref(),
        NewActivity {
            user_id: Some(admin.id),
            action: actions::UPDATE,
            entity_type: Some("post"),
            entity_id: Some(id),
            details: Some(details.as_str()),
            ip_address: Some(client_ip.0.as_str()),
        },
    );
    Ok(Json(json!({ "status": "success", "message": "Post updated successfully" })))
}

// ── DELETE /posts ──

#[delete("/posts?<id>&<action>&<post_id>&<user_id>")]
pub fn posts_delete(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    client_ip: ClientIp,
    id: Option<i64>,
    action: Option<&str>,
    post_id: Option<i64>,
    user_id: Option<i64>,
) -> ApiResult<Json<Value>> {
    let store = store.inner().as_ref();

    if action == Some("like") {
        let user = require_user(caller)?;
        ensure_claim(user_id, &user)?;
        let post_id = positive_id(post_id, "Invalid post_id or user_id")?;
        let removed = store.like_remove(post_id, user.id)?;
        let likes = store.like_count(post_id)?;
        return Ok(Json(json!({
            "status": "success",
            "message": "Unliked",
            "removed": removed,
            "likes": likes,
        })));
    }

    let admin = require_admin(caller)?;
    let id = positive_id(id, "Invalid post ID")?;
    let title = store.post_find_by_id(id)?.map(|p| p.title);

    store.post_delete(id)?;

    let details = format!("Deleted post: {}", title.as_deref().unwrap_or("(untitled)"));
    audit::record(
        store,
        NewActivity {
            user_id: Some(admin.id),
            action: actions::DELETE,
            entity_type: Some("post"),
            entity_id: Some(id),
            details: Some(details.as_str()),
            ip_address: Some(client_ip.0.as_str()),
        },
    );
    Ok(Json(json!({ "status": "success", "message": "Post deleted successfully" })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![posts_get, posts_post, posts_put, posts_delete]
}
