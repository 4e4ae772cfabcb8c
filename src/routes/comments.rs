use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_body, positive_id, require_user};
use crate::audit::{self, actions};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::activity::NewActivity;
use crate::models::comment::{Comment, CommentFilter, CommentStatus, StatusCounts};
use crate::models::user::User;
use crate::moderation;
use crate::security::auth::{ensure_claim, AuthenticatedUser, ClientIp};
use crate::store::Store;

#[derive(Debug, FromForm)]
pub struct CommentQuery<'r> {
    #[field(name = "postId")]
    #[field(name = "post_id")]
    post_id: Option<i64>,
    status: Option<&'r str>,
    user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct NewComment {
    #[serde(rename = "postId", alias = "post_id")]
    post_id: Option<i64>,
    user_id: Option<i64>,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct ModerateRequest {
    id: Option<i64>,
    user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BulkRequest {
    #[serde(default)]
    ids: Vec<i64>,
    user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct EditComment {
    id: Option<i64>,
    user_id: Option<i64>,
    #[serde(default)]
    comment: String,
}

/// The caller's id after checking any legacy `user_id` claim against it.
fn acting_id(caller: &Option<AuthenticatedUser>, claimed: Option<i64>) -> ApiResult<Option<i64>> {
    match caller {
        Some(c) => {
            ensure_claim(claimed, &c.user)?;
            Ok(Some(c.user.id))
        }
        None => Ok(None),
    }
}

/// Authors may edit or delete their own comments; admins any comment.
fn owned_comment(store: &dyn Store, user: &User, id: i64) -> ApiResult<Comment> {
    let comment = store
        .comment_find_by_id(id)?
        .ok_or(ApiError::NotFound("Comment"))?;
    if comment.user_id != user.id && !user.is_admin {
        return Err(ApiError::Unauthorized);
    }
    Ok(comment)
}

// ── GET /comments ──

/// Admins may filter by any status and get per-status counts. Everyone
/// else only ever sees approved comments, with zeroed counts.
#[get("/comments?<query..>")]
pub fn comments_get(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    query: CommentQuery<'_>,
) -> ApiResult<Json<Value>> {
    acting_id(&caller, query.user_id)?;
    let is_admin = caller.as_ref().map(|c| c.user.is_admin).unwrap_or(false);

    let requested = match query.status.filter(|s| !s.is_empty()) {
        Some(s) => Some(s.parse::<CommentStatus>().map_err(ApiError::InvalidInput)?),
        None => None,
    };
    let filter = CommentFilter {
        post_id: query.post_id,
        status: if is_admin { requested } else { Some(CommentStatus::Approved) },
    };

    let comments = store.comment_list(&filter)?;
    let counts = if is_admin {
        store.comment_counts()?
    } else {
        StatusCounts::default()
    };
    Ok(Json(json!({ "status": "success", "data": comments, "counts": counts })))
}

// ── POST /comments ──

#[allow(clippy::too_many_arguments)]
#[post("/comments?<action>&<bulk_action>", data = "<body>")]
pub fn comments_post(
    store: &State<Arc<dyn Store>>,
    config: &State<AppConfig>,
    caller: Option<AuthenticatedUser>,
    client_ip: ClientIp,
    action: Option<&str>,
    bulk_action: Option<&str>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let store = store.inner().as_ref();
    let ip = Some(client_ip.0.as_str());

    if let Some(action) = action {
        let req: ModerateRequest = parse_body(body)?;
        let actor = acting_id(&caller, req.user_id)?;
        let status = moderation::moderate(store, actor, req.id.unwrap_or(0), action, ip)?;
        return Ok(Json(json!({
            "status": "success",
            "message": format!("Comment status updated to {}", status),
            "comment_status": status,
        })));
    }

    if let Some(bulk_action) = bulk_action {
        let req: BulkRequest = parse_body(body)?;
        let actor = acting_id(&caller, req.user_id)?;
        let affected = moderation::bulk_moderate(store, actor, &req.ids, bulk_action, ip)?;
        return Ok(Json(json!({
            "status": "success",
            "message": "Bulk action completed",
            "affected": affected,
        })));
    }

    let user = require_user(caller)?;
    let req: NewComment = parse_body(body)?;
    ensure_claim(req.user_id, &user)?;
    let text = req.comment.trim();
    let post_id = match req.post_id {
        Some(id) if id > 0 && !text.is_empty() => id,
        _ => return Err(ApiError::invalid("Missing or invalid post_id, user_id, or comment.")),
    };
    if !store.post_exists(post_id)? {
        return Err(ApiError::NotFound("Post"));
    }

    let status = config.comment_default_status;
    let id = store.comment_create(post_id, user.id, text, status)?;

    let details = format!("Commented on post #{}", post_id);
    audit::record(
        store,
        NewActivity {
            user_id: Some(user.id),
            action: actions::CREATE,
            entity_type: Some("comment"),
            entity_id: Some(id),
            details: Some(details.as_str()),
            ip_address: ip,
        },
    );
    Ok(Json(json!({
        "status": "success",
        "message": "Comment added",
        "comment_id": id,
        "comment_status": status,
    })))
}

// ── PUT /comments ──

#[put("/comments", data = "<body>")]
pub fn comments_put(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    client_ip: ClientIp,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let store = store.inner().as_ref();
    let user = require_user(caller)?;
    let req: EditComment = parse_body(body)?;
    ensure_claim(req.user_id, &user)?;
    let text = req.comment.trim();
    let id = match req.id {
        Some(id) if id > 0 && !text.is_empty() => id,
        _ => return Err(ApiError::invalid("Missing or invalid comment id or comment.")),
    };
    owned_comment(store, &user, id)?;

    store.comment_update_body(id, text)?;

    audit::record(
        store,
        NewActivity {
            user_id: Some(user.id),
            action: actions::UPDATE,
            entity_type: Some("comment"),
            entity_id: Some(id),
            ip_address: Some(client_ip.0.as_str()),
            ..Default::default()
        },
    );
    Ok(Json(json!({ "status": "success", "message": "Comment updated" })))
}

// ── DELETE /comments ──

#[delete("/comments?<id>&<user_id>")]
pub fn comments_delete(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    client_ip: ClientIp,
    id: Option<i64>,
    user_id: Option<i64>,
) -> ApiResult<Json<Value>> {
    let store = store.inner().as_ref();
    let user = require_user(caller)?;
    ensure_claim(user_id, &user)?;
    let id = positive_id(id, "Missing or invalid comment id.")?;
    let comment = owned_comment(store, &user, id)?;

    store.comment_delete(id)?;

    let details = format!("Deleted comment on post #{}", comment.post_id);
    audit::record(
        store,
        NewActivity {
            user_id: Some(user.id),
            action: actions::DELETE,
            entity_type: Some("comment"),
            entity_id: Some(id),
            details: Some(details.as_str()),
            ip_address: Some(client_ip.0.as_str()),
        },
    );
    Ok(Json(json!({ "status": "success", "message": "Comment deleted" })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![comments_get, comments_post, comments_put, comments_delete]
}
