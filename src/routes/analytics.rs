use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{clamp_or, parse_body, positive_id};
use crate::error::{ApiError, ApiResult};
use crate::security::auth::{ensure_claim, AdminUser, AuthenticatedUser, ClientIp};
use crate::store::Store;

#[derive(Debug, Deserialize)]
struct TrackView {
    post_id: Option<i64>,
    user_id: Option<i64>,
}

#[get("/analytics?<action>&<limit>&<days>&<user_id>")]
pub fn analytics_get(
    store: &State<Arc<dyn Store>>,
    admin: AdminUser,
    action: Option<&str>,
    limit: Option<i64>,
    days: Option<i64>,
    user_id: Option<i64>,
) -> ApiResult<Json<Value>> {
    ensure_claim(user_id, &admin.user)?;

    let data = match action.unwrap_or("") {
        "overview" => json!(store.analytics_overview()?),
        "top_posts" => json!(store.analytics_top_posts(clamp_or(limit, 5, 1, 100))?),
        "engagement" => json!(store.analytics_engagement(30)?),
        "user_growth" => json!(store.analytics_user_growth(clamp_or(days, 30, 1, 365))?),
        _ => return Err(ApiError::invalid("Invalid action")),
    };
    Ok(Json(json!({ "status": "success", "data": data })))
}

/// Public: records one view of a post, attributed to the session user if any.
#[post("/analytics?<action>", data = "<body>")]
pub fn analytics_post(
    store: &State<Arc<dyn Store>>,
    caller: Option<AuthenticatedUser>,
    client_ip: ClientIp,
    action: Option<&str>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    if action != Some("track_view") {
        return Err(ApiError::invalid("Invalid action"));
    }
    let req: TrackView = parse_body(body)?;
    let viewer = match caller {
        Some(c) => {
            ensure_claim(req.user_id, &c.user)?;
            Some(c.user.id)
        }
        None => None,
    };
    let post_id = positive_id(req.post_id, "Invalid post_id")?;
    if !store.post_exists(post_id)? {
        return Err(ApiError::NotFound("Post"));
    }

    store.post_view_record(post_id, viewer, Some(client_ip.0.as_str()))?;
    Ok(Json(json!({ "status": "success", "message": "View tracked" })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![analytics_get, analytics_post]
}
