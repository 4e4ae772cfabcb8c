use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::error::ApiResult;
use crate::store::Store;

/// Users seen within the configured window.
#[get("/online_users")]
pub fn online_users(
    store: &State<Arc<dyn Store>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<Value>> {
    let users = store.user_list_online(config.online_window_minutes)?;
    Ok(Json(json!({ "status": "success", "users": users })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![online_users]
}
