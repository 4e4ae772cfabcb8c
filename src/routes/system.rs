use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::store::Store;

#[get("/")]
pub fn index() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Portfolio API v1.0",
        "endpoints": {
            "auth": "/auth",
            "posts": "/posts",
            "projects": "/projects",
            "comments": "/comments",
            "contact": "/contact",
            "online_users": "/online_users",
            "upload": "/upload",
            "analytics": "/analytics",
            "activity": "/activity",
        }
    }))
}

#[get("/test")]
pub fn test() -> Json<Value> {
    Json(json!({ "status": "success", "message": "API is working!" }))
}

#[get("/testdb")]
pub fn testdb(store: &State<Arc<dyn Store>>) -> ApiResult<Json<Value>> {
    let version = store.server_info()?;
    Ok(Json(json!({
        "status": "success",
        "message": "Database connection successful",
        "database": format!("SQLite {}", version),
    })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![index, test, testdb]
}
