use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use super::{parse_body, positive_id};
use crate::audit::{self, actions};
use crate::error::{ApiError, ApiResult};
use crate::models::activity::NewActivity;
use crate::models::project::ProjectForm;
use crate::security::auth::{AdminUser, ClientIp};
use crate::store::Store;

#[get("/projects?<id>")]
pub fn projects_get(store: &State<Arc<dyn Store>>, id: Option<i64>) -> ApiResult<Json<Value>> {
    match id {
        Some(id) => {
            let project = store
                .project_find_by_id(id)?
                .ok_or(ApiError::NotFound("Project"))?;
            Ok(Json(json!({ "status": "success", "data": project })))
        }
        None => {
            let projects = store.project_list()?;
            Ok(Json(json!({ "status": "success", "data": projects })))
        }
    }
}

#[post("/projects", data = "<body>")]
pub fn projects_post(
    store: &State<Arc<dyn Store>>,
    admin: AdminUser,
    client_ip: ClientIp,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let form: ProjectForm = parse_body(body)?;
    form.validate().map_err(ApiError::InvalidInput)?;

    let id = store.project_create(&form)?;

    log_change(store, &admin, &client_ip, actions::CREATE, id, &form.title);
    Ok(Json(json!({
        "status": "success",
        "message": "Project created successfully",
        "project_id": id,
    })))
}

#[put("/projects?<id>", data = "<body>")]
pub fn projects_put(
    store: &State<Arc<dyn Store>>,
    admin: AdminUser,
    client_ip: ClientIp,
    id: Option<i64>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let id = positive_id(id, "Invalid project ID")?;
    let form: ProjectForm = parse_body(body)?;
    form.validate().map_err(ApiError::InvalidInput)?;

    store.project_update(id, &form)?;

    log_change(store, &admin, &client_ip, actions::UPDATE, id, &form.title);
    Ok(Json(json!({ "status": "success", "message": "Project updated successfully" })))
}

#[delete("/projects?<id>")]
pub fn projects_delete(
    store: &State<Arc<dyn Store>>,
    admin: AdminUser,
    client_ip: ClientIp,
    id: Option<i64>,
) -> ApiResult<Json<Value>> {
    let id = positive_id(id, "Invalid project ID")?;
    let title = store
        .project_find_by_id(id)?
        .map(|p| p.title)
        .unwrap_or_default();

    store.project_delete(id)?;

    log_change(store, &admin, &client_ip, actions::DELETE, id, &title);
    Ok(Json(json!({ "status": "success", "message": "Project deleted successfully" })))
}

fn log_change(
    store: &State<Arc<dyn Store>>,
    admin: &AdminUser,
    client_ip: &ClientIp,
    action: &str,
    id: i64,
    title: &str,
) {
    let verb = match action {
        actions::CREATE => "Created",
        actions::UPDATE => "Updated",
        _ => "Deleted",
    };
    let details = format!("{} project: {}", verb, title.trim());
    audit::record(
        store.inner().as_ref(),
        NewActivity {
            user_id: Some(admin.user.id),
            action,
            entity_type: Some("project"),
            entity_id: Some(id),
            details: Some(details.as_str()),
            ip_address: Some(client_ip.0.as_str()),
        },
    );
}

pub fn routes() -> Vec<rocket::Route> {
    routes![projects_get, projects_post, projects_put, projects_delete]
}
