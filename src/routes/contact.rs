use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use super::{parse_body, rate_check};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::contact::ContactForm;
use crate::rate_limit::RateLimiter;
use crate::security::auth::{is_valid_email, AdminUser, ClientIp};
use crate::store::Store;

#[get("/contact")]
pub fn contact_list(store: &State<Arc<dyn Store>>, _admin: AdminUser) -> ApiResult<Json<Value>> {
    let messages = store.contact_list()?;
    Ok(Json(json!({ "status": "success", "data": messages })))
}

#[post("/contact", data = "<body>")]
pub fn contact_submit(
    store: &State<Arc<dyn Store>>,
    config: &State<AppConfig>,
    limiter: &State<RateLimiter>,
    client_ip: ClientIp,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    rate_check(limiter, config, "contact", &client_ip.0)?;
    let form: ContactForm = parse_body(body)?;
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.message.trim().is_empty() {
        return Err(ApiError::invalid("Name, email, and message are required"));
    }
    if !is_valid_email(form.email.trim()) {
        return Err(ApiError::invalid("Invalid email address"));
    }

    let id = store.contact_create(&form)?;
    log::info!("contact message {} received", id);
    Ok(Json(json!({ "status": "success", "message": "Message sent successfully" })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![contact_list, contact_submit]
}
