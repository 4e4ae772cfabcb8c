use std::io::Cursor;
use std::sync::Arc;

use chrono::Utc;
use rocket::http::{ContentType, Header};
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::{Request, State};
use serde_json::{json, Value};

use super::clamp_or;
use crate::audit;
use crate::error::{ApiError, ApiResult};
use crate::models::activity::ActivityQuery;
use crate::security::auth::{ensure_claim, AdminUser};
use crate::store::Store;

const STATS_DAYS: i64 = 7;

/// CSV download with an attachment filename.
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

impl<'r> Responder<'r, 'static> for CsvExport {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(ContentType::CSV)
            .header(Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            ))
            .sized_body(self.body.len(), Cursor::new(self.body))
            .ok()
    }
}

#[derive(Responder)]
pub enum ActivityResponse {
    Json(Json<Value>),
    Csv(CsvExport),
}

#[allow(clippy::too_many_arguments)]
#[get("/activity?<action>&<search>&<action_filter>&<limit>&<offset>&<user_id>")]
pub fn activity_get(
    store: &State<Arc<dyn Store>>,
    admin: AdminUser,
    action: Option<&str>,
    search: Option<String>,
    action_filter: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    user_id: Option<i64>,
) -> ApiResult<ActivityResponse> {
    ensure_claim(user_id, &admin.user)?;

    match action.unwrap_or("") {
        "export" => {
            let entries = store.activity_all()?;
            Ok(ActivityResponse::Csv(CsvExport {
                filename: audit::export_filename(Utc::now().date_naive()),
                body: audit::to_csv(&entries),
            }))
        }
        "stats" => {
            let stats = store.activity_stats(STATS_DAYS)?;
            Ok(ActivityResponse::Json(Json(json!({ "status": "success", "data": stats }))))
        }
        "" => {
            let query = ActivityQuery {
                search,
                action_filter,
                limit: clamp_or(limit, 50, 1, 500),
                offset: offset.unwrap_or(0).max(0),
            };
            let entries = store.activity_list(&query)?;
            let total = store.activity_count(&query)?;
            Ok(ActivityResponse::Json(Json(json!({
                "status": "success",
                "data": entries,
                "total": total,
                "limit": query.limit,
                "offset": query.offset,
            }))))
        }
        _ => Err(ApiError::invalid("Invalid action")),
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![activity_get]
}
