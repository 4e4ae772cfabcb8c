use std::path::Path;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::security::auth::AdminUser;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(FromForm)]
pub struct UploadForm<'f> {
    pub image: TempFile<'f>,
}

/// Extension from the client's filename, falling back to the content type.
fn upload_extension(file: &TempFile<'_>) -> Option<String> {
    file.raw_name()
        .and_then(|rn| {
            let raw = rn.dangerous_unsafe_unsanitized_raw().as_str();
            raw.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
        })
        .or_else(|| {
            file.content_type()
                .and_then(|ct| ct.extension())
                .map(|e| e.as_str().to_lowercase())
        })
}

pub(crate) fn is_allowed_extension(ext: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&ext)
}

#[post("/upload", data = "<form>")]
pub async fn upload(
    admin: AdminUser,
    config: &State<AppConfig>,
    mut form: Form<UploadForm<'_>>,
) -> ApiResult<Json<Value>> {
    if form.image.len() == 0 {
        return Err(ApiError::invalid("No file uploaded"));
    }
    let ext = upload_extension(&form.image)
        .filter(|e| is_allowed_extension(e))
        .ok_or_else(|| ApiError::invalid("Only JPG, JPEG, PNG, GIF and WEBP files are allowed"))?;

    let filename = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    let dest = Path::new(&config.upload_dir).join(&filename);

    form.image
        .move_copy_to(&dest)
        .await
        .map_err(|e| ApiError::Internal(format!("upload persist failed: {}", e)))?;

    let check_path = dest.clone();
    let decoded = rocket::tokio::task::spawn_blocking(move || image::image_dimensions(&check_path))
        .await
        .map_err(|e| ApiError::Internal(format!("image check failed: {}", e)))?;

    if decoded.is_err() {
        if let Err(e) = rocket::tokio::fs::remove_file(&dest).await {
            log::warn!("could not remove rejected upload {}: {}", dest.display(), e);
        }
        return Err(ApiError::invalid("File is not an image"));
    }

    log::info!("user {} uploaded {}", admin.user.id, filename);
    Ok(Json(json!({ "status": "success", "url": format!("/uploads/{}", filename) })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![upload]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_extensions_pass() {
        for ok in ["jpg", "jpeg", "png", "gif", "webp"] {
            assert!(is_allowed_extension(ok));
        }
        assert!(!is_allowed_extension("svg"));
        assert!(!is_allowed_extension("php"));
        assert!(!is_allowed_extension(""));
    }
}
