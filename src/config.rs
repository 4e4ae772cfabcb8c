use serde::Deserialize;

use crate::models::comment::CommentStatus;

/// Runtime settings, read from the `folio` table of Rocket's figment
/// (`Rocket.toml` `[default.folio]`, or `ROCKET_FOLIO={...}` in the environment).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: String,
    pub upload_dir: String,
    pub pool_size: u32,
    pub session_expiry_hours: i64,
    pub online_window_minutes: i64,
    pub comment_default_status: CommentStatus,
    pub allowed_origin: String,
    /// Attempts per client IP per window for login, register and contact.
    pub login_rate_limit: u64,
    pub rate_limit_window_secs: u64,
    pub bcrypt_cost: u32,
    /// Take the client IP from proxy headers (`X-Forwarded-For` and friends).
    /// Only enable behind a reverse proxy that overwrites them.
    pub trusted_proxy: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: "data/folio.db".to_string(),
            upload_dir: "uploads".to_string(),
            pool_size: 10,
            session_expiry_hours: 24,
            online_window_minutes: 15,
            comment_default_status: CommentStatus::Approved,
            allowed_origin: "*".to_string(),
            login_rate_limit: 5,
            rate_limit_window_secs: 15 * 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            trusted_proxy: false,
        }
    }
}

impl AppConfig {
    /// Extract from a figment, falling back to defaults when the table is absent.
    pub fn from_figment(figment: &rocket::figment::Figment) -> Result<Self, rocket::figment::Error> {
        match figment.extract_inner::<AppConfig>("folio") {
            Ok(c) => Ok(c),
            Err(e) if e.missing() => Ok(AppConfig::default()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::providers::Serialized;
    use rocket::figment::Figment;

    #[test]
    fn missing_table_yields_defaults() {
        let cfg = AppConfig::from_figment(&Figment::new()).unwrap();
        assert_eq!(cfg.online_window_minutes, 15);
        assert_eq!(cfg.comment_default_status, CommentStatus::Approved);
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let figment = Figment::new().merge(Serialized::default(
            "folio",
            serde_json::json!({ "comment_default_status": "pending", "pool_size": 2 }),
        ));
        let cfg = AppConfig::from_figment(&figment).unwrap();
        assert_eq!(cfg.comment_default_status, CommentStatus::Pending);
        assert_eq!(cfg.pool_size, 2);
        assert_eq!(cfg.upload_dir, "uploads");
    }
}
