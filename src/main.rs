#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::{FileServer, Options};
use rocket::http::Header;
use rocket::{Build, Rocket};

mod audit;
mod boot;
mod config;
mod db;
mod error;
mod models;
mod moderation;
mod rate_limit;
mod routes;
mod security;
mod store;


use config::AppConfig;
use rate_limit::RateLimiter;
use store::sqlite::SqliteStore;
use store::Store;

/// Adds CORS headers to every response.
pub struct Cors {
    allowed_origin: String,
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS Headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        res.set_header(Header::new(
            "Access-Control-Allow-Origin",
            self.allowed_origin.clone(),
        ));
        res.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));
        res.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization, X-Requested-With",
        ));
        if self.allowed_origin != "*" {
            res.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        }
    }
}

/// Attach state, fairings, routes and catchers to `base`.
pub fn build_rocket(base: Rocket<Build>, store: Arc<dyn Store>, config: AppConfig) -> Rocket<Build> {
    let cors = Cors {
        allowed_origin: config.allowed_origin.clone(),
    };
    let uploads = FileServer::new(&config.upload_dir, Options::Missing);

    base.manage(store)
        .manage(config)
        .manage(RateLimiter::new())
        .attach(cors)
        .mount("/", routes::routes())
        .mount("/api", routes::routes())
        .mount("/", routes![routes::preflight])
        .mount("/uploads", uploads)
        .register("/", routes::catchers())
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let base = rocket::build();
    let config = AppConfig::from_figment(base.figment())?;

    if boot::run(&config) > 0 {
        return Err("boot check failed: required directories could not be created".into());
    }

    let pool = db::init_pool_at(&config.db_path, config.pool_size)?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));
    store.run_migrations()?;
    match store.session_cleanup_expired() {
        Ok(n) if n > 0 => log::info!("Removed {} expired sessions", n),
        Ok(_) => {}
        Err(e) => log::warn!("Session cleanup failed: {}", e),
    }

    log::info!(
        "Database at {}, uploads in {}",
        config.db_path,
        config.upload_dir
    );

    let _ = build_rocket(base, store, config).launch().await?;
    Ok(())
}
