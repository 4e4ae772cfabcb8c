use log::{error, info};
use std::fs;
use std::path::Path;

use crate::config::AppConfig;

/// Create the database directory and the upload directory if missing.
/// Returns the number of directories that could not be created.
pub fn run(config: &AppConfig) -> u32 {
    info!("Folio boot check starting...");

    let mut errors = 0u32;
    let db_dir = Path::new(&config.db_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty());

    for dir in db_dir.into_iter().chain([Path::new(&config.upload_dir)]) {
        if dir.exists() {
            continue;
        }
        match fs::create_dir_all(dir) {
            Ok(_) => info!("  Created directory: {}", dir.display()),
            Err(e) => {
                error!("  FAILED to create directory {}: {}", dir.display(), e);
                errors += 1;
            }
        }
    }

    if errors == 0 {
        info!("Boot check passed");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_dirs() {
        let root = std::env::temp_dir().join(format!("folio-boot-{}", uuid::Uuid::new_v4()));
        let config = AppConfig {
            db_path: root.join("db/folio.db").to_string_lossy().into_owned(),
            upload_dir: root.join("up").to_string_lossy().into_owned(),
            ..AppConfig::default()
        };
        assert_eq!(run(&config), 0);
        assert!(root.join("db").is_dir());
        assert!(root.join("up").is_dir());
        let _ = fs::remove_dir_all(&root);
    }
}
