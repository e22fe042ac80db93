mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, NotificationsConfig, QuestConfig, UiConfig};
pub use database::{Database, EvaluationRecord, UserRecord};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `HUNTER_DATA_DIR` wins when set. Otherwise `~/.config/hunterquest[-dev]/`
/// based on `HUNTER_ENV` (set `HUNTER_ENV=dev` for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HUNTER_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HUNTER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("hunterquest-dev")
            } else {
                base_dir.join("hunterquest")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
