//! Application configuration.
//!
//! Values load with priority config.toml > environment (.env) > default.

use serde::Deserialize;
use std::path::PathBuf;

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    profile: Option<ProfileConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileConfig {
    name: Option<String>,
}

fn read_config_file() -> Option<AppConfig> {
    let contents = std::fs::read_to_string("config.toml").ok()?;
    toml::from_str::<AppConfig>(&contents).ok()
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    if let Some(config) = read_config_file() {
        if let Some(path) = config.database.and_then(|db| db.path) {
            tracing::info!("Using database from config.toml: {}", path);
            return PathBuf::from(path);
        }
    }

    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    let default = PathBuf::from("data/mathfacts.db");
    tracing::info!("Using default database path: {}", default.display());
    default
}

/// Load the active profile (user) name: config.toml > MATHFACTS_PROFILE > "default"
pub fn load_profile_name() -> String {
    let _ = dotenvy::dotenv();

    if let Some(config) = read_config_file() {
        if let Some(name) = config.profile.and_then(|p| p.name) {
            return name;
        }
    }

    std::env::var("MATHFACTS_PROFILE").unwrap_or_else(|_| "default".to_string())
}

// ==================== Session Configuration ====================

/// Default number of problems per practice session
pub const DEFAULT_PROBLEM_COUNT: usize = 10;

/// Maximum due facts pulled into one review round
pub const DUE_REVIEW_LIMIT: usize = 20;

/// Weak facts shown on the progress screen
pub const WEAK_FACTS_LIMIT: usize = 10;

/// Wrong submissions allowed on a problem before the answer is revealed
pub const MAX_ERRORS_PER_PROBLEM: i64 = 3;
