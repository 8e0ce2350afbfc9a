// src/utils/env.rs

use log::{info, warn};
use std::path::Path;

const ENV_PATHS: [&str; 3] = [".env", ".env.local", "../.env"];

/// Loads the first `.env` file found. Variables already set in the process
/// environment take precedence over the file.
pub fn load_env() {
    for path in ENV_PATHS.iter() {
        if !Path::new(path).exists() {
            continue;
        }
        match dotenv::from_path(path) {
            Ok(()) => {
                info!("Loaded environment variables from {}", path);
                return;
            }
            Err(e) => warn!("Failed to load environment from {}: {}", path, e),
        }
    }
    info!("No .env file found, using environment variables from system");
}
