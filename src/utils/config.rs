// src/utils/config.rs

use log::{debug, info};
use std::env;
use std::str::FromStr;

/// Components with more members than this are re-split with the strict matcher.
pub const LARGE_COMPONENT_THRESHOLD: usize = 7;

pub const DEFAULT_ID_COLUMN: &str = "subject_id";
pub const DEFAULT_NAME_COLUMN: &str = "subject_name";
pub const DEFAULT_OUTPUT_COLUMN: &str = "similar_subject_id";

/// Column names and clustering knobs for a dedupe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupeConfig {
    pub id_column: String,
    pub name_column: String,
    /// Column appended to the output holding the canonical subject id.
    pub output_column: String,
    pub large_component_threshold: usize,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            id_column: DEFAULT_ID_COLUMN.to_string(),
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            output_column: DEFAULT_OUTPUT_COLUMN.to_string(),
            large_component_threshold: LARGE_COMPONENT_THRESHOLD,
        }
    }
}

impl DedupeConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let config = Self {
            id_column: env_or("DEDUPE_ID_COLUMN", DEFAULT_ID_COLUMN.to_string()),
            name_column: env_or("DEDUPE_NAME_COLUMN", DEFAULT_NAME_COLUMN.to_string()),
            output_column: env_or("DEDUPE_OUTPUT_COLUMN", DEFAULT_OUTPUT_COLUMN.to_string()),
            large_component_threshold: env_or(
                "DEDUPE_LARGE_COMPONENT_THRESHOLD",
                LARGE_COMPONENT_THRESHOLD,
            ),
        };
        debug!("Dedupe config from environment: {:?}", config);
        config
    }

    pub fn log_config(&self) {
        info!(
            "Dedupe configuration: id column '{}', name column '{}', output column '{}', large component threshold {}",
            self.id_column, self.name_column, self.output_column, self.large_component_threshold
        );
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}
