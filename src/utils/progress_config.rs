// src/utils/progress_config.rs

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::env;

/// Configuration for progress tracking throughout the pipeline
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show progress bars at all
    pub enabled: bool,
    /// Whether to show the per-pass comparison bars
    pub detailed: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detailed: true,
        }
    }
}

impl ProgressConfig {
    /// Create progress configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            detailed: env::var("PROGRESS_DETAILED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    /// Create a MultiProgress instance if progress is enabled, None otherwise
    pub fn create_multi_progress(&self) -> Option<MultiProgress> {
        if self.enabled {
            Some(MultiProgress::new())
        } else {
            None
        }
    }

    pub fn should_show_detailed(&self) -> bool {
        self.enabled && self.detailed
    }
}

/// Adds a bar with the pipeline's shared style to `multi_progress`, if any.
pub fn add_bar(multi_progress: Option<&MultiProgress>, len: u64, indent: &str) -> Option<ProgressBar> {
    let mp = multi_progress?;
    let pb = mp.add(ProgressBar::new(len));
    let template = format!(
        "{}{{spinner:.green}} [{{elapsed_precise}}] {{bar:30.cyan/blue}} {{pos}}/{{len}} {{msg}}",
        indent
    );
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    Some(pb)
}
