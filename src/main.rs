// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use dedupe_lib::pipeline::{run_subject_dedupe, RunPaths};
use dedupe_lib::utils::config::DedupeConfig;
use dedupe_lib::utils::env::load_env;
use dedupe_lib::utils::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about = "Flag likely duplicate subject names in a roster", long_about = None)]
struct DedupeArgs {
    /// Input CSV with an id column and a name column
    #[arg(long)]
    input: PathBuf,

    /// Output CSV; its directory is created if missing
    #[arg(long)]
    output: PathBuf,

    /// Write a JSON report of every component here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Identifier column (overrides DEDUPE_ID_COLUMN)
    #[arg(long)]
    id_column: Option<String>,

    /// Name column (overrides DEDUPE_NAME_COLUMN)
    #[arg(long)]
    name_column: Option<String>,

    /// Appended canonical-id column (overrides DEDUPE_OUTPUT_COLUMN)
    #[arg(long)]
    output_column: Option<String>,

    /// Components larger than this are re-split with the strict matcher
    #[arg(long)]
    threshold: Option<usize>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl DedupeArgs {
    fn apply_overrides(&self, mut config: DedupeConfig) -> DedupeConfig {
        if let Some(id_column) = &self.id_column {
            config.id_column = id_column.clone();
        }
        if let Some(name_column) = &self.name_column {
            config.name_column = name_column.clone();
        }
        if let Some(output_column) = &self.output_column {
            config.output_column = output_column.clone();
        }
        if let Some(threshold) = self.threshold {
            config.large_component_threshold = threshold;
        }
        config
    }
}

fn main() -> Result<()> {
    let args = DedupeArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    info!("Starting subject duplicate detection");
    load_env();

    let config = args.apply_overrides(DedupeConfig::from_env());
    config.log_config();

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = if progress_config.should_show_detailed() {
        progress_config.create_multi_progress()
    } else {
        None
    };

    let paths = RunPaths {
        input: args.input.clone(),
        output: args.output.clone(),
        report: args.report.clone(),
    };

    let (stats, timings) = run_subject_dedupe(&paths, &config, multi_progress)
        .context("Subject duplicate detection failed")?;

    info!("=== Dedupe Summary ===");
    info!("Total subjects: {}", stats.total_records);
    info!("Similarity edges: {}", stats.total_edges);
    info!("Initial components: {}", stats.initial_components);
    info!("Components split with strict matching: {}", stats.components_split);
    info!("Final components: {}", stats.final_components);
    info!("Largest component: {}", stats.largest_component);
    info!("Subjects with a likely duplicate: {}", stats.duplicate_records);
    info!("=== Timing Breakdown ===");
    info!("Loading: {:.2}s", timings.loading_time);
    info!("Clustering: {:.2}s", timings.clustering_time);
    info!("Output: {:.2}s", timings.output_time);
    info!("Total execution time: {:.2}s", timings.total());

    info!("Output written to {}", paths.output.display());
    Ok(())
}
