// src/pipeline.rs - Load, cluster, map and write a subject roster

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::clustering::canonical::CanonicalMapping;
use crate::clustering::subject_clustering::{log_components, run_subject_clustering};
use crate::models::core::{SubjectComponent, SubjectId, SubjectNode};
use crate::models::stats_models::{ClusteringStats, PhaseTimings};
use crate::utils::config::DedupeConfig;
use crate::utils::progress_config::add_bar;
use crate::utils::table::SubjectTable;

/// Where a run reads from and writes to.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Optional JSON report of every final component.
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentReportEntry<'a> {
    pub rank: usize,
    pub size: usize,
    pub canonical_id: Option<&'a SubjectId>,
    pub members: &'a [SubjectNode],
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupeReport<'a> {
    pub input: String,
    pub output: String,
    pub large_component_threshold: usize,
    pub stats: &'a ClusteringStats,
    pub timings: &'a PhaseTimings,
    pub components: Vec<ComponentReportEntry<'a>>,
}

impl<'a> DedupeReport<'a> {
    pub fn new(
        paths: &RunPaths,
        config: &DedupeConfig,
        stats: &'a ClusteringStats,
        timings: &'a PhaseTimings,
        components: &'a [SubjectComponent],
    ) -> Self {
        Self {
            input: paths.input.display().to_string(),
            output: paths.output.display().to_string(),
            large_component_threshold: config.large_component_threshold,
            stats,
            timings,
            components: components
                .iter()
                .enumerate()
                .map(|(idx, component)| ComponentReportEntry {
                    rank: idx + 1,
                    size: component.len(),
                    canonical_id: component.canonical_id(),
                    members: &component.members,
                })
                .collect(),
        }
    }
}

/// Runs the whole batch: load the roster, group likely duplicates, write the
/// annotated roster and, if requested, the component report.
pub fn run_subject_dedupe(
    paths: &RunPaths,
    config: &DedupeConfig,
    multi_progress: Option<MultiProgress>,
) -> Result<(ClusteringStats, PhaseTimings)> {
    let mut timings = PhaseTimings::default();
    let main_pb = add_bar(multi_progress.as_ref(), 3, "");

    // Phase 1: Loading
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 1: Loading subjects...");
    }
    let phase1_start = Instant::now();
    info!("Phase 1: Loading subjects from {}", paths.input.display());
    let table = SubjectTable::read_csv(&paths.input, &config.id_column, &config.name_column)
        .context("Failed to load subjects")?;
    timings.loading_time = phase1_start.elapsed().as_secs_f64();
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 2: Clustering
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 2: Clustering names...");
    }
    let phase2_start = Instant::now();
    info!("Phase 2: Clustering {} subjects", table.len());
    let outcome = run_subject_clustering(
        table.records(),
        config.large_component_threshold,
        multi_progress.clone(),
    );
    let mapping = CanonicalMapping::from_components(&outcome.components);
    timings.clustering_time = phase2_start.elapsed().as_secs_f64();
    info!(
        "Phase 2 complete: {} components ({} split) in {:.2}s",
        outcome.stats.final_components, outcome.stats.components_split, timings.clustering_time
    );
    log_components(&outcome.components);
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 3: Output
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 3: Writing output...");
    }
    let phase3_start = Instant::now();
    table
        .write_annotated_csv(&paths.output, &mapping, &config.output_column)
        .context("Failed to write annotated subjects")?;
    timings.output_time = phase3_start.elapsed().as_secs_f64();

    if let Some(report_path) = &paths.report {
        let report = DedupeReport::new(paths, config, &outcome.stats, &timings, &outcome.components);
        write_report(report_path, &report)?;
    }

    if let Some(pb) = &main_pb {
        pb.inc(1);
        pb.finish_with_message(format!(
            "Dedupe complete: {} components",
            outcome.stats.final_components
        ));
    }

    Ok((outcome.stats, timings))
}

fn write_report(path: &Path, report: &DedupeReport<'_>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory {}", parent.display())
            })?;
        }
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!("Wrote component report to {}", path.display());
    Ok(())
}
