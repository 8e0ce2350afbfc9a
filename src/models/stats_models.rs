// src/models/stats_models.rs

use serde::Serialize;

/// Statistics collected over a single clustering run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusteringStats {
    pub total_records: usize,
    pub total_edges: usize,
    pub initial_components: usize,
    pub components_split: usize,
    pub final_components: usize,
    pub largest_component: usize,
    pub singleton_components: usize,
    /// Records sharing a component with at least one other record.
    pub duplicate_records: usize,
}

/// Wall-clock timings of the pipeline phases, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseTimings {
    pub loading_time: f64,
    pub clustering_time: f64,
    pub output_time: f64,
}

impl PhaseTimings {
    pub fn total(&self) -> f64 {
        self.loading_time + self.clustering_time + self.output_time
    }
}
