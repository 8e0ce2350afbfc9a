pub mod canonical;
pub mod subject_clustering;
