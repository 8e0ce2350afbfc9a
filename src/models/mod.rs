pub mod core;
pub mod stats_models;
