pub mod config;
pub mod env;
pub mod progress_config;
pub mod table;
