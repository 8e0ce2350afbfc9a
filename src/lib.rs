pub mod clustering;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod utils;
