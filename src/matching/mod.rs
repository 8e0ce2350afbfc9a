pub mod name;

pub use name::{similar_names, similar_names_permissive, similar_names_strict, MatchStrictness};
