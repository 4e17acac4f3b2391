//! Analysis utilities

pub mod timestamp_paths;

pub use timestamp_paths::*;
