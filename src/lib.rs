//! Coalesce library
//!
//! Chunk graph model and the minimum chunk size consolidation pass.

pub mod cli;
pub mod config;
pub mod graph;
pub mod optimize;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use graph::ChunkGraph;
pub use optimize::{try_merge_once, ConsolidateOptions, MergeStep, Optimizer};
