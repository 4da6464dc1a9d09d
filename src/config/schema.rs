//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::optimize::{ChunkSizeOptions, ConsolidateOptions};

/// Minimum chunk size pass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeConfig {
    /// Multi-group chunks estimated below this size are merged
    pub min_chunk_size: f64,

    /// Fixed per-chunk request cost added to every estimate
    #[serde(default)]
    pub chunk_overhead: f64,

    /// Factor applied to chunks loaded on the initial request
    #[serde(default = "default_entry_chunk_multiplicator")]
    pub entry_chunk_multiplicator: f64,
}

impl OptimizeConfig {
    pub fn with_min_chunk_size(min_chunk_size: f64) -> Self {
        Self {
            min_chunk_size,
            chunk_overhead: 0.0,
            entry_chunk_multiplicator: default_entry_chunk_multiplicator(),
        }
    }

    /// Options for the consolidation pass
    pub fn consolidate_options(&self) -> ConsolidateOptions {
        ConsolidateOptions {
            min_chunk_size: self.min_chunk_size,
            sizes: ChunkSizeOptions {
                chunk_overhead: self.chunk_overhead,
                entry_chunk_multiplicator: self.entry_chunk_multiplicator,
            },
        }
    }
}

fn default_entry_chunk_multiplicator() -> f64 {
    1.0
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print the optimized graph
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

fn default_true() -> bool {
    true
}
