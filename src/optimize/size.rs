//! Chunk size estimation

use serde::{Deserialize, Serialize};

use crate::graph::{ChunkGraph, ChunkId};

/// Tunables for [`estimate_size`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkSizeOptions {
    /// Fixed cost added once per chunk, modeling request and parse overhead
    pub chunk_overhead: f64,

    /// Factor applied to chunks loaded by at least one entry group
    pub entry_chunk_multiplicator: f64,
}

impl ChunkSizeOptions {
    /// Configuration used to rank candidates against each other
    pub const REFERENCE: Self = Self {
        chunk_overhead: 1.0,
        entry_chunk_multiplicator: 1.0,
    };
}

impl Default for ChunkSizeOptions {
    fn default() -> Self {
        Self {
            chunk_overhead: 0.0,
            entry_chunk_multiplicator: 1.0,
        }
    }
}

/// Estimate the transfer cost of `chunk` in the current graph state
pub fn estimate_size(graph: &ChunkGraph, chunk: ChunkId, options: &ChunkSizeOptions) -> f64 {
    let size = graph.modules_size(chunk) as f64 + options.chunk_overhead;

    if graph.is_in_any_entry_group(chunk) {
        size * options.entry_chunk_multiplicator
    } else {
        size
    }
}
