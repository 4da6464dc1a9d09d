//! Merging of undersized chunks that are shared between chunk groups
//!
//! Each call of [`try_merge_once`] folds the globally smallest undersized
//! multi-group chunk into the legal target sharing the most groups with it.
//! Chunks loaded by a single group are never touched.

use std::cmp::Ordering;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::size::{estimate_size, ChunkSizeOptions};
use crate::graph::{ChunkGraph, ChunkId, GraphError};
use crate::utils::format_size;

/// Errors raised by the consolidation pass
#[derive(Debug, Error, PartialEq)]
pub enum ConsolidateError {
    /// An option is negative, not finite, or a zero multiplicator
    #[error("Invalid value {value} for option '{option}'")]
    InvalidOption { option: &'static str, value: f64 },

    /// An undersized chunk has no chunk it can legally be merged into
    #[error("No legal merge target for undersized chunk {chunk}")]
    NoLegalTarget { chunk: ChunkId },

    /// More merges than the graph had chunks
    #[error("Consolidation did not converge after {merges} merges")]
    NotConverging { merges: usize },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Options of the consolidation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsolidateOptions {
    /// Multi-group chunks estimated strictly below this size get merged
    pub min_chunk_size: f64,

    /// Size estimation used for the threshold test
    pub sizes: ChunkSizeOptions,
}

impl ConsolidateOptions {
    pub fn new(min_chunk_size: f64) -> Self {
        Self {
            min_chunk_size,
            sizes: ChunkSizeOptions::default(),
        }
    }

    /// Reject options that would make size comparisons meaningless
    pub fn validate(&self) -> Result<(), ConsolidateError> {
        let checks = [
            ("min_chunk_size", self.min_chunk_size, false),
            ("chunk_overhead", self.sizes.chunk_overhead, false),
            (
                "entry_chunk_multiplicator",
                self.sizes.entry_chunk_multiplicator,
                true,
            ),
        ];

        for (option, value, strictly_positive) in checks {
            let in_range = if strictly_positive {
                value > 0.0
            } else {
                value >= 0.0
            };
            if !value.is_finite() || !in_range {
                return Err(ConsolidateError::InvalidOption { option, value });
            }
        }

        Ok(())
    }
}

/// A merge performed by [`try_merge_once`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeRecord {
    /// The absorbed chunk, no longer part of the graph
    pub source: ChunkId,

    /// The chunk that now holds the source's modules and groups
    pub target: ChunkId,

    /// Reference-size estimate of the source before the merge
    pub source_size: f64,
}

/// Outcome of one consolidation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeStep {
    /// One chunk was merged; the graph changed
    Merged(MergeRecord),
    /// Nothing left to merge; the graph is untouched
    Converged,
}

impl MergeStep {
    pub fn merged(&self) -> bool {
        matches!(self, MergeStep::Merged(_))
    }
}

/// Fitness of a merge target, compared lexicographically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Fitness {
    /// Groups loading both the source and the target
    overlap: usize,

    /// Shared groups minus all groups of the target; never positive
    spread: isize,
}

/// An undersized chunk and its reference-size estimate
struct SmallCandidate {
    chunk: ChunkId,
    size: f64,
}

/// Merge the smallest undersized multi-group chunk into its best target.
///
/// Candidates are collected before the graph is touched, and at most one
/// merge happens per call. Returns [`MergeStep::Converged`] when there is
/// nothing to merge, which makes repeated calls on a converged graph no-ops.
pub fn try_merge_once(
    graph: &mut ChunkGraph,
    options: &ConsolidateOptions,
) -> Result<MergeStep, ConsolidateError> {
    options.validate()?;

    let mut targets: Vec<ChunkId> = Vec::new();
    let mut small: Vec<SmallCandidate> = Vec::new();

    for chunk in graph.chunks() {
        match graph.number_of_groups(chunk.id) {
            0 => {
                warn!("Chunk {} is not loaded by any chunk group", chunk.label());
                continue;
            }
            1 => {
                debug!("Skipping {}: loaded by a single chunk group", chunk.label());
                continue;
            }
            _ => {}
        }

        targets.push(chunk.id);

        if estimate_size(graph, chunk.id, &options.sizes) < options.min_chunk_size {
            small.push(SmallCandidate {
                chunk: chunk.id,
                size: estimate_size(graph, chunk.id, &ChunkSizeOptions::REFERENCE),
            });
        }
    }

    if targets.len() <= 1 {
        return Ok(MergeStep::Converged);
    }

    // Chunks are scanned in id order, so ties on size keep the lower id
    let Some(source) = small.into_iter().min_by(|a, b| {
        a.size
            .total_cmp(&b.size)
            .then_with(|| a.chunk.cmp(&b.chunk))
    }) else {
        return Ok(MergeStep::Converged);
    };

    targets.retain(|&c| c != source.chunk);

    let source_groups = graph.groups_of(source.chunk);
    let mut best: Option<(ChunkId, Fitness)> = None;

    for &target in &targets {
        if !graph.can_integrate(source.chunk, target) {
            debug!("Chunk {} cannot be integrated into {}", source.chunk, target);
            continue;
        }

        let target_groups = graph.groups_of(target);
        let overlap = target_groups.intersection(source_groups).count();
        let fitness = Fitness {
            overlap,
            spread: overlap as isize - target_groups.len() as isize,
        };

        // Strictly better only: the first of equally fit targets is kept
        let better = match best {
            Some((_, current)) => fitness.cmp(&current) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some((target, fitness));
        }
    }

    let Some((target, fitness)) = best else {
        return Err(ConsolidateError::NoLegalTarget {
            chunk: source.chunk,
        });
    };

    graph.integrate(target, source.chunk)?;
    graph.remove_chunk(source.chunk);

    info!(
        "Merged chunk {} ({}) into {} (overlap {}, spread {})",
        source.chunk,
        format_size(source.size),
        target,
        fitness.overlap,
        fitness.spread
    );

    Ok(MergeStep::Merged(MergeRecord {
        source: source.chunk,
        target,
        source_size: source.size,
    }))
}
