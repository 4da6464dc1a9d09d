//! Chunk graph optimization
//!
//! Runs the minimum chunk size pass to a fixed point.

mod min_size;
mod size;

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::graph::ChunkGraph;

pub use min_size::{try_merge_once, ConsolidateError, ConsolidateOptions, MergeRecord, MergeStep};
pub use size::{estimate_size, ChunkSizeOptions};

/// Result of an optimization run
#[derive(Debug)]
pub struct OptimizeReport {
    /// Chunk count before the first merge
    pub chunks_before: usize,

    /// Chunk count at the fixed point
    pub chunks_after: usize,

    /// Merges in the order they were applied
    pub merges: Vec<MergeRecord>,

    /// Wall time spent merging
    pub duration: Duration,
}

/// Drives the consolidation pass over a chunk graph
pub struct Optimizer {
    options: ConsolidateOptions,
}

impl Optimizer {
    /// Create an optimizer, rejecting invalid options up front
    pub fn new(options: ConsolidateOptions) -> Result<Self, ConsolidateError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Merge chunks until the pass reports nothing left to do.
    ///
    /// Every merge removes one chunk, so a graph of N chunks converges in
    /// fewer than N merges; exceeding that is reported as an error.
    pub fn run(&self, graph: &mut ChunkGraph) -> Result<OptimizeReport, ConsolidateError> {
        let start = Instant::now();
        let chunks_before = graph.len();
        let mut merges = Vec::new();

        info!(
            "Optimizing {} chunk(s) with min chunk size {}",
            chunks_before, self.options.min_chunk_size
        );

        loop {
            match try_merge_once(graph, &self.options)? {
                MergeStep::Merged(record) => {
                    merges.push(record);
                    if merges.len() >= chunks_before {
                        return Err(ConsolidateError::NotConverging {
                            merges: merges.len(),
                        });
                    }
                }
                MergeStep::Converged => break,
            }
        }

        debug!("Optimization completed in {:?}", start.elapsed());

        Ok(OptimizeReport {
            chunks_before,
            chunks_after: graph.len(),
            merges,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ChunkId, GroupId, GroupKind, Module};
    use std::collections::BTreeSet;

    /// Deterministic pseudo-random graph: `groups` async groups and `chunks`
    /// chunks, each in one to three groups, with a handful of shared modules
    fn generated_graph(seed: u64, groups: usize, chunks: u32) -> ChunkGraph {
        let mut state = seed;
        let mut next = move |bound: u64| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) % bound
        };

        let mut graph = ChunkGraph::new();
        let group_ids: Vec<GroupId> = (0..groups)
            .map(|i| graph.add_group(&format!("g{}", i), GroupKind::Async).unwrap())
            .collect();
        let shared: Vec<_> = (0..4)
            .map(|i| graph.add_module(Module::new(format!("shared{}.js", i), 7)))
            .collect();

        for id in 0..chunks {
            let chunk = ChunkId(id);
            graph.add_chunk(chunk, None).unwrap();

            let own = graph.add_module(Module::new(format!("c{}.js", id), 1 + next(120)));
            graph.connect_chunk_and_module(chunk, own).unwrap();
            if next(3) == 0 {
                let module = shared[next(shared.len() as u64) as usize];
                graph.connect_chunk_and_module(chunk, module).unwrap();
            }

            for _ in 0..=next(3) {
                let group = group_ids[next(groups as u64) as usize];
                graph.connect_chunk_and_group(chunk, group).unwrap();
            }
        }

        graph
    }

    fn module_union(graph: &ChunkGraph) -> BTreeSet<String> {
        graph
            .chunks()
            .flat_map(|c| c.modules().iter().copied())
            .filter_map(|m| graph.module(m).map(|m| m.identifier.clone()))
            .collect()
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(Optimizer::new(ConsolidateOptions::new(-1.0)).is_err());
        assert!(Optimizer::new(ConsolidateOptions::new(f64::INFINITY)).is_err());
        assert!(Optimizer::new(ConsolidateOptions::new(0.0)).is_ok());
    }

    #[test]
    fn test_each_merge_removes_exactly_one_chunk() {
        let options = ConsolidateOptions::new(100.0);

        for seed in 1..20 {
            let mut graph = generated_graph(seed, 5, 12);
            let modules = module_union(&graph);
            let mut steps = 0;

            loop {
                let before = graph.len();
                let step = try_merge_once(&mut graph, &options).unwrap();
                steps += 1;

                match step {
                    MergeStep::Merged(record) => {
                        assert_ne!(record.source, record.target);
                        assert_eq!(graph.len(), before - 1);
                        assert!(graph.chunk(record.source).is_none());
                    }
                    MergeStep::Converged => {
                        assert_eq!(graph.len(), before);
                        break;
                    }
                }
            }

            assert!(steps <= 12, "seed {} took {} steps", seed, steps);
            assert_eq!(module_union(&graph), modules);
            graph.validate().unwrap();
        }
    }

    #[test]
    fn test_single_group_chunks_survive() {
        let options = ConsolidateOptions::new(1000.0);

        for seed in 1..20 {
            let mut graph = generated_graph(seed, 4, 10);
            let single: Vec<ChunkId> = graph
                .chunks()
                .filter(|c| graph.number_of_groups(c.id) == 1)
                .map(|c| c.id)
                .collect();
            let snapshot: Vec<_> = single
                .iter()
                .map(|&id| graph.chunk(id).unwrap().modules().clone())
                .collect();

            let report = Optimizer::new(options).unwrap().run(&mut graph).unwrap();

            for record in &report.merges {
                assert!(!single.contains(&record.source));
                assert!(!single.contains(&record.target));
            }
            for (id, modules) in single.iter().zip(snapshot) {
                assert_eq!(graph.chunk(*id).unwrap().modules(), &modules);
            }
        }
    }

    #[test]
    fn test_run_reaches_fixed_point() {
        let options = ConsolidateOptions::new(150.0);

        for seed in 1..20 {
            let mut graph = generated_graph(seed, 6, 15);
            let optimizer = Optimizer::new(options).unwrap();

            let report = optimizer.run(&mut graph).unwrap();

            assert_eq!(report.chunks_before, 15);
            assert_eq!(report.chunks_after, graph.len());
            assert_eq!(report.merges.len(), report.chunks_before - report.chunks_after);

            let after = graph.to_description();
            assert!(!try_merge_once(&mut graph, &options).unwrap().merged());
            assert_eq!(graph.to_description(), after);

            let multi: Vec<ChunkId> = graph
                .chunks()
                .filter(|c| graph.number_of_groups(c.id) > 1)
                .map(|c| c.id)
                .collect();
            if multi.len() > 1 {
                for id in multi {
                    assert!(estimate_size(&graph, id, &options.sizes) >= 150.0);
                }
            }
        }
    }

    #[test]
    fn test_run_is_deterministic() {
        let options = ConsolidateOptions::new(120.0);
        let optimizer = Optimizer::new(options).unwrap();

        let mut first = generated_graph(7, 5, 14);
        let mut second = generated_graph(7, 5, 14);
        let a = optimizer.run(&mut first).unwrap();
        let b = optimizer.run(&mut second).unwrap();

        assert_eq!(a.merges, b.merges);
        assert_eq!(first.to_description(), second.to_description());
    }
}
