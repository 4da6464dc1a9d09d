//! Chunk graph data structures
//!
//! Chunks, the groups that load them, and the integrate primitive used by
//! the consolidation pass.

mod chunk;
mod description;
mod group;
mod module;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;
use tracing::debug;

pub use chunk::{Chunk, ChunkId};
pub use description::{ChunkDescription, GraphDescription, GroupDescription, ModuleDescription};
pub use group::{ChunkGroup, GroupId, GroupKind};
pub use module::{Module, ModuleId};

static NO_GROUPS: BTreeSet<GroupId> = BTreeSet::new();

/// Errors raised while building or mutating a chunk graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown chunk {0}")]
    UnknownChunk(ChunkId),

    #[error("Unknown chunk group {0}")]
    UnknownGroup(String),

    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    #[error("Duplicate chunk id {0}")]
    DuplicateChunk(ChunkId),

    #[error("Duplicate chunk group name '{0}'")]
    DuplicateGroup(String),

    #[error("Duplicate module identifier '{0}'")]
    DuplicateModule(String),

    #[error("Chunk {0} does not belong to any chunk group")]
    OrphanChunk(ChunkId),

    #[error("Making '{parent}' a parent of '{child}' would create a group cycle")]
    GroupCycle { child: String, parent: String },

    #[error("Entry module '{module}' of chunk {chunk} is not part of that chunk")]
    EntryModuleOutsideChunk { chunk: ChunkId, module: String },

    #[error("Cannot integrate chunk {0} into itself")]
    SelfIntegration(ChunkId),
}

/// The chunk graph
///
/// Chunks are kept in id order and groups in insertion order, so every
/// traversal is deterministic.
#[derive(Debug, Default, Clone)]
pub struct ChunkGraph {
    /// All registered modules indexed by their ID
    modules: BTreeMap<ModuleId, Module>,

    /// Map from identifier to module ID
    identifier_to_id: HashMap<String, ModuleId>,

    /// Live chunks
    chunks: BTreeMap<ChunkId, Chunk>,

    /// Chunk groups, indexed by `GroupId`
    groups: Vec<ChunkGroup>,

    /// Map from group name to group ID
    name_to_group: HashMap<String, GroupId>,

    /// Next available module ID
    next_module_id: u32,
}

impl ChunkGraph {
    /// Create a new empty chunk graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module; an identifier already known returns its existing ID
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        if let Some(&id) = self.identifier_to_id.get(&module.identifier) {
            return id;
        }

        let id = ModuleId(self.next_module_id);
        self.next_module_id += 1;

        self.identifier_to_id.insert(module.identifier.clone(), id);
        self.modules.insert(id, module);

        id
    }

    /// Add an empty chunk
    pub fn add_chunk(&mut self, id: ChunkId, name: Option<String>) -> Result<(), GraphError> {
        if self.chunks.contains_key(&id) {
            return Err(GraphError::DuplicateChunk(id));
        }
        self.chunks.insert(id, Chunk::new(id, name));
        Ok(())
    }

    /// Add a chunk group with no members
    pub fn add_group(&mut self, name: &str, kind: GroupKind) -> Result<GroupId, GraphError> {
        if self.name_to_group.contains_key(name) {
            return Err(GraphError::DuplicateGroup(name.to_string()));
        }

        let id = GroupId(self.groups.len());
        self.groups.push(ChunkGroup::new(id, name.to_string(), kind));
        self.name_to_group.insert(name.to_string(), id);

        Ok(id)
    }

    /// Make `chunk` a member of `group`, updating both sides
    pub fn connect_chunk_and_group(&mut self, chunk: ChunkId, group: GroupId) -> Result<(), GraphError> {
        let group_entry = self
            .groups
            .get_mut(group.index())
            .ok_or_else(|| GraphError::UnknownGroup(group.to_string()))?;
        let chunk_entry = self
            .chunks
            .get_mut(&chunk)
            .ok_or(GraphError::UnknownChunk(chunk))?;

        group_entry.push_chunk(chunk);
        chunk_entry.groups.insert(group);

        Ok(())
    }

    /// Add a module to a chunk
    pub fn connect_chunk_and_module(&mut self, chunk: ChunkId, module: ModuleId) -> Result<(), GraphError> {
        if !self.modules.contains_key(&module) {
            return Err(GraphError::UnknownModule(module.to_string()));
        }
        let chunk_entry = self
            .chunks
            .get_mut(&chunk)
            .ok_or(GraphError::UnknownChunk(chunk))?;

        chunk_entry.modules.insert(module);
        Ok(())
    }

    /// Mark a module already in `chunk` as its entry module
    pub fn set_entry_module(&mut self, chunk: ChunkId, module: ModuleId) -> Result<(), GraphError> {
        let identifier = self
            .modules
            .get(&module)
            .map(|m| m.identifier.clone())
            .ok_or_else(|| GraphError::UnknownModule(module.to_string()))?;
        let chunk_entry = self
            .chunks
            .get_mut(&chunk)
            .ok_or(GraphError::UnknownChunk(chunk))?;

        if !chunk_entry.contains_module(module) {
            return Err(GraphError::EntryModuleOutsideChunk {
                chunk,
                module: identifier,
            });
        }

        chunk_entry.entry_module = Some(module);
        Ok(())
    }

    /// Mark a chunk as carrying the module loading runtime
    pub fn set_runtime(&mut self, chunk: ChunkId, has_runtime: bool) -> Result<(), GraphError> {
        let chunk_entry = self
            .chunks
            .get_mut(&chunk)
            .ok_or(GraphError::UnknownChunk(chunk))?;
        chunk_entry.has_runtime = has_runtime;
        Ok(())
    }

    /// Nest `child` under `parent`, rejecting links that would form a cycle
    pub fn add_group_parent(&mut self, child: GroupId, parent: GroupId) -> Result<(), GraphError> {
        let child_name = self.group_name(child)?;
        let parent_name = self.group_name(parent)?;

        if child == parent || self.is_ancestor(child, parent) {
            return Err(GraphError::GroupCycle {
                child: child_name,
                parent: parent_name,
            });
        }

        self.groups[child.index()].parents.insert(parent);
        self.groups[parent.index()].children.insert(child);

        Ok(())
    }

    fn group_name(&self, group: GroupId) -> Result<String, GraphError> {
        self.groups
            .get(group.index())
            .map(|g| g.name.clone())
            .ok_or_else(|| GraphError::UnknownGroup(group.to_string()))
    }

    /// Check whether `ancestor` is reachable from `group` through parent links
    fn is_ancestor(&self, ancestor: GroupId, group: GroupId) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![group];

        while let Some(id) = stack.pop() {
            if id == ancestor {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(g) = self.groups.get(id.index()) {
                stack.extend(g.parents.iter().copied());
            }
        }

        false
    }

    /// Verify that every chunk belongs to at least one group
    pub fn validate(&self) -> Result<(), GraphError> {
        match self.chunks.values().find(|c| c.groups.is_empty()) {
            Some(orphan) => Err(GraphError::OrphanChunk(orphan.id)),
            None => Ok(()),
        }
    }

    /// Get a chunk by ID
    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(&id)
    }

    /// Live chunks in id order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Get a group by ID
    pub fn group(&self, id: GroupId) -> Option<&ChunkGroup> {
        self.groups.get(id.index())
    }

    /// Look up a group by name
    pub fn group_by_name(&self, name: &str) -> Option<&ChunkGroup> {
        self.name_to_group.get(name).and_then(|&id| self.group(id))
    }

    /// All groups in insertion order
    pub fn groups(&self) -> impl Iterator<Item = &ChunkGroup> {
        self.groups.iter()
    }

    /// Get a module by ID
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Get a module ID from its identifier
    pub fn module_id(&self, identifier: &str) -> Option<ModuleId> {
        self.identifier_to_id.get(identifier).copied()
    }

    /// Number of registered modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Total number of live chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if the graph has no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Count of distinct groups owning `chunk` (0 for unknown chunks)
    pub fn number_of_groups(&self, chunk: ChunkId) -> usize {
        self.groups_of(chunk).len()
    }

    /// Groups owning `chunk` (empty for unknown chunks)
    pub fn groups_of(&self, chunk: ChunkId) -> &BTreeSet<GroupId> {
        match self.chunks.get(&chunk) {
            Some(c) => &c.groups,
            None => &NO_GROUPS,
        }
    }

    /// Check if `chunk` is loaded by at least one entry group
    pub fn is_in_any_entry_group(&self, chunk: ChunkId) -> bool {
        self.groups_of(chunk)
            .iter()
            .any(|&g| self.group(g).is_some_and(ChunkGroup::is_entry))
    }

    /// Sum of the sizes of the modules in `chunk`
    pub fn modules_size(&self, chunk: ChunkId) -> u64 {
        self.chunks.get(&chunk).map_or(0, |c| {
            c.modules
                .iter()
                .filter_map(|m| self.modules.get(m))
                .map(|m| m.size)
                .sum()
        })
    }

    /// Check whether `source` may be folded into `target`.
    ///
    /// Conservative: unknown chunks, self-integration, and chunks holding an
    /// entry module are all rejected. When exactly one side carries the
    /// runtime, the other side's groups must already be able to reach it.
    pub fn can_integrate(&self, source: ChunkId, target: ChunkId) -> bool {
        if source == target {
            return false;
        }
        let (Some(a), Some(b)) = (self.chunks.get(&source), self.chunks.get(&target)) else {
            return false;
        };

        if a.has_entry_module() || b.has_entry_module() {
            return false;
        }

        if a.has_runtime != b.has_runtime {
            let (with_runtime, without_runtime) = if a.has_runtime { (a, b) } else { (b, a) };
            return self.is_runtime_available(with_runtime, without_runtime);
        }

        true
    }

    /// Check that every group loading `other` has the runtime of `runtime`
    /// available, either directly or through a parent. Reaching an entry
    /// group or a parentless group that lacks it fails the check.
    fn is_runtime_available(&self, runtime: &Chunk, other: &Chunk) -> bool {
        let mut visited: BTreeSet<GroupId> = other.groups.clone();
        let mut queue: Vec<GroupId> = other.groups.iter().copied().collect();

        while let Some(id) = queue.pop() {
            if runtime.groups.contains(&id) {
                continue;
            }
            let Some(group) = self.group(id) else {
                return false;
            };
            // A root that lacks the runtime can never reach it
            if group.is_entry() || group.parents.is_empty() {
                return false;
            }
            for &parent in &group.parents {
                if visited.insert(parent) {
                    queue.push(parent);
                }
            }
        }

        true
    }

    /// Fold `source` into `target`.
    ///
    /// Moves every module of `source` into `target` and hands over each of
    /// its group memberships. All lookups happen before the first write, so
    /// a failed call leaves the graph untouched. `source` is left empty and
    /// groupless; the caller removes it with [`ChunkGraph::remove_chunk`].
    pub fn integrate(&mut self, target: ChunkId, source: ChunkId) -> Result<(), GraphError> {
        if target == source {
            return Err(GraphError::SelfIntegration(source));
        }
        if !self.chunks.contains_key(&target) {
            return Err(GraphError::UnknownChunk(target));
        }
        let source_chunk = self
            .chunks
            .get_mut(&source)
            .ok_or(GraphError::UnknownChunk(source))?;

        let modules = std::mem::take(&mut source_chunk.modules);
        let groups = std::mem::take(&mut source_chunk.groups);
        let name = source_chunk.name.take();
        let entry_module = source_chunk.entry_module.take();
        let had_runtime = std::mem::replace(&mut source_chunk.has_runtime, false);

        for &group in &groups {
            if let Some(g) = self.groups.get_mut(group.index()) {
                g.replace_chunk(source, target);
            }
        }

        if let Some(target_chunk) = self.chunks.get_mut(&target) {
            debug!(
                "Integrating {} ({} modules) into {}",
                source,
                modules.len(),
                target_chunk.label()
            );
            target_chunk.modules.extend(modules);
            target_chunk.groups.extend(groups);
            target_chunk.name = chunk::merged_name(target_chunk.name.take(), name);
            target_chunk.has_runtime |= had_runtime;
            if target_chunk.entry_module.is_none() {
                target_chunk.entry_module = entry_module;
            }
        }

        Ok(())
    }

    /// Remove a chunk from the graph and from every group that lists it
    pub fn remove_chunk(&mut self, id: ChunkId) -> Option<Chunk> {
        let chunk = self.chunks.remove(&id)?;

        for &group in &chunk.groups {
            if let Some(g) = self.groups.get_mut(group.index()) {
                g.remove_chunk(id);
            }
        }

        Some(chunk)
    }
}
