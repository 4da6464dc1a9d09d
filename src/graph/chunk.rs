//! Chunks: the deployable bundle units of the graph

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GroupId, ModuleId};

/// Stable identifier of a chunk
///
/// Chunk identifiers define the total order used for every tie-break in the
/// consolidation pass, so iteration over chunks is always in id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub u32);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A chunk is a set of modules that will be bundled and requested together
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk identifier
    pub id: ChunkId,

    /// Optional chunk name (used for output filenames downstream)
    pub name: Option<String>,

    /// Module that bootstraps an entry point, if this chunk holds one
    pub entry_module: Option<ModuleId>,

    /// Whether this chunk carries the module loading runtime
    pub has_runtime: bool,

    /// Modules included in this chunk
    pub(super) modules: BTreeSet<ModuleId>,

    /// Groups that load this chunk
    pub(super) groups: BTreeSet<GroupId>,
}

impl Chunk {
    /// Create an empty chunk that belongs to no group yet
    pub fn new(id: ChunkId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            entry_module: None,
            has_runtime: false,
            modules: BTreeSet::new(),
            groups: BTreeSet::new(),
        }
    }

    /// Modules included in this chunk
    pub fn modules(&self) -> &BTreeSet<ModuleId> {
        &self.modules
    }

    /// Groups that load this chunk
    pub fn groups(&self) -> &BTreeSet<GroupId> {
        &self.groups
    }

    pub fn contains_module(&self, module: ModuleId) -> bool {
        self.modules.contains(&module)
    }

    pub fn has_entry_module(&self) -> bool {
        self.entry_module.is_some()
    }

    /// Check if chunk is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of modules in chunk
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Display label: the name when present, otherwise the id
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.id),
            None => self.id.to_string(),
        }
    }
}

/// Pick the name a chunk keeps after absorbing another one.
///
/// When both are named the shorter name wins, falling back to lexical order
/// on equal length; an unnamed target adopts the source's name.
pub(super) fn merged_name(target: Option<String>, source: Option<String>) -> Option<String> {
    match (target, source) {
        (Some(a), Some(b)) => {
            if (b.len(), &b) < (a.len(), &a) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (None, b) => b,
        (a, None) => a,
    }
}
