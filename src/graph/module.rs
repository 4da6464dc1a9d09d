//! Modules referenced by chunks

use std::fmt;

/// Unique identifier for a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub(super) u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A module as seen by the chunk graph
///
/// Modules are immutable once registered. Chunks only hold their ids, so
/// moving a module between chunks never copies its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Resource identifier, usually the path relative to the project root
    pub identifier: String,

    /// Size in bytes of the module's generated code
    pub size: u64,
}

impl Module {
    pub fn new(identifier: impl Into<String>, size: u64) -> Self {
        Self {
            identifier: identifier.into(),
            size,
        }
    }
}
