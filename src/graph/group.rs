//! Chunk groups: the loading contexts of the graph

use std::collections::BTreeSet;
use std::fmt;

use super::ChunkId;

/// Index of a chunk group inside the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub(super) usize);

impl GroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Type of chunk group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Entry point - loaded on initial page load
    Entry,
    /// Async import point - loaded on demand via dynamic import
    Async,
}

/// The set of chunks that must be fetched together for one entry point or
/// one dynamic import
#[derive(Debug, Clone)]
pub struct ChunkGroup {
    pub id: GroupId,

    /// Group name, unique within the graph
    pub name: String,

    pub kind: GroupKind,

    /// Member chunks in load order
    pub(super) chunks: Vec<ChunkId>,

    pub(super) parents: BTreeSet<GroupId>,

    pub(super) children: BTreeSet<GroupId>,
}

impl ChunkGroup {
    pub(super) fn new(id: GroupId, name: String, kind: GroupKind) -> Self {
        Self {
            id,
            name,
            kind,
            chunks: Vec::new(),
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
        }
    }

    /// Check if this group is loaded on the initial request
    pub fn is_entry(&self) -> bool {
        self.kind == GroupKind::Entry
    }

    pub fn chunks(&self) -> &[ChunkId] {
        &self.chunks
    }

    pub fn parents(&self) -> &BTreeSet<GroupId> {
        &self.parents
    }

    pub fn children(&self) -> &BTreeSet<GroupId> {
        &self.children
    }

    pub fn contains_chunk(&self, chunk: ChunkId) -> bool {
        self.chunks.contains(&chunk)
    }

    /// Add a chunk at the end of the load order; returns false if present
    pub(super) fn push_chunk(&mut self, chunk: ChunkId) -> bool {
        if self.contains_chunk(chunk) {
            return false;
        }
        self.chunks.push(chunk);
        true
    }

    pub(super) fn remove_chunk(&mut self, chunk: ChunkId) -> bool {
        let before = self.chunks.len();
        self.chunks.retain(|&c| c != chunk);
        self.chunks.len() != before
    }

    /// Swap `old` for `new` in place.
    ///
    /// `new` takes over the slot of `old`. If `new` is already a member,
    /// `old` is dropped so the group never lists a chunk twice.
    pub(super) fn replace_chunk(&mut self, old: ChunkId, new: ChunkId) -> bool {
        let Some(pos) = self.chunks.iter().position(|&c| c == old) else {
            return false;
        };

        if self.contains_chunk(new) {
            self.chunks.remove(pos);
        } else {
            self.chunks[pos] = new;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with(chunks: &[u32]) -> ChunkGroup {
        let mut group = ChunkGroup::new(GroupId(0), "lazy".into(), GroupKind::Async);
        for &c in chunks {
            group.push_chunk(ChunkId(c));
        }
        group
    }

    #[test]
    fn test_replace_chunk_keeps_slot() {
        let mut group = group_with(&[1, 2, 3]);
        assert!(group.replace_chunk(ChunkId(2), ChunkId(9)));
        assert_eq!(group.chunks(), &[ChunkId(1), ChunkId(9), ChunkId(3)]);
    }

    #[test]
    fn test_replace_chunk_deduplicates() {
        let mut group = group_with(&[1, 2, 3]);
        assert!(group.replace_chunk(ChunkId(1), ChunkId(3)));
        assert_eq!(group.chunks(), &[ChunkId(2), ChunkId(3)]);
    }

    #[test]
    fn test_replace_missing_chunk() {
        let mut group = group_with(&[1]);
        assert!(!group.replace_chunk(ChunkId(5), ChunkId(1)));
        assert_eq!(group.chunks(), &[ChunkId(1)]);
    }

    #[test]
    fn test_push_chunk_is_idempotent() {
        let mut group = group_with(&[4]);
        assert!(!group.push_chunk(ChunkId(4)));
        assert_eq!(group.chunks().len(), 1);
    }
}
