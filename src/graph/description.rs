//! Serializable description of a chunk graph
//!
//! This is the exchange format with the pipeline around the consolidation
//! pass: the splitting pass hands over a description, and the optimized
//! graph is written back in the same shape.

use serde::{Deserialize, Serialize};

use super::{ChunkGraph, ChunkId, GraphError, GroupKind, Module};

/// Complete graph description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDescription {
    #[serde(default)]
    pub modules: Vec<ModuleDescription>,

    #[serde(default)]
    pub chunks: Vec<ChunkDescription>,

    #[serde(default)]
    pub groups: Vec<GroupDescription>,
}

/// A module and its size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescription {
    pub identifier: String,
    pub size: u64,
}

/// A chunk and the identifiers of its modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDescription {
    pub id: ChunkId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub modules: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_module: Option<String>,

    #[serde(default)]
    pub runtime: bool,
}

/// A chunk group, its member chunks in load order, and its parents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDescription {
    pub name: String,

    /// Entry point group (as opposed to an async import point)
    #[serde(default)]
    pub entry: bool,

    #[serde(default)]
    pub chunks: Vec<ChunkId>,

    #[serde(default)]
    pub parents: Vec<String>,
}

impl ChunkGraph {
    /// Build a graph from its description, validating every reference
    pub fn from_description(description: &GraphDescription) -> Result<Self, GraphError> {
        let mut graph = ChunkGraph::new();

        for module in &description.modules {
            if graph.module_id(&module.identifier).is_some() {
                return Err(GraphError::DuplicateModule(module.identifier.clone()));
            }
            graph.add_module(Module::new(module.identifier.clone(), module.size));
        }

        for chunk in &description.chunks {
            graph.add_chunk(chunk.id, chunk.name.clone())?;

            for identifier in &chunk.modules {
                let module = graph
                    .module_id(identifier)
                    .ok_or_else(|| GraphError::UnknownModule(identifier.clone()))?;
                graph.connect_chunk_and_module(chunk.id, module)?;
            }

            if let Some(identifier) = &chunk.entry_module {
                let module = graph
                    .module_id(identifier)
                    .ok_or_else(|| GraphError::UnknownModule(identifier.clone()))?;
                graph.set_entry_module(chunk.id, module)?;
            }

            graph.set_runtime(chunk.id, chunk.runtime)?;
        }

        // Groups first, then parent links, so parents may be declared in any order
        for group in &description.groups {
            let kind = if group.entry {
                GroupKind::Entry
            } else {
                GroupKind::Async
            };
            let id = graph.add_group(&group.name, kind)?;

            for &chunk in &group.chunks {
                graph.connect_chunk_and_group(chunk, id)?;
            }
        }

        for group in &description.groups {
            let child = graph.group_id(&group.name)?;
            for parent in &group.parents {
                let parent = graph.group_id(parent)?;
                graph.add_group_parent(child, parent)?;
            }
        }

        graph.validate()?;

        Ok(graph)
    }

    fn group_id(&self, name: &str) -> Result<super::GroupId, GraphError> {
        self.group_by_name(name)
            .map(|g| g.id)
            .ok_or_else(|| GraphError::UnknownGroup(name.to_string()))
    }

    /// Describe the current graph state
    pub fn to_description(&self) -> GraphDescription {
        let identifier = |id| self.module(id).map(|m: &Module| m.identifier.clone());

        let modules = self
            .modules
            .values()
            .map(|m| ModuleDescription {
                identifier: m.identifier.clone(),
                size: m.size,
            })
            .collect();

        let chunks = self
            .chunks()
            .map(|chunk| ChunkDescription {
                id: chunk.id,
                name: chunk.name.clone(),
                modules: chunk.modules().iter().filter_map(|&m| identifier(m)).collect(),
                entry_module: chunk.entry_module.and_then(identifier),
                runtime: chunk.has_runtime,
            })
            .collect();

        let groups = self
            .groups()
            .map(|group| GroupDescription {
                name: group.name.clone(),
                entry: group.is_entry(),
                chunks: group.chunks().to_vec(),
                parents: group
                    .parents()
                    .iter()
                    .filter_map(|&p| self.group(p).map(|g| g.name.clone()))
                    .collect(),
            })
            .collect();

        GraphDescription {
            modules,
            chunks,
            groups,
        }
    }
}
