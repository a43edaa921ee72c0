//! In-memory graph representation and construction module

pub mod builder;

pub use builder::{build_graph, GraphBuilder};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node record fetched from the store: arbitrary keyed attributes.
pub type NodeRecord = serde_json::Map<String, Value>;

/// Undirected graph over heterogeneous entities, built fresh per analysis run.
///
/// Vertices carry contiguous 0-based indices assigned in first-seen order of
/// their string ids. Adjacency uses the offsets/edges compressed-sparse layout;
/// each undirected edge is stored in both endpoint lists. Parallel edges are
/// kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityGraph {
    /// Original string ids, indexed by vertex.
    pub vertex_ids: Vec<String>,

    /// Per-vertex attribute maps, restricted to the keys requested at build
    /// time. Missing attributes are JSON null.
    pub attrs: Vec<NodeRecord>,

    /// Offset array: index where each vertex's neighbor list begins.
    /// offsets[v] to offsets[v+1] defines the neighbor range for vertex v.
    pub offsets: Vec<u32>,

    /// Neighbor array: concatenated neighbor lists.
    pub neighbors: Vec<u32>,

    /// Number of undirected edges kept during the build.
    pub edge_count: usize,
}

impl EntityGraph {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_ids.len()
    }

    /// Neighbors of a vertex, including duplicates for parallel edges.
    pub fn neighbors(&self, vertex: usize) -> &[u32] {
        let start = self.offsets[vertex] as usize;
        let end = self.offsets[vertex + 1] as usize;
        &self.neighbors[start..end]
    }

    /// Degree of a vertex (parallel edges counted once each).
    pub fn degree(&self, vertex: usize) -> usize {
        let start = self.offsets[vertex] as usize;
        let end = self.offsets[vertex + 1] as usize;
        end - start
    }

    /// Attribute value for a vertex, null if absent.
    pub fn attr(&self, vertex: usize, key: &str) -> &Value {
        self.attrs[vertex].get(key).unwrap_or(&Value::Null)
    }
}
