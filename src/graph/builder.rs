//! Graph construction module

use crate::error::ValidationError;
use crate::graph::{EntityGraph, NodeRecord};
use serde_json::Value;
use std::collections::HashMap;

/// Builder for incrementally constructing an EntityGraph
pub struct GraphBuilder {
    /// Mapping from string ids to vertex indices
    id_index: HashMap<String, u32>,

    /// Vertex string ids in first-seen order
    vertex_ids: Vec<String>,

    /// Selected attributes per vertex
    attrs: Vec<NodeRecord>,

    /// Adjacency lists for each vertex (undirected: both endpoints)
    adjacency_lists: Vec<Vec<u32>>,

    /// Undirected edges kept so far
    edge_count: usize,

    /// Edges dropped because an endpoint id was unknown
    dropped_edges: usize,
}

impl GraphBuilder {
    /// Create a new graph builder with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id_index: HashMap::with_capacity(capacity),
            vertex_ids: Vec::with_capacity(capacity),
            attrs: Vec::with_capacity(capacity),
            adjacency_lists: Vec::with_capacity(capacity),
            edge_count: 0,
            dropped_edges: 0,
        }
    }

    /// Add a vertex from a node record.
    ///
    /// The id is read from `id_key` and must be a string not seen before in
    /// this build. Only the attributes named in `attr_keys` are copied onto
    /// the vertex; missing ones default to null.
    pub fn add_node(
        &mut self,
        record: &NodeRecord,
        id_key: &str,
        attr_keys: &[&str],
    ) -> Result<u32, ValidationError> {
        let id = match record.get(id_key) {
            Some(Value::String(id)) => id.clone(),
            _ => {
                return Err(ValidationError::MissingNodeId {
                    position: self.vertex_ids.len(),
                    id_key: id_key.to_string(),
                })
            }
        };

        if self.id_index.contains_key(&id) {
            return Err(ValidationError::DuplicateNodeId(id));
        }

        let idx = self.vertex_ids.len() as u32;
        self.id_index.insert(id.clone(), idx);
        self.vertex_ids.push(id);

        let mut selected = NodeRecord::new();
        for &key in attr_keys {
            let value = record.get(key).cloned().unwrap_or(Value::Null);
            selected.insert(key.to_string(), value);
        }
        self.attrs.push(selected);
        self.adjacency_lists.push(Vec::new());

        Ok(idx)
    }

    /// Add an undirected edge between two vertex ids.
    ///
    /// Returns false (and keeps the graph unchanged) when either endpoint is
    /// unknown; dangling edges are an expected side observation, not an error.
    pub fn add_edge(&mut self, source_id: &str, target_id: &str) -> bool {
        let (src, dst) = match (self.id_index.get(source_id), self.id_index.get(target_id)) {
            (Some(&src), Some(&dst)) => (src, dst),
            _ => {
                self.dropped_edges += 1;
                return false;
            }
        };

        self.adjacency_lists[src as usize].push(dst);
        self.adjacency_lists[dst as usize].push(src);
        self.edge_count += 1;
        true
    }

    /// Number of edges dropped so far because of unknown endpoints.
    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    /// Build the graph and the id -> index map.
    pub fn build(self) -> (EntityGraph, HashMap<String, u32>) {
        let vertex_count = self.vertex_ids.len();

        let mut offsets = Vec::with_capacity(vertex_count + 1);
        offsets.push(0u32);

        let mut offset = 0u32;
        for list in &self.adjacency_lists {
            offset += list.len() as u32;
            offsets.push(offset);
        }

        let mut neighbors = Vec::with_capacity(offset as usize);
        for list in &self.adjacency_lists {
            neighbors.extend_from_slice(list);
        }

        let graph = EntityGraph {
            vertex_ids: self.vertex_ids,
            attrs: self.attrs,
            offsets,
            neighbors,
            edge_count: self.edge_count,
        };

        (graph, self.id_index)
    }
}

/// Build an undirected graph from node records and edge pairs.
///
/// Vertex indices are contiguous and follow first-seen order of ids in
/// `nodes`. Duplicate ids fail the whole build. Edges whose endpoints are not
/// in the node list are silently dropped; the drop count is logged.
pub fn build_graph(
    nodes: &[NodeRecord],
    edges: &[(String, String)],
    id_key: &str,
    attr_keys: &[&str],
) -> Result<(EntityGraph, HashMap<String, u32>), ValidationError> {
    let mut builder = GraphBuilder::with_capacity(nodes.len());

    for record in nodes {
        builder.add_node(record, id_key, attr_keys)?;
    }

    for (source_id, target_id) in edges {
        builder.add_edge(source_id, target_id);
    }

    if builder.dropped_edges() > 0 {
        log::warn!(
            "Dropped {} edges referencing unknown node ids",
            builder.dropped_edges()
        );
    }

    let (graph, id_index) = builder.build();

    log::debug!(
        "Built graph with {} vertices and {} edges",
        graph.vertex_count(),
        graph.edge_count
    );

    Ok((graph, id_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> NodeRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn edge(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn builds_basic_graph() {
        let nodes = vec![
            record(&[("id", json!("A")), ("name", json!("Node A"))]),
            record(&[("id", json!("B")), ("name", json!("Node B"))]),
            record(&[("id", json!("C")), ("name", json!("Node C"))]),
        ];
        let edges = vec![edge("A", "B"), edge("B", "C")];

        let (graph, id_index) = build_graph(&nodes, &edges, "id", &["name"]).unwrap();

        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count, 2);
        assert_eq!(id_index["A"], 0);
        assert_eq!(id_index["B"], 1);
        assert_eq!(id_index["C"], 2);
        assert_eq!(graph.neighbors(1), &[0, 2]);
    }

    #[test]
    fn copies_requested_attributes() {
        let nodes = vec![
            record(&[
                ("id", json!("A")),
                ("name", json!("Node A")),
                ("type", json!("artist")),
            ]),
            record(&[("id", json!("B")), ("name", json!("Node B"))]),
        ];

        let (graph, _) = build_graph(&nodes, &[edge("A", "B")], "id", &["name", "type"]).unwrap();

        assert_eq!(graph.attr(0, "name"), &json!("Node A"));
        assert_eq!(graph.attr(0, "type"), &json!("artist"));
        // Missing attribute defaults to null instead of failing
        assert_eq!(graph.attr(1, "type"), &Value::Null);
    }

    #[test]
    fn drops_edges_with_unknown_endpoints() {
        let nodes = vec![
            record(&[("id", json!("A"))]),
            record(&[("id", json!("B"))]),
        ];
        let edges = vec![edge("A", "B"), edge("A", "C"), edge("D", "B")];

        let (graph, _) = build_graph(&nodes, &edges, "id", &[]).unwrap();

        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count, 1);
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let (graph, id_index) = build_graph(&[], &[], "id", &[]).unwrap();

        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.edge_count, 0);
        assert!(id_index.is_empty());
    }

    #[test]
    fn supports_custom_id_key() {
        let nodes = vec![
            record(&[("wikidata_id", json!("Q1")), ("name", json!("Entity 1"))]),
            record(&[("wikidata_id", json!("Q2")), ("name", json!("Entity 2"))]),
        ];

        let (graph, id_index) =
            build_graph(&nodes, &[edge("Q1", "Q2")], "wikidata_id", &["name"]).unwrap();

        assert_eq!(id_index["Q1"], 0);
        assert_eq!(id_index["Q2"], 1);
        assert_eq!(graph.vertex_ids[0], "Q1");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let nodes = vec![
            record(&[("id", json!("A"))]),
            record(&[("id", json!("A"))]),
        ];

        let err = build_graph(&nodes, &[], "id", &[]).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateNodeId("A".to_string()));
    }

    #[test]
    fn rejects_record_without_id() {
        let nodes = vec![record(&[("name", json!("nameless"))])];

        let err = build_graph(&nodes, &[], "id", &[]).unwrap_err();
        assert!(matches!(err, ValidationError::MissingNodeId { position: 0, .. }));
    }

    #[test]
    fn keeps_parallel_edges() {
        let nodes = vec![
            record(&[("id", json!("A"))]),
            record(&[("id", json!("B"))]),
        ];
        let edges = vec![edge("A", "B"), edge("A", "B")];

        let (graph, _) = build_graph(&nodes, &edges, "id", &[]).unwrap();

        assert_eq!(graph.edge_count, 2);
        assert_eq!(graph.neighbors(0), &[1, 1]);
    }
}
