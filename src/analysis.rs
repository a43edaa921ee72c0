//! Community analysis pipeline
//!
//! Extracts the artist/genre network from the store, builds the combined
//! undirected graph, runs detection at every configured resolution, and emits
//! one assignment row per artist. Joining rows back to artist metadata is the
//! job of a downstream aggregation stage, not this crate.

use crate::cluster::{community_stats, detect_communities, CommunityId};
use crate::config::DetectionConfig;
use crate::error::{AnalysisError, StoreError};
use crate::graph::{build_graph, NodeRecord};
use crate::store::{statements, GraphStore};
use serde_json::{json, Value};

/// One emitted row per artist: id, name, and an opaque community label per
/// configured resolution (column order follows the resolution list).
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentRow {
    pub artist_id: String,
    pub artist_name: String,
    pub communities: Vec<CommunityId>,
}

impl AssignmentRow {
    /// JSON object with `artist_id`, `artist_name` and `community_L0..L{k-1}`
    /// keys.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("artist_id".to_string(), json!(self.artist_id));
        map.insert("artist_name".to_string(), json!(self.artist_name));
        for (level, community) in self.communities.iter().enumerate() {
            map.insert(format!("community_L{level}"), json!(community));
        }
        Value::Object(map)
    }
}

/// Run the full extraction + detection pipeline.
pub fn detect_artist_communities<S: GraphStore>(
    store: &S,
    config: &DetectionConfig,
) -> Result<Vec<AssignmentRow>, AnalysisError> {
    log::info!("Extracting graph data from the store...");

    let artists = extract_nodes(store, statements::MATCH_ARTISTS, "artist")?;
    log::info!("  Extracted {} artists", artists.len());

    let genres = extract_nodes(store, statements::MATCH_GENRES, "genre")?;
    log::info!("  Extracted {} genres", genres.len());

    let similar_edges = extract_edges(store, statements::MATCH_SIMILAR_EDGES)?;
    log::info!("  Extracted {} SIMILAR_TO edges", similar_edges.len());

    let genre_edges = extract_edges(store, statements::MATCH_PLAYS_GENRE_EDGES)?;
    log::info!("  Extracted {} PLAYS_GENRE edges", genre_edges.len());

    // One combined graph: similarity and genre membership both contribute.
    let mut nodes = artists;
    nodes.extend(genres);
    let mut edges = similar_edges;
    edges.extend(genre_edges);

    log::info!(
        "Building graph with {} nodes and {} edges",
        nodes.len(),
        edges.len()
    );
    let (graph, _) = build_graph(&nodes, &edges, "id", &["name", "type"])?;
    log::info!(
        "Graph built: {} vertices, {} edges",
        graph.vertex_count(),
        graph.edge_count
    );

    let memberships = detect_communities(&graph, config)?;

    for (level, membership) in memberships.iter().enumerate() {
        let stats = community_stats(membership);
        log::info!(
            "  Level {}: {} communities, largest={}, mean={:.1}",
            level,
            stats.num_communities,
            stats.largest,
            stats.mean_size
        );
    }

    let mut rows = Vec::new();
    for vertex in 0..graph.vertex_count() {
        if graph.attr(vertex, "type") != &json!("artist") {
            continue;
        }
        let artist_name = graph
            .attr(vertex, "name")
            .as_str()
            .unwrap_or_default()
            .to_string();
        rows.push(AssignmentRow {
            artist_id: graph.vertex_ids[vertex].clone(),
            artist_name,
            communities: memberships
                .iter()
                .map(|membership| CommunityId(membership[vertex]))
                .collect(),
        });
    }

    log::info!("Created assignments for {} artists", rows.len());
    Ok(rows)
}

/// Fetch node records, tagging each with its entity type.
fn extract_nodes<S: GraphStore>(
    store: &S,
    statement: &str,
    node_type: &str,
) -> Result<Vec<NodeRecord>, StoreError> {
    let result = store.run(statement, &[], true)?;
    Ok(result
        .rows
        .into_iter()
        .map(|mut record| {
            record.insert("type".to_string(), json!(node_type));
            record
        })
        .collect())
}

/// Fetch (source, target) id pairs; rows without string endpoints are skipped.
fn extract_edges<S: GraphStore>(
    store: &S,
    statement: &str,
) -> Result<Vec<(String, String)>, StoreError> {
    let result = store.run(statement, &[], true)?;
    Ok(result
        .rows
        .iter()
        .filter_map(|row| {
            let source = row.get("source")?.as_str()?;
            let target = row.get("target")?.as_str()?;
            Some((source.to_string(), target.to_string()))
        })
        .collect())
}
