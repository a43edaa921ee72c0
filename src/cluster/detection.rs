//! Leiden-style community detection
//!
//! Seeded local-move passes improve a resolution-scaled modularity objective,
//! a refinement pass splits communities that ended up internally disconnected,
//! and communities are then aggregated into super-vertices until no further
//! merge happens.
//!
//! Reference: Traag et al., "From Louvain to Leiden: guaranteeing
//! well-connected communities", https://www.nature.com/articles/s41598-019-41695-z
//!
//! Two structural guarantees hold at every resolution: vertices only ever join
//! communities they share an edge with, so disconnected components are never
//! merged, and a vertex without incident edges always stays a singleton.

use crate::config::DetectionConfig;
use crate::error::AlgorithmError;
use crate::graph::EntityGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};

/// Upper bound on local-move sweeps per aggregation level.
const MAX_PASSES: usize = 100;

/// Minimum modularity gain for a move to count as an improvement.
const MIN_GAIN: f64 = 1e-9;

/// Run community detection once per configured resolution.
///
/// Returns one membership array per resolution, preserving input order; each
/// array has one entry per vertex. Identical (graph, resolution, seed) inputs
/// produce identical arrays. Any non-positive or non-finite resolution fails
/// the whole call before detection starts.
pub fn detect_communities(
    graph: &EntityGraph,
    config: &DetectionConfig,
) -> Result<Vec<Vec<u32>>, AlgorithmError> {
    for (position, &value) in config.resolutions.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(AlgorithmError::InvalidResolution { position, value });
        }
    }

    log::info!(
        "Running Leiden on {} vertices / {} edges at {} resolutions",
        graph.vertex_count(),
        graph.edge_count,
        config.resolutions.len()
    );

    // Resolutions are independent; each gets its own RNG seeded identically,
    // so parallel scheduling cannot affect the result.
    let memberships = config
        .resolutions
        .par_iter()
        .map(|&resolution| leiden(graph, resolution, config.seed))
        .collect();

    Ok(memberships)
}

/// Working graph for one aggregation level.
///
/// Parallel edges are collapsed into weights; intra-community edges collapse
/// into self-loop weight during aggregation. A vertex's strength is the sum of
/// its incident edge weights plus twice its self-loop weight.
struct LevelGraph {
    /// Per-vertex neighbor lists (no self entries), weights accumulated.
    adj: Vec<Vec<(u32, f64)>>,

    /// Self-loop weight per vertex.
    self_loops: Vec<f64>,

    /// Vertex strengths.
    strengths: Vec<f64>,

    /// Total edge weight m of the level graph.
    total_weight: f64,
}

impl LevelGraph {
    fn from_entity_graph(graph: &EntityGraph) -> Self {
        let n = graph.vertex_count();
        let mut adj = Vec::with_capacity(n);
        let mut self_loops = vec![0.0; n];

        for v in 0..n {
            let mut weights: BTreeMap<u32, f64> = BTreeMap::new();
            let mut self_entries = 0usize;
            for &nb in graph.neighbors(v) {
                if nb as usize == v {
                    self_entries += 1;
                } else {
                    *weights.entry(nb).or_insert(0.0) += 1.0;
                }
            }
            // A self-edge contributes two adjacency entries.
            self_loops[v] = self_entries as f64 / 2.0;
            adj.push(weights.into_iter().collect::<Vec<_>>());
        }

        Self::finish(adj, self_loops)
    }

    fn finish(adj: Vec<Vec<(u32, f64)>>, self_loops: Vec<f64>) -> Self {
        let strengths: Vec<f64> = adj
            .iter()
            .zip(&self_loops)
            .map(|(list, &sl)| list.iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * sl)
            .collect();
        let total_weight = strengths.iter().sum::<f64>() / 2.0;

        Self {
            adj,
            self_loops,
            strengths,
            total_weight,
        }
    }

    fn vertex_count(&self) -> usize {
        self.adj.len()
    }
}

/// Single-resolution Leiden run over the full aggregation hierarchy.
fn leiden(graph: &EntityGraph, resolution: f64, seed: u64) -> Vec<u32> {
    let n = graph.vertex_count();
    if n == 0 {
        return Vec::new();
    }

    let mut level = LevelGraph::from_entity_graph(graph);

    // Edgeless graph: every vertex is its own community.
    if level.total_weight <= 0.0 {
        return (0..n as u32).collect();
    }

    let mut rng = StdRng::seed_from_u64(seed);

    // Maps each original vertex to its node in the current level graph.
    let mut membership: Vec<u32> = (0..n as u32).collect();

    loop {
        let level_nodes = level.vertex_count();

        let mut communities = local_move(&level, resolution, &mut rng);
        split_disconnected(&level, &mut communities);
        let (labels, community_count) = renumber(&communities);

        for entry in membership.iter_mut() {
            *entry = labels[*entry as usize];
        }

        // No merge at this level means the partition is stable.
        if community_count == level_nodes {
            break;
        }

        level = aggregate(&level, &labels, community_count);
    }

    // Relabel in first-seen order over original vertices so labels do not
    // depend on the shape of the aggregation hierarchy.
    renumber(&membership.iter().map(|&c| c as usize).collect::<Vec<_>>()).0
}

/// Local moving phase: greedily move vertices to the neighboring community
/// with the best modularity gain until a full sweep makes no move.
///
/// Candidate communities are visited in ascending label order so tie-breaks
/// never depend on hash-map iteration order.
fn local_move(level: &LevelGraph, resolution: f64, rng: &mut StdRng) -> Vec<usize> {
    let n = level.vertex_count();
    let two_m = 2.0 * level.total_weight;

    let mut communities: Vec<usize> = (0..n).collect();
    let mut community_strength: Vec<f64> = level.strengths.clone();

    let mut order: Vec<usize> = (0..n).collect();

    for _pass in 0..MAX_PASSES {
        let mut moved = false;
        order.shuffle(rng);

        for &node in &order {
            if level.adj[node].is_empty() {
                continue;
            }

            let current = communities[node];
            let strength = level.strengths[node];

            // Edge weight from this node into each neighboring community.
            let mut weight_to: BTreeMap<usize, f64> = BTreeMap::new();
            for &(nb, w) in &level.adj[node] {
                *weight_to.entry(communities[nb as usize]).or_insert(0.0) += w;
            }

            // Evaluate with the node detached from its community.
            community_strength[current] -= strength;
            let weight_current = weight_to.get(&current).copied().unwrap_or(0.0);
            let stay_score =
                weight_current - resolution * strength * community_strength[current] / two_m;

            let mut best = current;
            let mut best_gain = 0.0;
            for (&candidate, &weight) in &weight_to {
                if candidate == current {
                    continue;
                }
                let score =
                    weight - resolution * strength * community_strength[candidate] / two_m;
                let gain = score - stay_score;
                if gain > best_gain + MIN_GAIN {
                    best_gain = gain;
                    best = candidate;
                }
            }

            communities[node] = best;
            community_strength[best] += strength;
            if best != current {
                moved = true;
            }
        }

        if !moved {
            break;
        }
    }

    communities
}

/// Refinement phase: split every community into its connected components.
///
/// Local moving can strand a community's members without an internal path
/// (the vertex that bridged them moved away); each stranded part gets a fresh
/// label so no final community is internally disconnected.
fn split_disconnected(level: &LevelGraph, communities: &mut [usize]) {
    let n = level.vertex_count();

    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (node, &c) in communities.iter().enumerate() {
        members.entry(c).or_default().push(node);
    }

    // Fresh labels above anything local moving could have produced.
    let mut next_label = n;

    for (label, nodes) in members {
        if nodes.len() <= 1 {
            continue;
        }

        let node_set: HashSet<usize> = nodes.iter().copied().collect();
        let mut visited: HashSet<usize> = HashSet::with_capacity(nodes.len());

        let mut first_component = true;
        for &seed_node in &nodes {
            if visited.contains(&seed_node) {
                continue;
            }

            // Flood fill one component within this community.
            let component_label = if first_component {
                label
            } else {
                let fresh = next_label;
                next_label += 1;
                fresh
            };
            first_component = false;

            let mut stack = vec![seed_node];
            visited.insert(seed_node);
            while let Some(node) = stack.pop() {
                communities[node] = component_label;
                for &(nb, _) in &level.adj[node] {
                    let nb = nb as usize;
                    if node_set.contains(&nb) && visited.insert(nb) {
                        stack.push(nb);
                    }
                }
            }
        }
    }
}

/// Renumber labels to be contiguous, in first-seen order.
fn renumber(communities: &[usize]) -> (Vec<u32>, usize) {
    let mut mapping: BTreeMap<usize, u32> = BTreeMap::new();
    let mut next_id = 0u32;

    let labels = communities
        .iter()
        .map(|&c| {
            *mapping.entry(c).or_insert_with(|| {
                let id = next_id;
                next_id += 1;
                id
            })
        })
        .collect();

    (labels, next_id as usize)
}

/// Aggregation phase: one super-vertex per community, inter-community weights
/// summed, intra-community weights collapsed into self-loops.
fn aggregate(level: &LevelGraph, labels: &[u32], community_count: usize) -> LevelGraph {
    let mut self_loops = vec![0.0; community_count];
    let mut weights: Vec<BTreeMap<u32, f64>> = vec![BTreeMap::new(); community_count];

    for node in 0..level.vertex_count() {
        let home = labels[node] as usize;
        self_loops[home] += level.self_loops[node];

        for &(nb, w) in &level.adj[node] {
            let other = labels[nb as usize] as usize;
            if other == home {
                // Each internal edge is seen from both endpoints; count once.
                if (nb as usize) > node {
                    self_loops[home] += w;
                }
            } else {
                *weights[home].entry(other as u32).or_insert(0.0) += w;
            }
        }
    }

    let adj = weights
        .into_iter()
        .map(|m| m.into_iter().collect::<Vec<_>>())
        .collect();

    LevelGraph::finish(adj, self_loops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_graph, NodeRecord};
    use serde_json::json;
    use std::collections::HashSet;

    fn graph_from(ids: &[&str], edges: &[(&str, &str)]) -> EntityGraph {
        let nodes: Vec<NodeRecord> = ids
            .iter()
            .map(|id| {
                let mut record = NodeRecord::new();
                record.insert("id".to_string(), json!(id));
                record
            })
            .collect();
        let edges: Vec<(String, String)> = edges
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        build_graph(&nodes, &edges, "id", &[]).unwrap().0
    }

    /// Two 10-vertex cliques with one bridging edge between them.
    fn bridged_cliques() -> EntityGraph {
        let ids: Vec<String> = (0..20).map(|i| format!("n{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let mut edges = Vec::new();
        for offset in [0, 10] {
            for i in offset..offset + 10 {
                for j in (i + 1)..offset + 10 {
                    edges.push((ids[i].clone(), ids[j].clone()));
                }
            }
        }
        edges.push((ids[0].clone(), ids[10].clone()));

        let edge_refs: Vec<(&str, &str)> = edges
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        graph_from(&id_refs, &edge_refs)
    }

    fn config(resolutions: &[f64]) -> DetectionConfig {
        DetectionConfig::new(resolutions.to_vec(), 42)
    }

    #[test]
    fn one_array_per_resolution_with_vertex_length() {
        let ids: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let edges: Vec<(String, String)> = (0..9)
            .map(|i| (i.to_string(), (i + 1).to_string()))
            .collect();
        let edge_refs: Vec<(&str, &str)> = edges
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        let graph = graph_from(&id_refs, &edge_refs);

        let memberships = detect_communities(&graph, &config(&[2.0, 1.0, 0.5])).unwrap();

        assert_eq!(memberships.len(), 3);
        for membership in &memberships {
            assert_eq!(membership.len(), 10);
        }
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let graph = bridged_cliques();
        let cfg = config(&[1.0]);

        let first = detect_communities(&graph, &cfg).unwrap();
        let second = detect_communities(&graph, &cfg).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn bridged_cliques_stay_in_separate_communities() {
        let graph = bridged_cliques();

        let memberships = detect_communities(&graph, &config(&[1.0, 2.0])).unwrap();

        for membership in &memberships {
            let left: HashSet<u32> = membership[..10].iter().copied().collect();
            let right: HashSet<u32> = membership[10..].iter().copied().collect();
            assert!(
                left.is_disjoint(&right),
                "clique vertices shared a community: {membership:?}"
            );
        }
    }

    #[test]
    fn higher_resolution_tends_toward_more_communities() {
        let graph = bridged_cliques();

        let memberships = detect_communities(&graph, &config(&[4.0, 1.0, 0.2])).unwrap();

        let count = |m: &[u32]| m.iter().collect::<HashSet<_>>().len();
        assert!(count(&memberships[0]) >= count(&memberships[2]));
    }

    #[test]
    fn disconnected_components_never_merge() {
        // Two triangles with no connection, at a resolution low enough to
        // favor large communities.
        let graph = graph_from(
            &["a", "b", "c", "x", "y", "z"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("x", "y"), ("y", "z"), ("z", "x")],
        );

        let memberships = detect_communities(&graph, &config(&[0.01])).unwrap();

        let left: HashSet<u32> = memberships[0][..3].iter().copied().collect();
        let right: HashSet<u32> = memberships[0][3..].iter().copied().collect();
        assert!(left.is_disjoint(&right));
    }

    #[test]
    fn isolated_vertex_forms_singleton() {
        let graph = graph_from(&["a", "b", "lone"], &[("a", "b")]);

        for resolution in [0.1, 1.0, 5.0] {
            let memberships = detect_communities(&graph, &config(&[resolution])).unwrap();
            let membership = &memberships[0];
            assert_ne!(membership[2], membership[0]);
            assert_ne!(membership[2], membership[1]);
        }
    }

    #[test]
    fn zero_vertex_graph_yields_empty_arrays() {
        let graph = graph_from(&[], &[]);

        let memberships = detect_communities(&graph, &config(&[0.5, 1.0])).unwrap();

        assert_eq!(memberships.len(), 2);
        assert!(memberships.iter().all(Vec::is_empty));
    }

    #[test]
    fn edgeless_graph_gives_all_singletons() {
        let graph = graph_from(&["a", "b", "c"], &[]);

        let memberships = detect_communities(&graph, &config(&[1.0])).unwrap();

        let distinct: HashSet<u32> = memberships[0].iter().copied().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn non_positive_resolution_fails_whole_call() {
        let graph = graph_from(&["a", "b"], &[("a", "b")]);

        for bad in [0.0, -0.5, f64::NAN] {
            let err = detect_communities(&graph, &config(&[1.0, bad])).unwrap_err();
            assert!(matches!(err, AlgorithmError::InvalidResolution { position: 1, .. }));
        }
    }
}
