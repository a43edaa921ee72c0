//! Core library for analyzing and safely mutating the music entity graph
//!
//! Two responsibilities: extracting the artist/genre network from a
//! property-graph store into an in-memory graph and running multi-resolution
//! community detection over it, and providing the retry-safe mutation
//! primitives (bounded batched deletes, best-effort schema cleanup) the
//! ingestion pipeline depends on. Fetchers, file writers, and other pipeline
//! stages live elsewhere and only consume what this crate produces.

pub mod analysis;
pub mod cluster;
pub mod config;
pub mod error;
pub mod graph;
pub mod store;

pub use analysis::{detect_artist_communities, AssignmentRow};
pub use cluster::{community_stats, detect_communities, CommunityId, CommunityStats};
pub use config::{DetectionConfig, RetryPolicy, StoreConfig, DEFAULT_CLEAR_BATCH_SIZE};
pub use error::{AlgorithmError, AnalysisError, StoreError, ValidationError};
pub use graph::{build_graph, EntityGraph, GraphBuilder, NodeRecord};
pub use store::{ConsumedResult, GraphStore, MutationExecutor, Neo4jStore, ParamValue};
