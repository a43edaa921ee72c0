//! Configuration for community detection and store mutations
//!
//! All configuration is constructed by the caller and passed in explicitly;
//! the crate reads no global state.

use std::time::Duration;

/// Default batch size for bounded destructive operations.
pub const DEFAULT_CLEAR_BATCH_SIZE: i64 = 10_000;

/// Configuration for multi-resolution community detection.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Resolution parameters, one detection pass per entry.
    ///
    /// The output membership arrays preserve this order. Each resolution is
    /// detected fully independently; any hierarchy across levels is a
    /// convention of how the caller orders this list, not something the
    /// detector verifies.
    pub resolutions: Vec<f64>,

    /// Seed for the detection RNG. Identical (graph, resolution, seed)
    /// triples produce identical membership arrays.
    pub seed: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            resolutions: vec![0.5, 1.0, 2.0],
            seed: 42,
        }
    }
}

impl DetectionConfig {
    /// Create a new configuration with custom values
    pub fn new(resolutions: Vec<f64>, seed: u64) -> Self {
        Self { resolutions, seed }
    }
}

/// Retry behavior for transient store failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,

    /// Sleep before retry `n` is `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a new policy with custom values
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never sleeps, for tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
        }
    }
}

/// Connection settings for the Neo4j-backed store adapter.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
        }
    }
}
