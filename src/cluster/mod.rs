//! Community detection module

pub mod detection;
pub mod metrics;

pub use detection::detect_communities;
pub use metrics::community_stats;

use serde::{Deserialize, Serialize};

/// Opaque community label, valid only within one (run, level) pair.
///
/// Labels are not stable and not comparable across levels or across
/// independent runs; the newtype keeps them from being mixed with other
/// integer identifiers by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub u32);

/// Size-distribution summary of one membership assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityStats {
    /// Count of distinct community labels present.
    pub num_communities: usize,

    /// Community sizes, sorted descending.
    pub sizes: Vec<usize>,

    /// Size of the largest community (0 when empty).
    pub largest: usize,

    /// Size of the smallest community (0 when empty).
    pub smallest: usize,

    /// Mean community size; 0 when there are no communities.
    pub mean_size: f64,
}
