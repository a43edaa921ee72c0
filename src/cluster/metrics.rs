//! Community statistics and metrics

use crate::cluster::CommunityStats;
use itertools::Itertools;

/// Summarize one membership assignment into size-distribution metrics.
///
/// Sizes are sorted descending. `mean_size` is only computed when at least one
/// community is present, so an empty membership never divides by zero.
pub fn community_stats(membership: &[u32]) -> CommunityStats {
    let sizes: Vec<usize> = membership
        .iter()
        .counts()
        .into_values()
        .sorted_unstable_by(|a, b| b.cmp(a))
        .collect();

    let num_communities = sizes.len();
    let largest = sizes.first().copied().unwrap_or(0);
    let smallest = sizes.last().copied().unwrap_or(0);
    let mean_size = if num_communities > 0 {
        membership.len() as f64 / num_communities as f64
    } else {
        0.0
    };

    CommunityStats {
        num_communities,
        sizes,
        largest,
        smallest,
        mean_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_mixed_partition() {
        let stats = community_stats(&[0, 0, 0, 1, 1, 2]);

        assert_eq!(stats.num_communities, 3);
        assert_eq!(stats.sizes, vec![3, 2, 1]);
        assert_eq!(stats.largest, 3);
        assert_eq!(stats.smallest, 1);
        assert_eq!(stats.mean_size, 2.0);
    }

    #[test]
    fn single_community() {
        let stats = community_stats(&[0, 0, 0, 0, 0]);

        assert_eq!(stats.num_communities, 1);
        assert_eq!(stats.largest, 5);
        assert_eq!(stats.smallest, 5);
        assert_eq!(stats.mean_size, 5.0);
    }

    #[test]
    fn empty_membership() {
        let stats = community_stats(&[]);

        assert_eq!(stats.num_communities, 0);
        assert_eq!(stats.largest, 0);
        assert_eq!(stats.smallest, 0);
        assert_eq!(stats.mean_size, 0.0);
        assert!(stats.sizes.is_empty());
    }
}
