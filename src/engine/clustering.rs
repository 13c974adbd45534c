//! Greedy leader-based demand clustering
//!
//! Demand is visited in ascending id order. Each unvisited item becomes the
//! leader of a new cluster and absorbs every other unvisited item within the
//! radius of the leader's own coordinate (not a running centroid). Clusters
//! are disjoint and the result depends only on the set of ids and positions.
//!
//! Cost is O(n²) in the number of pending items, which is fine for the low
//! hundreds seen per tick. A density-based strategy can be dropped in behind
//! [`ClusterStrategy`] without touching classification or synthesis.

use serde::Serialize;

use crate::geo::GeoPoint;
use crate::types::{PendingDemand, SackCounts};

/// A transient group of pending demand served by one tender
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Id of the leader item whose coordinate is the center
    pub leader_id: String,
    pub center: GeoPoint,
    pub members: Vec<PendingDemand>,
    pub total_volume_tons: f64,
    pub total_small_sacks: u32,
    pub total_large_sacks: u32,
}

impl Cluster {
    fn seed(leader: &PendingDemand) -> Self {
        Self {
            leader_id: leader.id.clone(),
            center: leader.location(),
            members: vec![leader.clone()],
            total_volume_tons: leader.total_volume_tons,
            total_small_sacks: leader.small_sacks,
            total_large_sacks: leader.large_sacks,
        }
    }

    fn absorb(&mut self, item: &PendingDemand) {
        self.total_volume_tons += item.total_volume_tons;
        self.total_small_sacks = self.total_small_sacks.saturating_add(item.small_sacks);
        self.total_large_sacks = self.total_large_sacks.saturating_add(item.large_sacks);
        self.members.push(item.clone());
    }

    pub const fn sack_counts(&self) -> SackCounts {
        SackCounts::new(self.total_small_sacks, self.total_large_sacks)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Pluggable demand grouping
pub trait ClusterStrategy: Send + Sync {
    /// Partition `demand` into disjoint clusters of radius `radius_km`.
    fn cluster(&self, demand: &[PendingDemand], radius_km: f64) -> Vec<Cluster>;

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}

/// Single-pass greedy clustering around the first unvisited item
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderClustering;

impl ClusterStrategy for LeaderClustering {
    fn cluster(&self, demand: &[PendingDemand], radius_km: f64) -> Vec<Cluster> {
        let mut ordered: Vec<&PendingDemand> = demand.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let mut processed = vec![false; ordered.len()];
        let mut clusters = Vec::new();

        for i in 0..ordered.len() {
            if processed[i] {
                continue;
            }
            processed[i] = true;

            let leader = ordered[i];
            let center = leader.location();
            let mut cluster = Cluster::seed(leader);

            // Everything before `i` is already processed
            for j in (i + 1)..ordered.len() {
                if processed[j] {
                    continue;
                }
                if center.distance_km_to(&ordered[j].location()) <= radius_km {
                    cluster.absorb(ordered[j]);
                    processed[j] = true;
                }
            }

            clusters.push(cluster);
        }

        clusters
    }

    fn name(&self) -> &'static str {
        "leader"
    }
}
