//! Property tests for clustering and classification

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use tender_engine::engine::{ClusterStrategy, LeaderClustering, ThresholdTable};
use tender_engine::types::PendingDemand;

fn to_demand(points: &[(f64, f64, f64)]) -> Vec<PendingDemand> {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    points
        .iter()
        .enumerate()
        .map(|(i, &(lat, lon, volume))| PendingDemand {
            id: format!("d-{i:03}"),
            latitude: lat,
            longitude: lon,
            small_sacks: 1,
            large_sacks: 0,
            total_volume_tons: volume,
            created_at: created,
        })
        .collect()
}

fn points() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    // Greater Dar es Salaam, so clusters of every size appear
    prop::collection::vec((-7.0f64..-6.6, 39.0f64..39.5, 0.01f64..2.0), 0..60)
}

proptest! {
    #[test]
    fn clusters_partition_the_input(pts in points(), radius in 1.0f64..20.0) {
        let demand = to_demand(&pts);
        let clusters = LeaderClustering.cluster(&demand, radius);

        let mut seen = HashSet::new();
        for c in &clusters {
            for m in &c.members {
                prop_assert!(seen.insert(m.id.clone()), "{} in two clusters", m.id);
            }
        }
        prop_assert_eq!(seen.len(), demand.len());
    }

    #[test]
    fn members_lie_within_radius_of_leader(pts in points(), radius in 1.0f64..20.0) {
        let demand = to_demand(&pts);
        for c in LeaderClustering.cluster(&demand, radius) {
            prop_assert_eq!(&c.members[0].id, &c.leader_id);
            for m in &c.members {
                prop_assert!(c.center.distance_km_to(&m.location()) <= radius);
                prop_assert!(m.id >= c.leader_id);
            }
        }
    }

    #[test]
    fn cluster_totals_match_members(pts in points()) {
        let demand = to_demand(&pts);
        for c in LeaderClustering.cluster(&demand, 5.0) {
            let volume: f64 = c.members.iter().map(|m| m.total_volume_tons).sum();
            prop_assert!((c.total_volume_tons - volume).abs() < 1e-9);
            prop_assert_eq!(c.total_small_sacks as usize, c.members.len());
        }
    }

    #[test]
    fn result_ignores_input_order(pts in points()) {
        let demand = to_demand(&pts);
        let mut reversed = demand.clone();
        reversed.reverse();
        prop_assert_eq!(
            LeaderClustering.cluster(&demand, 5.0),
            LeaderClustering.cluster(&reversed, 5.0)
        );
    }

    #[test]
    fn classified_volume_lies_in_its_band(volume in 0.0f64..20.0) {
        let table = ThresholdTable::default();
        match table.band_for(volume) {
            Some(band) => {
                prop_assert!(band.min_volume_tons <= volume && volume <= band.max_volume_tons);
                prop_assert_eq!(table.classify(volume), Some(band.class));
            }
            None => prop_assert!(table.bands().iter().all(|b| !b.contains(volume))),
        }
    }
}
