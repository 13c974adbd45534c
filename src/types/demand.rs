//! Pending pickup demand and sack/volume conversions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{self, GeoPoint};

/// Weight of one small sack (tons). 50 kg.
pub const SMALL_SACK_TONS: f64 = 0.05;

/// Weight of one large sack (tons). 100 kg.
pub const LARGE_SACK_TONS: f64 = 0.1;

/// An unassigned pickup request as supplied by the pickup store.
///
/// Immutable per tick: the engine reads it, never writes it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDemand {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub small_sacks: u32,
    pub large_sacks: u32,
    pub total_volume_tons: f64,
    pub created_at: DateTime<Utc>,
}

impl PendingDemand {
    /// Build a demand record whose volume is derived from its sack counts.
    pub fn from_sacks(
        id: impl Into<String>,
        location: GeoPoint,
        small_sacks: u32,
        large_sacks: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            latitude: location.latitude,
            longitude: location.longitude,
            small_sacks,
            large_sacks,
            total_volume_tons: volume_from_sacks(small_sacks, large_sacks),
            created_at,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Reason this record must be skipped, or `None` if it is usable.
    pub fn validation_issue(&self) -> Option<String> {
        if !geo::is_valid_coordinate(self.latitude, self.longitude) {
            return Some(format!(
                "invalid coordinates ({}, {})",
                self.latitude, self.longitude
            ));
        }
        if !self.total_volume_tons.is_finite() || self.total_volume_tons <= 0.0 {
            return Some(format!(
                "non-positive volume {} tons",
                self.total_volume_tons
            ));
        }
        None
    }
}

/// Sack counts attached to a cluster or tender
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SackCounts {
    pub small: u32,
    pub large: u32,
}

impl SackCounts {
    pub const fn new(small: u32, large: u32) -> Self {
        Self { small, large }
    }
}

/// Total weight of a sack mix (tons)
pub fn volume_from_sacks(small_sacks: u32, large_sacks: u32) -> f64 {
    f64::from(small_sacks) * SMALL_SACK_TONS + f64::from(large_sacks) * LARGE_SACK_TONS
}

/// Estimate a sack mix for a bare volume, filling large sacks first.
pub fn sacks_from_volume(volume_tons: f64) -> SackCounts {
    if !volume_tons.is_finite() || volume_tons <= 0.0 {
        return SackCounts::default();
    }

    // Small epsilon so 0.3 / 0.1 does not floor to 2
    let large = (volume_tons / LARGE_SACK_TONS + 1e-9).floor();
    let remaining = (volume_tons - large * LARGE_SACK_TONS).max(0.0);
    let small = (remaining / SMALL_SACK_TONS - 1e-9).ceil().max(0.0);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    SackCounts::new(small as u32, large as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand(lat: f64, lon: f64, volume: f64) -> PendingDemand {
        PendingDemand {
            id: "d-1".to_string(),
            latitude: lat,
            longitude: lon,
            small_sacks: 0,
            large_sacks: 0,
            total_volume_tons: volume,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_volume_from_sacks() {
        assert!((volume_from_sacks(5, 2) - 0.45).abs() < 1e-9);
        assert_eq!(volume_from_sacks(0, 0), 0.0);
    }

    #[test]
    fn test_sacks_from_volume_prefers_large() {
        assert_eq!(sacks_from_volume(0.3), SackCounts::new(0, 3));
        assert_eq!(sacks_from_volume(0.35), SackCounts::new(1, 3));
        assert_eq!(sacks_from_volume(2.5), SackCounts::new(0, 25));
        assert_eq!(sacks_from_volume(0.0), SackCounts::default());
        assert_eq!(sacks_from_volume(-1.0), SackCounts::default());
    }

    #[test]
    fn test_from_sacks_computes_volume() {
        let d = PendingDemand::from_sacks("x", GeoPoint::new(-6.8, 39.2), 10, 1, Utc::now());
        assert!((d.total_volume_tons - 0.6).abs() < 1e-9);
        assert!(d.validation_issue().is_none());
    }

    #[test]
    fn test_validation_issues() {
        assert!(demand(-6.8, 39.27, 0.5).validation_issue().is_none());
        assert!(demand(95.0, 39.27, 0.5).validation_issue().is_some());
        assert!(demand(-6.8, 39.27, 0.0).validation_issue().is_some());
        assert!(demand(-6.8, 39.27, f64::NAN).validation_issue().is_some());
    }
}
