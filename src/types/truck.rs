//! Truck classes and the Threshold Table band definition

use serde::{Deserialize, Serialize};

/// Vehicle class a tender is scoped to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruckClass {
    SmallTruck,
    MediumTruck,
    LargeTruck,
}

impl TruckClass {
    /// Vehicle size category published on the tender
    pub const fn vehicle_type(self) -> VehicleType {
        match self {
            TruckClass::SmallTruck => VehicleType::Small,
            TruckClass::MediumTruck => VehicleType::Medium,
            TruckClass::LargeTruck => VehicleType::Large,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TruckClass::SmallTruck => "SMALL_TRUCK",
            TruckClass::MediumTruck => "MEDIUM_TRUCK",
            TruckClass::LargeTruck => "LARGE_TRUCK",
        }
    }
}

impl std::fmt::Display for TruckClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle size category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleType::Small => write!(f, "SMALL"),
            VehicleType::Medium => write!(f, "MEDIUM"),
            VehicleType::Large => write!(f, "LARGE"),
        }
    }
}

/// Inclusive count range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SackRange {
    pub min: u32,
    pub max: u32,
}

impl SackRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub const fn contains(&self, count: u32) -> bool {
        count >= self.min && count <= self.max
    }
}

/// One row of the Threshold Table.
///
/// A cluster whose total volume lies in `[min_volume_tons, max_volume_tons]`
/// (inclusive) is served by `class`. Bands never overlap; volumes between two
/// bands match nothing and simply keep accumulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckClassBand {
    pub class: TruckClass,
    /// Lower volume bound (tons, inclusive)
    pub min_volume_tons: f64,
    /// Upper volume bound (tons, inclusive)
    pub max_volume_tons: f64,
    /// Expected small-sack count for a full load
    pub small_sacks: SackRange,
    /// Expected large-sack count for a full load
    pub large_sacks: SackRange,
    /// Service radius around the cluster leader (km)
    pub radius_km: f64,
    /// Monitoring window for accumulation (hours)
    pub time_window_hours: u32,
    /// Nominal payload published on the tender (tons)
    pub vehicle_capacity_tons: f64,
}

impl TruckClassBand {
    pub fn contains(&self, volume_tons: f64) -> bool {
        volume_tons >= self.min_volume_tons && volume_tons <= self.max_volume_tons
    }

    pub fn small_truck() -> Self {
        Self {
            class: TruckClass::SmallTruck,
            min_volume_tons: 0.5,
            max_volume_tons: 1.0,
            small_sacks: SackRange::new(10, 20),
            large_sacks: SackRange::new(5, 10),
            radius_km: 5.0,
            time_window_hours: 24,
            vehicle_capacity_tons: 1.0,
        }
    }

    pub fn medium_truck() -> Self {
        Self {
            class: TruckClass::MediumTruck,
            min_volume_tons: 4.0,
            max_volume_tons: 8.0,
            small_sacks: SackRange::new(80, 160),
            large_sacks: SackRange::new(40, 80),
            radius_km: 12.0,
            time_window_hours: 48,
            vehicle_capacity_tons: 6.0,
        }
    }

    pub fn large_truck() -> Self {
        Self {
            class: TruckClass::LargeTruck,
            min_volume_tons: 8.0,
            max_volume_tons: 14.0,
            small_sacks: SackRange::new(160, 280),
            large_sacks: SackRange::new(80, 140),
            radius_km: 20.0,
            time_window_hours: 72,
            vehicle_capacity_tons: 11.0,
        }
    }

    /// The built-in small / medium / large table
    pub fn default_table() -> Vec<Self> {
        vec![Self::small_truck(), Self::medium_truck(), Self::large_truck()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_bounds_are_inclusive() {
        let small = TruckClassBand::small_truck();
        assert!(small.contains(0.5));
        assert!(small.contains(1.0));
        assert!(!small.contains(0.49));
        assert!(!small.contains(1.01));
    }

    #[test]
    fn test_truck_class_serde_names() {
        let json = serde_json::to_string(&TruckClass::MediumTruck).unwrap();
        assert_eq!(json, "\"MEDIUM_TRUCK\"");
        let back: TruckClass = serde_json::from_str("\"LARGE_TRUCK\"").unwrap();
        assert_eq!(back, TruckClass::LargeTruck);
    }

    #[test]
    fn test_vehicle_type_mapping() {
        assert_eq!(TruckClass::SmallTruck.vehicle_type(), VehicleType::Small);
        assert_eq!(TruckClass::LargeTruck.vehicle_type().to_string(), "LARGE");
    }

    #[test]
    fn test_sack_range() {
        let r = SackRange::new(10, 20);
        assert!(r.contains(10));
        assert!(r.contains(20));
        assert!(!r.contains(21));
    }
}
