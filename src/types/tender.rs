//! Tender record and its requirement bundles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SackCounts, TruckClass, VehicleType};
use crate::geo::GeoPoint;

/// Author recorded on every automated tender
pub const SYSTEM_CREATOR: &str = "SYSTEM";

/// Tender lifecycle. This engine only ever creates `Published`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderStatus {
    Draft,
    Published,
    Bidding,
    Awarded,
    InProgress,
    Completed,
    Cancelled,
}

/// What caused an automated tender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    /// A demand cluster reached a truck-class band
    VolumeThreshold,
    /// A special area hit its schedule or threshold
    SpecialArea,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerType::VolumeThreshold => write!(f, "VOLUME_THRESHOLD"),
            TriggerType::SpecialArea => write!(f, "SPECIAL_AREA"),
        }
    }
}

/// Circle a bidder must serve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub center: GeoPoint,
    pub radius_km: f64,
}

/// Environmental conditions attached to automated tenders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalRequirements {
    pub waste_segregation: bool,
    pub recycling_compliance: bool,
    pub environmental_impact: String,
    pub disposal_method: String,
}

impl Default for EnvironmentalRequirements {
    fn default() -> Self {
        Self {
            waste_segregation: true,
            recycling_compliance: true,
            environmental_impact: "MINIMAL".to_string(),
            disposal_method: "APPROVED_DUMP_SITE".to_string(),
        }
    }
}

/// Service-level expectations attached to automated tenders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityStandards {
    pub service_quality: String,
    pub response_time: String,
    pub customer_satisfaction: String,
    pub completion_rate: String,
}

impl Default for QualityStandards {
    fn default() -> Self {
        Self {
            service_quality: "HIGH".to_string(),
            response_time: "WITHIN_24_HOURS".to_string(),
            customer_satisfaction: "4_STARS_PLUS".to_string(),
            completion_rate: "95_PERCENT_PLUS".to_string(),
        }
    }
}

/// A fully specified automated procurement tender.
///
/// Created once per qualifying cluster or area; never mutated by the engine
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tender {
    pub tender_id: String,
    pub title: String,
    pub description: String,
    pub truck_class: TruckClass,
    pub vehicle_type: VehicleType,
    pub vehicle_capacity_tons: f64,
    pub volume_required: f64,
    pub sack_counts: SackCounts,
    pub service_area: ServiceArea,
    /// Pending-demand ids covered by this tender
    pub pickup_points: Vec<String>,
    pub estimated_budget: f64,
    pub bidding_deadline: DateTime<Utc>,
    pub service_start_date: DateTime<Utc>,
    pub service_end_date: DateTime<Utc>,
    pub status: TenderStatus,
    pub is_automated: bool,
    pub trigger_type: TriggerType,
    pub special_area_id: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub environmental_requirements: EnvironmentalRequirements,
    pub quality_standards: QualityStandards,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bundles() {
        let env = EnvironmentalRequirements::default();
        assert!(env.waste_segregation);
        let q = QualityStandards::default();
        assert_eq!(q.response_time, "WITHIN_24_HOURS");
        assert_eq!(q.completion_rate, "95_PERCENT_PLUS");
    }

    #[test]
    fn test_partial_bundle_override_keeps_defaults() {
        let q: QualityStandards =
            serde_json::from_str(r#"{"response_time":"WITHIN_12_HOURS"}"#).unwrap();
        assert_eq!(q.response_time, "WITHIN_12_HOURS");
        assert_eq!(q.service_quality, "HIGH");
    }

    #[test]
    fn test_status_serde_name() {
        let s = serde_json::to_string(&TenderStatus::InProgress).unwrap();
        assert_eq!(s, "\"IN_PROGRESS\"");
    }
}
