//! Tender synthesis
//!
//! Turns a classified cluster or special area into a complete [`Tender`].
//! Everything except the tender id is a pure function of the request and
//! `now`, so re-running synthesis with the same inputs yields the same
//! budget, dates and content.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{defaults, RequirementsConfig};
use crate::geo::GeoPoint;
use crate::types::{
    AreaCategory, SackCounts, ServiceArea, Tender, TenderStatus, TriggerType, TruckClassBand,
    SYSTEM_CREATOR,
};

// ============================================================================
// Budget
// ============================================================================

/// Rate constants for the budget estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetRates {
    /// Per ton collected
    pub base_rate_per_ton: f64,
    /// Per km of service radius
    pub distance_rate_per_km: f64,
    /// Per ton disposed
    pub volume_rate_per_ton: f64,
}

impl Default for BudgetRates {
    fn default() -> Self {
        Self {
            base_rate_per_ton: defaults::BASE_RATE_PER_TON,
            distance_rate_per_km: defaults::DISTANCE_RATE_PER_KM,
            volume_rate_per_ton: defaults::VOLUME_RATE_PER_TON,
        }
    }
}

impl BudgetRates {
    /// `volume*base + radius*distance + volume*disposal`, rounded to whole units
    pub fn estimate(&self, volume_tons: f64, radius_km: f64) -> f64 {
        (volume_tons * self.base_rate_per_ton
            + radius_km * self.distance_rate_per_km
            + volume_tons * self.volume_rate_per_ton)
            .round()
    }
}

// ============================================================================
// Request
// ============================================================================

/// Identity of the special area a tender is raised for
#[derive(Debug, Clone, PartialEq)]
pub struct AreaLabel {
    pub id: String,
    pub name: String,
    pub category: AreaCategory,
}

/// Everything the synthesizer needs to know about one qualifying entity
#[derive(Debug, Clone)]
pub struct TenderRequest<'a> {
    pub band: &'a TruckClassBand,
    pub volume_tons: f64,
    pub sacks: SackCounts,
    pub center: GeoPoint,
    pub trigger: TriggerType,
    /// Demand ids served; empty for special areas
    pub pickup_points: Vec<String>,
    pub special_area: Option<AreaLabel>,
}

impl<'a> TenderRequest<'a> {
    /// Request for a demand cluster that reached `band`
    pub fn for_cluster(
        band: &'a TruckClassBand,
        volume_tons: f64,
        sacks: SackCounts,
        center: GeoPoint,
        pickup_points: Vec<String>,
    ) -> Self {
        Self {
            band,
            volume_tons,
            sacks,
            center,
            trigger: TriggerType::VolumeThreshold,
            pickup_points,
            special_area: None,
        }
    }

    /// Request for a special area; sack counts are estimated from volume
    pub fn for_special_area(
        band: &'a TruckClassBand,
        volume_tons: f64,
        center: GeoPoint,
        area: AreaLabel,
    ) -> Self {
        Self {
            band,
            volume_tons,
            sacks: crate::types::sacks_from_volume(volume_tons),
            center,
            trigger: TriggerType::SpecialArea,
            pickup_points: Vec::new(),
            special_area: Some(area),
        }
    }
}

// ============================================================================
// Synthesizer
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct TenderSynthesizer {
    rates: BudgetRates,
    requirements: RequirementsConfig,
}

impl TenderSynthesizer {
    pub fn new(rates: BudgetRates, requirements: RequirementsConfig) -> Self {
        Self { rates, requirements }
    }

    pub const fn rates(&self) -> &BudgetRates {
        &self.rates
    }

    /// Build a published tender with a freshly generated id.
    pub fn synthesize(&self, request: &TenderRequest<'_>, now: DateTime<Utc>) -> Tender {
        self.synthesize_with_id(request, now, generate_tender_id(now))
    }

    /// Build a published tender under a caller-supplied id.
    pub fn synthesize_with_id(
        &self,
        request: &TenderRequest<'_>,
        now: DateTime<Utc>,
        tender_id: String,
    ) -> Tender {
        let band = request.band;

        Tender {
            tender_id,
            title: title_for(request),
            description: description_for(request),
            truck_class: band.class,
            vehicle_type: band.class.vehicle_type(),
            vehicle_capacity_tons: band.vehicle_capacity_tons,
            volume_required: request.volume_tons,
            sack_counts: request.sacks,
            service_area: ServiceArea {
                center: request.center,
                radius_km: band.radius_km,
            },
            pickup_points: request.pickup_points.clone(),
            estimated_budget: self.rates.estimate(request.volume_tons, band.radius_km),
            bidding_deadline: now + Duration::hours(defaults::BIDDING_WINDOW_HOURS),
            service_start_date: now + Duration::hours(defaults::SERVICE_START_OFFSET_HOURS),
            service_end_date: now + Duration::hours(defaults::SERVICE_END_OFFSET_HOURS),
            status: TenderStatus::Published,
            is_automated: true,
            trigger_type: request.trigger,
            special_area_id: request.special_area.as_ref().map(|a| a.id.clone()),
            created_by: SYSTEM_CREATOR.to_string(),
            created_at: now,
            environmental_requirements: self.requirements.environmental.clone(),
            quality_standards: self.requirements.quality.clone(),
        }
    }
}

/// `TDR-<last 8 digits of epoch millis>-<8 random hex digits>`, uppercase.
///
/// Unique with overwhelming probability only; persistence must still
/// reject duplicates.
pub fn generate_tender_id(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().unsigned_abs().to_string();
    let digits = defaults::TENDER_ID_TIMESTAMP_DIGITS;
    let stamp = &millis[millis.len().saturating_sub(digits)..];
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}-{stamp}-{suffix:08X}", defaults::TENDER_ID_PREFIX)
}

fn title_for(request: &TenderRequest<'_>) -> String {
    match &request.special_area {
        Some(area) => format!("Garbage Collection Tender - {} ({})", area.name, area.category),
        None => format!(
            "Garbage Collection Tender - {} tons - {}",
            request.volume_tons, request.band.class
        ),
    }
}

fn description_for(request: &TenderRequest<'_>) -> String {
    let mut parts = vec![format!(
        "Collection of {:.2} tons of waste",
        request.volume_tons
    )];
    if request.sacks.small > 0 {
        parts.push(format!("{} small sacks", request.sacks.small));
    }
    if request.sacks.large > 0 {
        parts.push(format!("{} large sacks", request.sacks.large));
    }

    let source = match &request.special_area {
        Some(area) => format!("at {} ({})", area.name, area.category),
        None => format!("from {} pickup points", request.pickup_points.len()),
    };

    format!(
        "{} {source}. Requires a {} vehicle ({:.0} t capacity) serving a {:.0} km radius.",
        parts.join(", "),
        request.band.class.vehicle_type(),
        request.band.vehicle_capacity_tons,
        request.band.radius_km
    )
}
