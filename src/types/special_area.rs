//! Special areas: registered high-volume zones with an independent cadence

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Kind of high-volume location
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaCategory {
    Market,
    Mall,
    Compound,
    HighVolumeLocation,
}

impl std::fmt::Display for AreaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaCategory::Market => write!(f, "MARKET"),
            AreaCategory::Mall => write!(f, "MALL"),
            AreaCategory::Compound => write!(f, "COMPOUND"),
            AreaCategory::HighVolumeLocation => write!(f, "HIGH_VOLUME_LOCATION"),
        }
    }
}

/// How often a special area is serviced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickupFrequency {
    #[default]
    Daily,
    TwiceDaily,
    Weekly,
    /// Operator-defined schedule; scheduled like `Daily`
    Custom,
}

impl PickupFrequency {
    /// Offset from one generated tender to the next scheduled one
    pub fn interval(self) -> Duration {
        match self {
            PickupFrequency::Daily | PickupFrequency::Custom => Duration::hours(24),
            PickupFrequency::TwiceDaily => Duration::hours(12),
            PickupFrequency::Weekly => Duration::hours(168),
        }
    }
}

/// A registered special area as stored by the area registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialArea {
    pub id: String,
    pub name: String,
    pub category: AreaCategory,
    pub location: GeoPoint,
    /// Accrued volume that forces a tender regardless of schedule (tons)
    pub tender_threshold: f64,
    pub pickup_frequency: PickupFrequency,
    pub is_active: bool,
    pub automatic_tender_enabled: bool,
    pub last_tender_generated: Option<DateTime<Utc>>,
    pub next_tender_date: Option<DateTime<Utc>>,
}

impl SpecialArea {
    /// Eligible for evaluation by the monitor
    pub const fn is_monitored(&self) -> bool {
        self.is_active && self.automatic_tender_enabled
    }

    /// Reason this area must be skipped this tick, or `None` if usable.
    pub fn validation_issue(&self) -> Option<String> {
        if !self.location.is_valid() {
            return Some(format!("invalid location {}", self.location));
        }
        if !self.tender_threshold.is_finite() || self.tender_threshold <= 0.0 {
            return Some(format!(
                "non-positive tender threshold {}",
                self.tender_threshold
            ));
        }
        None
    }
}

/// Schedule fields written back after a special-area tender is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaScheduleUpdate {
    pub last_tender_generated: DateTime<Utc>,
    pub next_tender_date: DateTime<Utc>,
}

impl SpecialArea {
    pub fn apply_schedule(&mut self, update: AreaScheduleUpdate) {
        self.last_tender_generated = Some(update.last_tender_generated);
        self.next_tender_date = Some(update.next_tender_date);
    }
}
