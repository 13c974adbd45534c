//! Tick outcome and monitor status types

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EngineError;

/// Entity a per-tick failure is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickEntity {
    Cluster { leader_id: String },
    SpecialArea { area_id: String },
    /// Listing the active special areas
    AreaListing,
    Notification {
        tender_id: String,
        recipient_id: Option<String>,
    },
}

impl std::fmt::Display for TickEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickEntity::Cluster { leader_id } => write!(f, "cluster {leader_id}"),
            TickEntity::SpecialArea { area_id } => write!(f, "special area {area_id}"),
            TickEntity::AreaListing => write!(f, "special area listing"),
            TickEntity::Notification {
                tender_id,
                recipient_id: Some(recipient),
            } => write!(f, "notification of {tender_id} to {recipient}"),
            TickEntity::Notification {
                tender_id,
                recipient_id: None,
            } => write!(f, "notification of {tender_id}"),
        }
    }
}

/// A failure isolated to one entity; the rest of the tick carried on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{entity}: {message}")]
pub struct TickError {
    pub entity: TickEntity,
    pub message: String,
}

impl TickError {
    pub fn new(entity: TickEntity, error: &EngineError) -> Self {
        Self {
            entity,
            message: error.to_string(),
        }
    }
}

/// Summary of one monitoring pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub demand_fetched: usize,
    /// Demand records dropped for invalid coordinates or volume
    pub demand_skipped: usize,
    pub clusters_evaluated: usize,
    pub areas_evaluated: usize,
    pub areas_skipped: usize,
    pub tenders_created: usize,
    pub tender_ids: Vec<String>,
    pub notifications_sent: usize,
    /// Shutdown was requested before every entity was evaluated
    pub interrupted: bool,
    pub errors: Vec<TickError>,
}

impl TickReport {
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            demand_fetched: 0,
            demand_skipped: 0,
            clusters_evaluated: 0,
            areas_evaluated: 0,
            areas_skipped: 0,
            tenders_created: 0,
            tender_ids: Vec::new(),
            notifications_sent: 0,
            interrupted: false,
            errors: Vec::new(),
        }
    }

    pub fn record_error(&mut self, entity: TickEntity, error: &EngineError) {
        self.errors.push(TickError::new(entity, error));
    }
}

/// Why a tick produced no report
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Another tick holds the single-flight guard
    #[error("a tick is already in flight")]
    TickInFlight,
    /// The pending-demand snapshot could not be read; nothing was evaluated
    #[error("pending demand snapshot unavailable: {0}")]
    DemandFetch(#[source] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorState {
    Idle,
    Running,
}

/// Live monitor counters, shared through `Arc<RwLock<_>>`
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub ticks_completed: u64,
    pub ticks_skipped: u64,
    pub ticks_aborted: u64,
    pub tenders_created_total: u64,
    pub last_report: Option<TickReport>,
    pub last_error: Option<String>,
}

impl MonitorStatus {
    pub(crate) const fn new() -> Self {
        Self {
            state: MonitorState::Idle,
            ticks_completed: 0,
            ticks_skipped: 0,
            ticks_aborted: 0,
            tenders_created_total: 0,
            last_report: None,
            last_error: None,
        }
    }
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self::new()
    }
}
