//! Storage ports and adapters
//!
//! The engine reads pending demand and special areas from, and writes
//! tenders and area schedules to, collaborators it does not own. Each
//! collaborator is an `async_trait` port so deployments can swap backends
//! without touching the monitor:
//! - `InMemoryStore`: in-memory store for tests and minimal deployments
//! - `SledStore`: durable single-process store on sled
//!
//! Both adapters treat a persisted tender as claiming its pickup points:
//! the covered demand leaves the pending snapshot in the same write.

pub mod lockfile;
pub mod memory;
pub mod sled_store;

pub use lockfile::ProcessLock;
pub use memory::InMemoryStore;
pub use sled_store::{AreaVolumeEntry, SeedData, SledStore};

use async_trait::async_trait;

use crate::types::{AreaScheduleUpdate, PendingDemand, SpecialArea, Tender};

/// Storage errors surfaced by every port
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Unique-constraint violation on `tender_id`; the caller retries with a new id
    #[error("tender id {0} already exists")]
    DuplicateTenderId(String),
    #[error("special area {0} not found")]
    AreaNotFound(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Snapshot source for unassigned pickup requests
#[async_trait]
pub trait DemandSource: Send + Sync {
    async fn fetch_pending_demand(&self) -> Result<Vec<PendingDemand>, StoreError>;
}

/// Registry of special areas and their accrued volume
#[async_trait]
pub trait SpecialAreaStore: Send + Sync {
    /// Areas that are active with automatic tendering enabled
    async fn fetch_active_special_areas(&self) -> Result<Vec<SpecialArea>, StoreError>;

    /// Volume accrued in the area since its last generated tender (tons)
    async fn current_volume_for_area(&self, area_id: &str) -> Result<f64, StoreError>;

    async fn update_special_area(
        &self,
        area_id: &str,
        update: AreaScheduleUpdate,
    ) -> Result<(), StoreError>;
}

/// Tender sink
#[async_trait]
pub trait TenderStore: Send + Sync {
    /// Insert a new tender.
    ///
    /// Must fail with [`StoreError::DuplicateTenderId`] if the id exists,
    /// leaving the stored tender untouched.
    async fn persist_tender(&self, tender: &Tender) -> Result<(), StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
