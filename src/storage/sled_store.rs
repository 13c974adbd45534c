//! Durable store on sled
//!
//! One tree per collaborator:
//! - `pending_demand`: demand id -> JSON `PendingDemand`
//! - `special_areas`: area id -> JSON `SpecialArea`
//! - `area_volume`: `<area id>\0<nanos BE>` -> f64 BE tons
//! - `tenders`: tender id -> JSON `Tender` (insert-if-absent)
//! - `service_providers`: provider id -> JSON `ServiceProvider`
//!
//! Tender inserts run in a transaction with `pending_demand` so the tender
//! and the removal of its pickup points land together or not at all.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionError};
use sled::Transactional;
use tracing::{debug, info, warn};

use super::{DemandSource, SpecialAreaStore, StoreError, TenderStore};
use crate::notify::{ServiceProvider, ServiceProviderDirectory};
use crate::types::{AreaScheduleUpdate, PendingDemand, SpecialArea, Tender};

const DEMAND_TREE: &str = "pending_demand";
const AREAS_TREE: &str = "special_areas";
const AREA_VOLUME_TREE: &str = "area_volume";
const TENDERS_TREE: &str = "tenders";
const PROVIDERS_TREE: &str = "service_providers";

/// Collaborator records loaded into a store in bulk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub pending_demand: Vec<PendingDemand>,
    pub special_areas: Vec<SpecialArea>,
    pub area_volumes: Vec<AreaVolumeEntry>,
    pub service_providers: Vec<ServiceProvider>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaVolumeEntry {
    pub area_id: String,
    pub tons: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
    demand: sled::Tree,
    areas: sled::Tree,
    area_volume: sled::Tree,
    tenders: sled::Tree,
    providers: sled::Tree,
}

fn nanos(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt()
        .unwrap_or_else(|| ts.timestamp().saturating_mul(1_000_000_000))
}

fn volume_prefix(area_id: &str) -> Vec<u8> {
    let mut prefix = area_id.as_bytes().to_vec();
    prefix.push(0);
    prefix
}

fn decode_all<T: DeserializeOwned>(tree: &sled::Tree, what: &str) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for item in tree.iter() {
        let (key, value) = item?;
        match serde_json::from_slice::<T>(&value) {
            Ok(v) => out.push(v),
            Err(e) => {
                warn!(tree = what, key = %String::from_utf8_lossy(&key), error = %e, "Skipping undecodable record");
            }
        }
    }
    Ok(out)
}

impl SledStore {
    /// Open or create the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let store = Self {
            demand: db.open_tree(DEMAND_TREE)?,
            areas: db.open_tree(AREAS_TREE)?,
            area_volume: db.open_tree(AREA_VOLUME_TREE)?,
            tenders: db.open_tree(TENDERS_TREE)?,
            providers: db.open_tree(PROVIDERS_TREE)?,
            db: Arc::new(db),
        };
        info!(
            path = %path.display(),
            pending = store.demand.len(),
            areas = store.areas.len(),
            tenders = store.tenders.len(),
            "Tender store opened"
        );
        Ok(store)
    }

    pub fn upsert_demand(&self, demand: &PendingDemand) -> Result<(), StoreError> {
        self.demand.insert(demand.id.as_bytes(), serde_json::to_vec(demand)?)?;
        Ok(())
    }

    pub fn upsert_area(&self, area: &SpecialArea) -> Result<(), StoreError> {
        self.areas.insert(area.id.as_bytes(), serde_json::to_vec(area)?)?;
        Ok(())
    }

    pub fn upsert_provider(&self, provider: &ServiceProvider) -> Result<(), StoreError> {
        self.providers.insert(provider.id.as_bytes(), serde_json::to_vec(provider)?)?;
        Ok(())
    }

    /// Record collected volume for an area at `at`
    pub fn record_area_volume(
        &self,
        area_id: &str,
        tons: f64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut key = volume_prefix(area_id);
        key.extend_from_slice(&nanos(at).to_be_bytes());
        self.area_volume.insert(key, tons.to_be_bytes().to_vec())?;
        Ok(())
    }

    /// Upsert every record in `data`, then flush
    pub fn import(&self, data: &SeedData) -> Result<(), StoreError> {
        for demand in &data.pending_demand {
            self.upsert_demand(demand)?;
        }
        for area in &data.special_areas {
            self.upsert_area(area)?;
        }
        for entry in &data.area_volumes {
            self.record_area_volume(&entry.area_id, entry.tons, entry.recorded_at)?;
        }
        for provider in &data.service_providers {
            self.upsert_provider(provider)?;
        }
        self.flush()?;
        info!(
            demand = data.pending_demand.len(),
            areas = data.special_areas.len(),
            volume_entries = data.area_volumes.len(),
            providers = data.service_providers.len(),
            "Seed data imported"
        );
        Ok(())
    }

    pub fn area(&self, area_id: &str) -> Result<Option<SpecialArea>, StoreError> {
        self.areas
            .get(area_id.as_bytes())?
            .map(|v| serde_json::from_slice(&v).map_err(StoreError::from))
            .transpose()
    }

    pub fn tender(&self, tender_id: &str) -> Result<Option<Tender>, StoreError> {
        self.tenders
            .get(tender_id.as_bytes())?
            .map(|v| serde_json::from_slice(&v).map_err(StoreError::from))
            .transpose()
    }

    pub fn tenders(&self) -> Result<Vec<Tender>, StoreError> {
        decode_all(&self.tenders, TENDERS_TREE)
    }

    pub fn tender_count(&self) -> usize {
        self.tenders.len()
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl DemandSource for SledStore {
    async fn fetch_pending_demand(&self) -> Result<Vec<PendingDemand>, StoreError> {
        decode_all(&self.demand, DEMAND_TREE)
    }
}

#[async_trait]
impl SpecialAreaStore for SledStore {
    async fn fetch_active_special_areas(&self) -> Result<Vec<SpecialArea>, StoreError> {
        let areas: Vec<SpecialArea> = decode_all(&self.areas, AREAS_TREE)?;
        Ok(areas.into_iter().filter(SpecialArea::is_monitored).collect())
    }

    async fn current_volume_for_area(&self, area_id: &str) -> Result<f64, StoreError> {
        let area = self
            .area(area_id)?
            .ok_or_else(|| StoreError::AreaNotFound(area_id.to_string()))?;
        let since = area.last_tender_generated.map(nanos);

        let prefix = volume_prefix(area_id);
        let mut total = 0.0;
        for item in self.area_volume.scan_prefix(&prefix) {
            let (key, value) = item?;
            let (Ok(stamp), Ok(tons)) = (
                <[u8; 8]>::try_from(&key[prefix.len()..]),
                <[u8; 8]>::try_from(value.as_ref()),
            ) else {
                warn!(area_id, "Skipping malformed area volume entry");
                continue;
            };
            if since.map_or(true, |s| i64::from_be_bytes(stamp) > s) {
                total += f64::from_be_bytes(tons);
            }
        }
        Ok(total)
    }

    async fn update_special_area(
        &self,
        area_id: &str,
        update: AreaScheduleUpdate,
    ) -> Result<(), StoreError> {
        let mut area = self
            .area(area_id)?
            .ok_or_else(|| StoreError::AreaNotFound(area_id.to_string()))?;
        area.apply_schedule(update);
        self.upsert_area(&area)?;
        self.areas.flush()?;
        debug!(area_id, next = %update.next_tender_date, "Special area schedule updated");
        Ok(())
    }
}

#[async_trait]
impl TenderStore for SledStore {
    async fn persist_tender(&self, tender: &Tender) -> Result<(), StoreError> {
        let value = serde_json::to_vec(tender)?;
        let id = tender.tender_id.as_bytes();

        let result = (&self.tenders, &self.demand).transaction(
            |(tenders, demand)| -> ConflictableTransactionResult<(), ()> {
                if tenders.get(id)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(()));
                }
                tenders.insert(id, value.as_slice())?;
                for point in &tender.pickup_points {
                    demand.remove(point.as_bytes())?;
                }
                Ok(())
            },
        );

        match result {
            Ok(()) => {
                self.db.flush()?;
                Ok(())
            }
            Err(TransactionError::Abort(())) => {
                Err(StoreError::DuplicateTenderId(tender.tender_id.clone()))
            }
            Err(TransactionError::Storage(e)) => Err(StoreError::from(e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

#[async_trait]
impl ServiceProviderDirectory for SledStore {
    async fn active_providers(&self) -> Result<Vec<ServiceProvider>, StoreError> {
        let providers: Vec<ServiceProvider> = decode_all(&self.providers, PROVIDERS_TREE)?;
        Ok(providers.into_iter().filter(|p| p.is_active).collect())
    }
}
