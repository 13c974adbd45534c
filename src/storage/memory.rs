//! In-memory store implementing every engine port
//!
//! Thread-safe via `RwLock`. Not durable: data is lost on restart. Also
//! records delivered notifications so tests can assert on the fan-out.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{DemandSource, SpecialAreaStore, StoreError, TenderStore};
use crate::notify::{
    Notifier, NotifyError, ServiceProvider, ServiceProviderDirectory, TenderNotification,
};
use crate::types::{AreaScheduleUpdate, PendingDemand, SpecialArea, Tender};

#[derive(Default)]
pub struct InMemoryStore {
    demand: RwLock<BTreeMap<String, PendingDemand>>,
    areas: RwLock<BTreeMap<String, SpecialArea>>,
    area_volume: RwLock<HashMap<String, Vec<(DateTime<Utc>, f64)>>>,
    tenders: RwLock<BTreeMap<String, Tender>>,
    providers: RwLock<Vec<ServiceProvider>>,
    notifications: RwLock<Vec<TenderNotification>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(|e| StoreError::Storage(e.to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(|e| StoreError::Storage(e.to_string()))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_demand(&self, demand: PendingDemand) -> Result<(), StoreError> {
        write(&self.demand)?.insert(demand.id.clone(), demand);
        Ok(())
    }

    pub fn register_area(&self, area: SpecialArea) -> Result<(), StoreError> {
        write(&self.areas)?.insert(area.id.clone(), area);
        Ok(())
    }

    /// Record collected volume for an area at `at`
    pub fn record_area_volume(
        &self,
        area_id: &str,
        tons: f64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        write(&self.area_volume)?
            .entry(area_id.to_string())
            .or_default()
            .push((at, tons));
        Ok(())
    }

    pub fn add_provider(&self, provider: ServiceProvider) -> Result<(), StoreError> {
        write(&self.providers)?.push(provider);
        Ok(())
    }

    pub fn pending_demand(&self) -> Result<Vec<PendingDemand>, StoreError> {
        Ok(read(&self.demand)?.values().cloned().collect())
    }

    pub fn area(&self, area_id: &str) -> Result<Option<SpecialArea>, StoreError> {
        Ok(read(&self.areas)?.get(area_id).cloned())
    }

    pub fn tender(&self, tender_id: &str) -> Result<Option<Tender>, StoreError> {
        Ok(read(&self.tenders)?.get(tender_id).cloned())
    }

    pub fn tenders(&self) -> Result<Vec<Tender>, StoreError> {
        Ok(read(&self.tenders)?.values().cloned().collect())
    }

    pub fn notifications(&self) -> Result<Vec<TenderNotification>, StoreError> {
        Ok(read(&self.notifications)?.clone())
    }
}

#[async_trait]
impl DemandSource for InMemoryStore {
    async fn fetch_pending_demand(&self) -> Result<Vec<PendingDemand>, StoreError> {
        self.pending_demand()
    }
}

#[async_trait]
impl SpecialAreaStore for InMemoryStore {
    async fn fetch_active_special_areas(&self) -> Result<Vec<SpecialArea>, StoreError> {
        Ok(read(&self.areas)?
            .values()
            .filter(|a| a.is_monitored())
            .cloned()
            .collect())
    }

    async fn current_volume_for_area(&self, area_id: &str) -> Result<f64, StoreError> {
        let since = read(&self.areas)?
            .get(area_id)
            .ok_or_else(|| StoreError::AreaNotFound(area_id.to_string()))?
            .last_tender_generated;

        let volumes = read(&self.area_volume)?;
        Ok(volumes.get(area_id).map_or(0.0, |entries| {
            entries
                .iter()
                .filter(|(at, _)| since.map_or(true, |s| *at > s))
                .map(|(_, tons)| tons)
                .sum()
        }))
    }

    async fn update_special_area(
        &self,
        area_id: &str,
        update: AreaScheduleUpdate,
    ) -> Result<(), StoreError> {
        write(&self.areas)?
            .get_mut(area_id)
            .ok_or_else(|| StoreError::AreaNotFound(area_id.to_string()))?
            .apply_schedule(update);
        Ok(())
    }
}

#[async_trait]
impl TenderStore for InMemoryStore {
    async fn persist_tender(&self, tender: &Tender) -> Result<(), StoreError> {
        // Lock order: tenders, then demand
        let mut tenders = write(&self.tenders)?;
        if tenders.contains_key(&tender.tender_id) {
            return Err(StoreError::DuplicateTenderId(tender.tender_id.clone()));
        }
        let mut demand = write(&self.demand)?;
        for point in &tender.pickup_points {
            demand.remove(point);
        }
        tenders.insert(tender.tender_id.clone(), tender.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[async_trait]
impl ServiceProviderDirectory for InMemoryStore {
    async fn active_providers(&self) -> Result<Vec<ServiceProvider>, StoreError> {
        Ok(read(&self.providers)?
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Notifier for InMemoryStore {
    async fn notify(&self, notification: &TenderNotification) -> Result<(), NotifyError> {
        self.notifications
            .write()
            .map_err(|e| NotifyError::Unavailable(e.to_string()))?
            .push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{TenderRequest, TenderSynthesizer};
    use crate::geo::GeoPoint;
    use crate::types::{AreaCategory, PickupFrequency, SackCounts, TruckClassBand};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
    }

    fn tender(id: &str, points: &[&str]) -> Tender {
        let band = TruckClassBand::small_truck();
        let request = TenderRequest::for_cluster(
            &band,
            0.6,
            SackCounts::new(12, 0),
            GeoPoint::new(-6.8, 39.27),
            points.iter().map(|p| (*p).to_string()).collect(),
        );
        TenderSynthesizer::default().synthesize_with_id(&request, t0(), id.to_string())
    }

    fn market() -> SpecialArea {
        SpecialArea {
            id: "area-1".to_string(),
            name: "Kariakoo Market".to_string(),
            category: AreaCategory::Market,
            location: GeoPoint::new(-6.82, 39.28),
            tender_threshold: 5.0,
            pickup_frequency: PickupFrequency::Daily,
            is_active: true,
            automatic_tender_enabled: true,
            last_tender_generated: None,
            next_tender_date: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_tender_id_rejected() {
        let store = InMemoryStore::new();
        store.persist_tender(&tender("TDR-1", &[])).await.unwrap();
        let err = store.persist_tender(&tender("TDR-1", &[])).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateTenderId("TDR-1".to_string()));
        assert_eq!(store.tenders().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_claims_pickup_points() {
        let store = InMemoryStore::new();
        for id in ["d-1", "d-2"] {
            store
                .add_demand(PendingDemand::from_sacks(id, GeoPoint::new(-6.8, 39.27), 6, 0, t0()))
                .unwrap();
        }
        store.persist_tender(&tender("TDR-1", &["d-1"])).await.unwrap();
        let remaining = store.fetch_pending_demand().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "d-2");
    }

    #[tokio::test]
    async fn test_area_volume_counts_since_last_tender() {
        let store = InMemoryStore::new();
        store.register_area(market()).unwrap();
        store.record_area_volume("area-1", 2.0, t0()).unwrap();
        store.record_area_volume("area-1", 3.0, t0() + Duration::hours(2)).unwrap();
        assert!((store.current_volume_for_area("area-1").await.unwrap() - 5.0).abs() < 1e-9);

        let update = AreaScheduleUpdate {
            last_tender_generated: t0() + Duration::hours(1),
            next_tender_date: t0() + Duration::hours(25),
        };
        store.update_special_area("area-1", update).await.unwrap();
        assert!((store.current_volume_for_area("area-1").await.unwrap() - 3.0).abs() < 1e-9);

        let area = store.area("area-1").unwrap().unwrap();
        assert_eq!(area.next_tender_date, Some(t0() + Duration::hours(25)));
    }

    #[tokio::test]
    async fn test_unknown_area() {
        let store = InMemoryStore::new();
        let err = store.current_volume_for_area("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::AreaNotFound(_)));
    }

    #[tokio::test]
    async fn test_inactive_entries_filtered() {
        let store = InMemoryStore::new();
        let mut disabled = market();
        disabled.id = "area-2".to_string();
        disabled.automatic_tender_enabled = false;
        store.register_area(market()).unwrap();
        store.register_area(disabled).unwrap();
        store
            .add_provider(ServiceProvider {
                id: "sp-1".to_string(),
                name: "Active".to_string(),
                is_active: true,
            })
            .unwrap();
        store
            .add_provider(ServiceProvider {
                id: "sp-2".to_string(),
                name: "Suspended".to_string(),
                is_active: false,
            })
            .unwrap();

        assert_eq!(store.fetch_active_special_areas().await.unwrap().len(), 1);
        assert_eq!(store.active_providers().await.unwrap().len(), 1);
    }
}
