//! Volume Monitor: the periodic tender-generation driver
//!
//! Each tick takes one snapshot of pending demand, clusters it, classifies
//! every cluster against the Threshold Table and publishes a tender for each
//! one that fits a band. It then evaluates every active special area against
//! its schedule and threshold. Failures are isolated per cluster or area and
//! collected in the [`TickReport`]; only a failed demand snapshot aborts the
//! whole tick.
//!
//! Ticks never overlap. A tick that fires while the previous one is still
//! running is skipped and counted, not queued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::report::{MonitorError, MonitorState, MonitorStatus, TickEntity, TickReport};
use crate::config::{defaults, EngineConfig};
use crate::engine::synthesizer::generate_tender_id;
use crate::engine::{
    schedule_after_generation, should_generate, AreaLabel, Cluster, ClusterStrategy,
    LeaderClustering, TenderRequest, TenderSynthesizer, ThresholdTable,
};
use crate::error::EngineError;
use crate::notify::{Notifier, ServiceProviderDirectory, TenderNotification};
use crate::storage::{DemandSource, SpecialAreaStore, StoreError, TenderStore};
use crate::types::{PendingDemand, SpecialArea, Tender};

/// Grouping radius for a tick.
///
/// Never wider than the smallest truck-class radius, so every member of a
/// classified cluster lies inside its tender's service area.
fn clustering_radius(configured: Option<f64>, table: &ThresholdTable) -> f64 {
    let smallest = table.smallest_radius_km();
    match (configured, smallest) {
        (Some(radius), Some(limit)) if radius > limit => {
            warn!(
                configured_km = radius,
                limit_km = limit,
                "clustering.radius_km exceeds the smallest truck-class radius, clamping"
            );
            limit
        }
        (Some(radius), _) => radius,
        (None, Some(limit)) => limit,
        (None, None) => defaults::CLUSTER_RADIUS_KM,
    }
}

/// The collaborators a monitor talks to
#[derive(Clone)]
pub struct MonitorPorts {
    pub demand: Arc<dyn DemandSource>,
    pub areas: Arc<dyn SpecialAreaStore>,
    pub tenders: Arc<dyn TenderStore>,
    pub providers: Arc<dyn ServiceProviderDirectory>,
    pub notifier: Arc<dyn Notifier>,
}

impl MonitorPorts {
    /// Wire every store port to one backend
    pub fn from_store<S>(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self
    where
        S: DemandSource + SpecialAreaStore + TenderStore + ServiceProviderDirectory + 'static,
    {
        Self {
            demand: store.clone(),
            areas: store.clone(),
            tenders: store.clone(),
            providers: store,
            notifier,
        }
    }
}

/// How a [`MonitorHandle::stop`] ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The loop exited within the grace period
    Graceful,
    /// The grace period expired and the in-flight tick was aborted
    Abandoned,
    /// The loop task panicked or was cancelled elsewhere
    Failed(String),
}

pub struct VolumeMonitor {
    ports: MonitorPorts,
    table: ThresholdTable,
    strategy: Arc<dyn ClusterStrategy>,
    clustering_radius_km: f64,
    synthesizer: TenderSynthesizer,
    call_timeout: Duration,
    shutdown_grace: Duration,
    tick_guard: Mutex<()>,
    status: Arc<RwLock<MonitorStatus>>,
}

impl VolumeMonitor {
    pub fn new(config: &EngineConfig, ports: MonitorPorts) -> Self {
        let table = ThresholdTable::new(config.truck_classes.clone());
        let clustering_radius_km = clustering_radius(config.clustering.radius_km, &table);

        Self {
            ports,
            table,
            strategy: Arc::new(LeaderClustering),
            clustering_radius_km,
            synthesizer: TenderSynthesizer::new(config.budget, config.requirements.clone()),
            call_timeout: config.monitor.call_timeout(),
            shutdown_grace: config.monitor.shutdown_grace(),
            tick_guard: Mutex::new(()),
            status: Arc::new(RwLock::new(MonitorStatus::new())),
        }
    }

    /// Replace the default leader clustering
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn ClusterStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn status_handle(&self) -> Arc<RwLock<MonitorStatus>> {
        Arc::clone(&self.status)
    }

    pub const fn clustering_radius_km(&self) -> f64 {
        self.clustering_radius_km
    }

    /// Run a single tick at `now`
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<TickReport, MonitorError> {
        self.run_once_cancellable(now, &CancellationToken::new()).await
    }

    /// Run a single tick, stopping between entities once `cancel` fires.
    pub async fn run_once_cancellable(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<TickReport, MonitorError> {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            self.status.write().await.ticks_skipped += 1;
            warn!("Previous tick still in flight, skipping this one");
            return Err(MonitorError::TickInFlight);
        };

        self.status.write().await.state = MonitorState::Running;

        let mut report = TickReport::new(now);
        let outcome = self.execute(now, cancel, &mut report).await;
        report.finished_at = Some(Utc::now());

        let mut status = self.status.write().await;
        status.state = MonitorState::Idle;
        match outcome {
            Ok(()) => {
                status.ticks_completed += 1;
                status.tenders_created_total += report.tenders_created as u64;
                status.last_report = Some(report.clone());
                info!(
                    tenders_created = report.tenders_created,
                    clusters = report.clusters_evaluated,
                    areas = report.areas_evaluated,
                    demand_skipped = report.demand_skipped,
                    errors = report.errors.len(),
                    interrupted = report.interrupted,
                    "Tick complete"
                );
                Ok(report)
            }
            Err(e) => {
                status.ticks_aborted += 1;
                status.last_error = Some(e.to_string());
                error!(error = %e, "Tick aborted");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
        report: &mut TickReport,
    ) -> Result<(), MonitorError> {
        let demand = self
            .bounded("fetch_pending_demand", self.ports.demand.fetch_pending_demand())
            .await
            .map_err(MonitorError::DemandFetch)?;
        report.demand_fetched = demand.len();

        let usable: Vec<PendingDemand> = demand
            .into_iter()
            .filter(|d| match d.validation_issue() {
                Some(issue) => {
                    warn!(demand_id = %d.id, issue = %issue, "Skipping invalid pending demand");
                    report.demand_skipped += 1;
                    false
                }
                None => true,
            })
            .collect();

        let clusters = self.strategy.cluster(&usable, self.clustering_radius_km);
        debug!(
            strategy = self.strategy.name(),
            demand = usable.len(),
            clusters = clusters.len(),
            radius_km = self.clustering_radius_km,
            "Demand clustered"
        );

        for cluster in &clusters {
            if cancel.is_cancelled() {
                report.interrupted = true;
                warn!("Shutdown requested, stopping tick before remaining clusters");
                return Ok(());
            }
            report.clusters_evaluated += 1;
            if let Err(e) = self.process_cluster(cluster, now, report).await {
                warn!(cluster_leader = %cluster.leader_id, error = %e, "Cluster evaluation failed");
                report.record_error(
                    TickEntity::Cluster {
                        leader_id: cluster.leader_id.clone(),
                    },
                    &e,
                );
            }
        }

        self.evaluate_special_areas(now, cancel, report).await;
        Ok(())
    }

    async fn process_cluster(
        &self,
        cluster: &Cluster,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> Result<(), EngineError> {
        let Some(band) = self.table.band_for(cluster.total_volume_tons) else {
            debug!(
                cluster_leader = %cluster.leader_id,
                volume_tons = cluster.total_volume_tons,
                members = cluster.len(),
                "Cluster volume fits no truck class yet"
            );
            return Ok(());
        };

        let request = TenderRequest::for_cluster(
            band,
            cluster.total_volume_tons,
            cluster.sack_counts(),
            cluster.center,
            cluster.member_ids(),
        );
        let tender = self.publish(self.synthesizer.synthesize(&request, now), now, report).await?;

        info!(
            tender_id = %tender.tender_id,
            truck_class = %tender.truck_class,
            volume_tons = tender.volume_required,
            members = cluster.len(),
            budget = tender.estimated_budget,
            "Volume-threshold tender published"
        );
        Ok(())
    }

    async fn evaluate_special_areas(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
        report: &mut TickReport,
    ) {
        let areas = match self
            .bounded("fetch_active_special_areas", self.ports.areas.fetch_active_special_areas())
            .await
        {
            Ok(areas) => areas,
            Err(e) => {
                warn!(error = %e, "Could not list special areas");
                report.record_error(TickEntity::AreaListing, &e);
                return;
            }
        };

        for area in &areas {
            if cancel.is_cancelled() {
                report.interrupted = true;
                warn!("Shutdown requested, stopping tick before remaining special areas");
                return;
            }
            if !area.is_monitored() {
                continue;
            }
            if let Some(issue) = area.validation_issue() {
                warn!(area_id = %area.id, issue = %issue, "Skipping invalid special area");
                report.areas_skipped += 1;
                continue;
            }

            report.areas_evaluated += 1;
            if let Err(e) = self.process_area(area, now, report).await {
                warn!(area_id = %area.id, error = %e, "Special area evaluation failed");
                report.record_error(
                    TickEntity::SpecialArea {
                        area_id: area.id.clone(),
                    },
                    &e,
                );
            }
        }
    }

    async fn process_area(
        &self,
        area: &SpecialArea,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> Result<(), EngineError> {
        let volume = self
            .bounded(
                "current_volume_for_area",
                self.ports.areas.current_volume_for_area(&area.id),
            )
            .await?;
        if !volume.is_finite() || volume < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "accrued volume {volume} is not a valid tonnage"
            )));
        }

        if !should_generate(area, volume, now) {
            debug!(area_id = %area.id, volume_tons = volume, "Special area not due");
            return Ok(());
        }

        let Some(band) = self.table.band_for(volume) else {
            info!(
                area_id = %area.id,
                volume_tons = volume,
                "Special area due but accrued volume fits no truck class"
            );
            return Ok(());
        };

        let request = TenderRequest::for_special_area(
            band,
            volume,
            area.location,
            AreaLabel {
                id: area.id.clone(),
                name: area.name.clone(),
                category: area.category,
            },
        );
        let tender = self.publish(self.synthesizer.synthesize(&request, now), now, report).await?;

        let update = schedule_after_generation(area, now);
        self.bounded(
            "update_special_area",
            self.ports.areas.update_special_area(&area.id, update),
        )
        .await?;

        info!(
            tender_id = %tender.tender_id,
            area_id = %area.id,
            truck_class = %tender.truck_class,
            volume_tons = volume,
            next_tender_date = %update.next_tender_date,
            "Special-area tender published"
        );
        Ok(())
    }

    /// Persist a tender, then announce it. Announcement failures are
    /// recorded but do not fail the tender.
    async fn publish(
        &self,
        tender: Tender,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> Result<Tender, EngineError> {
        let tender = self.persist_with_retry(tender, now).await?;
        report.tenders_created += 1;
        report.tender_ids.push(tender.tender_id.clone());
        self.announce(&tender, report).await;
        Ok(tender)
    }

    async fn persist_with_retry(
        &self,
        mut tender: Tender,
        now: DateTime<Utc>,
    ) -> Result<Tender, EngineError> {
        let mut attempt = 1;
        loop {
            match self
                .bounded("persist_tender", self.ports.tenders.persist_tender(&tender))
                .await
            {
                Ok(()) => return Ok(tender),
                Err(EngineError::Store(StoreError::DuplicateTenderId(id))) => {
                    if attempt >= defaults::TENDER_PERSIST_ATTEMPTS {
                        return Err(EngineError::TenderIdExhausted {
                            attempts: attempt,
                            last_id: id,
                        });
                    }
                    warn!(
                        tender_id = %id,
                        backend = self.ports.tenders.backend_name(),
                        "Tender id collision, retrying with a fresh id"
                    );
                    tender.tender_id = generate_tender_id(now);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn announce(&self, tender: &Tender, report: &mut TickReport) {
        let providers = match self
            .bounded("active_providers", self.ports.providers.active_providers())
            .await
        {
            Ok(providers) => providers,
            Err(e) => {
                warn!(tender_id = %tender.tender_id, error = %e, "Could not list service providers");
                report.record_error(
                    TickEntity::Notification {
                        tender_id: tender.tender_id.clone(),
                        recipient_id: None,
                    },
                    &e,
                );
                return;
            }
        };

        for provider in &providers {
            let notification = TenderNotification::for_provider(tender, provider);
            match self.bounded("notify", self.ports.notifier.notify(&notification)).await {
                Ok(()) => report.notifications_sent += 1,
                Err(e) => {
                    warn!(
                        tender_id = %tender.tender_id,
                        recipient = %provider.id,
                        error = %e,
                        "Notification failed"
                    );
                    report.record_error(
                        TickEntity::Notification {
                            tender_id: tender.tender_id.clone(),
                            recipient_id: Some(provider.id.clone()),
                        },
                        &e,
                    );
                }
            }
        }
    }

    /// Await a port call under the configured timeout
    async fn bounded<T, E, F>(&self, call: &'static str, fut: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, E>>,
        EngineError: From<E>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result.map_err(EngineError::from),
            Err(_) => Err(EngineError::Timeout {
                call,
                timeout_secs: self.call_timeout.as_secs(),
            }),
        }
    }

    /// Spawn the periodic loop. The first tick runs immediately.
    pub fn start(self: &Arc<Self>, interval: Duration) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let monitor = Arc::clone(self);
        let token = cancel.clone();
        let task = tokio::spawn(async move { monitor.run_loop(interval, token).await });

        MonitorHandle {
            cancel,
            task,
            grace: self.shutdown_grace,
            status: Arc::clone(&self.status),
        }
    }

    async fn run_loop(&self, interval: Duration, cancel: CancellationToken) {
        info!(
            interval_secs = interval.as_secs(),
            radius_km = self.clustering_radius_km,
            bands = self.table.bands().len(),
            strategy = self.strategy.name(),
            "Volume monitor started"
        );

        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once_cancellable(Utc::now(), &cancel).await {
                        debug!(error = %e, "Tick produced no report");
                    }
                }
            }
        }

        info!("Volume monitor stopped");
    }
}

/// Owner's handle on a running monitor loop
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    grace: Duration,
    status: Arc<RwLock<MonitorStatus>>,
}

impl MonitorHandle {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn status_handle(&self) -> Arc<RwLock<MonitorStatus>> {
        Arc::clone(&self.status)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop: no new tick starts, an in-flight tick finishes its
    /// current entity, and after the grace period it is aborted.
    pub async fn stop(mut self) -> StopOutcome {
        self.cancel.cancel();

        match tokio::time::timeout(self.grace, &mut self.task).await {
            Ok(Ok(())) => StopOutcome::Graceful,
            Ok(Err(e)) => {
                error!(error = %e, "Volume monitor task failed");
                StopOutcome::Failed(e.to_string())
            }
            Err(_) => {
                self.task.abort();
                let mut status = self.status.write().await;
                if status.state == MonitorState::Running {
                    status.state = MonitorState::Idle;
                    status.ticks_aborted += 1;
                    status.last_error = Some("abandoned at shutdown".to_string());
                }
                error!(
                    grace_secs = self.grace.as_secs(),
                    "In-flight tick exceeded the shutdown grace period and was abandoned"
                );
                StopOutcome::Abandoned
            }
        }
    }
}
