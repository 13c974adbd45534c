//! Tender Engine: automated waste-collection tender generation
//!
//! Watches pending pickup demand and registered high-volume areas, and
//! publishes procurement tenders when enough waste has accumulated.
//!
//! ## Architecture
//!
//! - **Geo**: haversine distance and bearing
//! - **Engine**: leader clustering, Threshold Table classification, tender
//!   synthesis and special-area scheduling (pure, no I/O)
//! - **Storage**: async ports plus in-memory and sled adapters
//! - **Notify**: service-provider announcement fan-out
//! - **Background**: the periodic Volume Monitor that drives it all

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod notify;
pub mod storage;
pub mod types;

pub use background::{
    MonitorError, MonitorHandle, MonitorPorts, MonitorStatus, StopOutcome, TickReport,
    VolumeMonitor,
};
pub use config::EngineConfig;
pub use engine::{ClusterStrategy, LeaderClustering, TenderSynthesizer, ThresholdTable};
pub use error::EngineError;
pub use geo::GeoPoint;
pub use notify::{LogNotifier, Notifier, ServiceProvider, ServiceProviderDirectory};
pub use storage::{DemandSource, InMemoryStore, SledStore, SpecialAreaStore, StoreError, TenderStore};
pub use types::{PendingDemand, SpecialArea, Tender, TruckClass};
