//! Background services: the periodic volume monitor
//!
//! Runs as a tokio task that ticks on a fixed interval, evaluates pending
//! demand and special areas, and publishes tenders.

pub mod report;
pub mod volume_monitor;

pub use report::{MonitorError, MonitorState, MonitorStatus, TickEntity, TickError, TickReport};
pub use volume_monitor::{MonitorHandle, MonitorPorts, StopOutcome, VolumeMonitor};
