//! Shared data structures for automated tender generation
//!
//! This module defines the records that flow through one monitoring tick:
//! - PendingDemand: unassigned pickup requests (input snapshot)
//! - TruckClass / TruckClassBand: the Threshold Table rows
//! - SpecialArea: registered high-volume zones with their own cadence
//! - Tender: the synthesized procurement record (output)

mod demand;
mod truck;
mod special_area;
mod tender;

pub use demand::*;
pub use truck::*;
pub use special_area::*;
pub use tender::*;

pub use crate::geo::GeoPoint;
