//! Tender generation engine
//!
//! Pure, synchronous building blocks used by the volume monitor:
//! - **Clustering**: greedy leader-based grouping of pending demand
//! - **Classifier**: Threshold Table lookup from volume to truck class
//! - **Synthesizer**: deterministic tender content and budget
//! - **Special areas**: schedule/threshold decision and next-date arithmetic
//!
//! Nothing here performs I/O; the monitor owns all port calls.

pub mod clustering;
pub mod classifier;
pub mod synthesizer;
pub mod special_area;

pub use clustering::{Cluster, ClusterStrategy, LeaderClustering};
pub use classifier::ThresholdTable;
pub use synthesizer::{AreaLabel, BudgetRates, TenderRequest, TenderSynthesizer};
pub use special_area::{next_tender_date, schedule_after_generation, should_generate};
