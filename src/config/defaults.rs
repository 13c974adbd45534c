//! System-wide default constants.
//!
//! Values that are fixed policy rather than tunable business parameters, plus
//! the built-in defaults behind `EngineConfig`.

// ============================================================================
// Volume Monitor
// ============================================================================

/// Interval between monitoring ticks (seconds). 1 800 = 30 minutes.
pub const TICK_INTERVAL_SECS: u64 = 1_800;

/// Upper bound on any single external call (seconds).
pub const EXTERNAL_CALL_TIMEOUT_SECS: u64 = 30;

/// How long `stop()` waits for an in-flight tick before abandoning it (seconds).
pub const SHUTDOWN_GRACE_SECS: u64 = 60;

/// Persist attempts per tender when the generated id collides.
///
/// One initial attempt plus one retry with a fresh id.
pub const TENDER_PERSIST_ATTEMPTS: u32 = 2;

/// Clustering radius used when neither config nor the Threshold Table sets one (km).
pub const CLUSTER_RADIUS_KM: f64 = 5.0;

// ============================================================================
// Tender Timeline (fixed policy)
// ============================================================================

/// Bidding closes this long after publication (hours).
pub const BIDDING_WINDOW_HOURS: i64 = 24;

/// Service starts this long after publication (hours).
pub const SERVICE_START_OFFSET_HOURS: i64 = 48;

/// Service ends this long after publication (hours). 168 = 7 days.
pub const SERVICE_END_OFFSET_HOURS: i64 = 168;

// ============================================================================
// Budget Rates
// ============================================================================

/// Base collection rate per ton (TZS).
pub const BASE_RATE_PER_TON: f64 = 50_000.0;

/// Distance factor per km of service radius (TZS).
pub const DISTANCE_RATE_PER_KM: f64 = 10_000.0;

/// Volume handling factor per ton (TZS).
pub const VOLUME_RATE_PER_TON: f64 = 5_000.0;

// ============================================================================
// Tender Identifiers
// ============================================================================

/// Prefix of every generated tender id.
pub const TENDER_ID_PREFIX: &str = "TDR";

/// Trailing digits of the millisecond timestamp kept in a tender id.
pub const TENDER_ID_TIMESTAMP_DIGITS: usize = 8;

// ============================================================================
// Storage
// ============================================================================

/// Default data directory for the sled store and process lock.
pub const DATA_DIR: &str = "./data";
