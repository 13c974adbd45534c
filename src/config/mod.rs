//! Engine Configuration Module
//!
//! Provides the engine's business parameters loaded from TOML files: the
//! Threshold Table, tick cadence, external-call timeouts and budget rates.
//!
//! ## Loading Order
//!
//! 1. `TENDER_ENGINE_CONFIG` environment variable (path to TOML file)
//! 2. `tender_engine.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The loaded value is passed explicitly to the engine at construction; tests
//! build their own `EngineConfig` and override whichever fields they need.
//!
//! ```ignore
//! let config = EngineConfig::load();
//! let monitor = VolumeMonitor::new(&config, ports);
//! ```

mod engine_config;
pub mod defaults;
pub mod validation;

pub use engine_config::*;
