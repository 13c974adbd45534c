//! Per-entity engine errors
//!
//! Anything that goes wrong while evaluating one cluster or one special area
//! is an [`EngineError`]. The monitor records it in the tick report and moves
//! on to the next entity.

use crate::notify::NotifyError;
use crate::storage::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("{call} timed out after {timeout_secs}s")]
    Timeout {
        call: &'static str,
        timeout_secs: u64,
    },

    #[error("tender id still colliding after {attempts} attempts (last: {last_id})")]
    TenderIdExhausted { attempts: u32, last_id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
