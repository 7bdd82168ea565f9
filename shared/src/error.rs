//! Errors raised by the engine

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Discard or resize amount outside the valid range
    #[error("Invalid amount {requested}: must be between 1 and {available}")]
    InvalidAmount { requested: i128, available: u64 },

    /// Parent references form a cycle reachable from this batch
    #[error("Malformed lineage at batch {batch_id}: parent references form a cycle")]
    MalformedLineage { batch_id: Uuid },

    /// Growth is attributed to the primary, which can no longer hold units
    #[error("Primary batch {batch_id} is exhausted and cannot be replenished")]
    ExhaustedPrimary { batch_id: Uuid },

    #[error("Invalid unit range {from}..={to} for a batch of {total} units")]
    InvalidUnitRange { from: u64, to: u64, total: u64 },
}

pub type EngineResult<T> = Result<T, EngineError>;
