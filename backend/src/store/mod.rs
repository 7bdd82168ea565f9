//! Record source and sink seams
//!
//! The engine never performs I/O. Hosts plug their backing store in through
//! these traits; [`InMemoryBatchStore`] serves tests and the report binary.

mod memory;

pub use memory::InMemoryBatchStore;

use std::future::Future;

use lot_lineage::{AllocationPlan, BatchRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;

/// Which batch rows a snapshot covers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchScope {
    #[default]
    All,
    Locations { ids: Vec<Uuid> },
    Rooms { ids: Vec<Uuid> },
}

impl BatchScope {
    pub fn includes(&self, record: &BatchRecord) -> bool {
        match self {
            BatchScope::All => true,
            BatchScope::Locations { ids } => record
                .location_id
                .map(|id| ids.contains(&id))
                .unwrap_or(false),
            BatchScope::Rooms { ids } => record
                .room_id
                .map(|id| ids.contains(&id))
                .unwrap_or(false),
        }
    }
}

/// Returns the current batch rows for a scope
pub trait BatchSource {
    fn fetch(&self, scope: &BatchScope)
        -> impl Future<Output = AppResult<Vec<BatchRecord>>> + Send;
}

/// Applies allocation plans as row updates or deletions
///
/// Implementations apply a plan entirely or not at all, and reject it when a
/// row no longer holds the quantity the plan was computed against.
pub trait BatchSink {
    fn apply(&self, plan: &AllocationPlan) -> impl Future<Output = AppResult<()>> + Send;
}
