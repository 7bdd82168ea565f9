//! Addressable units of a virtual batch

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One physical unit, addressed only by its position
///
/// Never persisted: any quantity change on a row shifts the indices of every
/// unit after it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnitRef {
    pub batch_id: Uuid,
    /// 1-based position within the owning row
    pub index_in_batch: u64,
    /// 1-based position within the whole virtual batch
    pub global_index: u64,
    /// True when the owning row holds more than one unit
    pub is_virtual: bool,
    pub label: String,
}
