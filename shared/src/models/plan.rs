//! Allocation plans computed by the allocator and applied by the host

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::saturating_sum;

/// Operation a plan was computed for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Discard,
    Resize,
    Delete,
}

impl PlanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Discard => "discard",
            PlanKind::Resize => "resize",
            PlanKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Change to a single batch row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub batch_id: Uuid,
    /// Quantity the row held when the plan was computed
    pub previous_quantity: u64,
    pub new_quantity: u64,
    pub became_exhausted: bool,
}

/// Ordered row changes for one discard, resize or delete request
///
/// For [`PlanKind::Delete`] every entry is a row removal rather than an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    pub kind: PlanKind,
    pub previous_total: u64,
    pub target_total: u64,
    pub entries: Vec<PlanEntry>,
    /// Operator note carried through to the audit log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AllocationPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    /// Total across the virtual batch once every entry is applied
    pub fn resulting_total(&self) -> u64 {
        let removed = saturating_sum(self.entries.iter().map(|e| e.previous_quantity));
        let added = saturating_sum(self.entries.iter().map(|e| e.new_quantity));
        self.previous_total.saturating_sub(removed).saturating_add(added)
    }

    pub fn exhausted_ids(&self) -> Vec<Uuid> {
        self.entries
            .iter()
            .filter(|e| e.became_exhausted)
            .map(|e| e.batch_id)
            .collect()
    }
}
