//! Virtual batches: one or more merged root lineages shown as a single lot

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{saturating_sum, BatchRecord};

/// Display-level grouping of every row folded into one production run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualBatch {
    /// Row that represents the group in listings
    pub primary: BatchRecord,
    /// Every other row of the group, in allocation order
    pub members: Vec<BatchRecord>,
    /// Roots folded into this group, primary first
    pub root_ids: Vec<Uuid>,
    /// Local calendar day the group was keyed on
    pub lot_date: NaiveDate,
    pub total_quantity: u64,
}

impl VirtualBatch {
    /// Primary followed by members
    pub fn rows(&self) -> impl Iterator<Item = &BatchRecord> {
        std::iter::once(&self.primary).chain(self.members.iter())
    }

    /// Rows that still hold at least one unit
    pub fn active_rows(&self) -> impl Iterator<Item = &BatchRecord> {
        self.rows().filter(|r| !r.is_exhausted())
    }

    pub fn is_merged(&self) -> bool {
        self.root_ids.len() > 1
    }

    pub fn contains(&self, batch_id: Uuid) -> bool {
        self.rows().any(|r| r.id == batch_id)
    }

    /// Sum of row quantities, recomputed from the rows
    pub fn recount(&self) -> u64 {
        saturating_sum(self.rows().map(|r| r.quantity))
    }

    pub fn summary(&self) -> VirtualBatchSummary {
        VirtualBatchSummary {
            primary_id: self.primary.id,
            name: self.primary.name.clone(),
            genetic_id: self.primary.genetic_id,
            genetic_name: self.primary.genetic_name.clone(),
            location_id: self.primary.effective_location(),
            lot_date: self.lot_date,
            total_quantity: self.total_quantity,
            row_count: self.members.len() + 1,
            active_row_count: self.active_rows().count(),
            merged_root_count: self.root_ids.len(),
        }
    }
}

/// Listing row for a virtual batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualBatchSummary {
    pub primary_id: Uuid,
    pub name: String,
    pub genetic_id: Option<Uuid>,
    pub genetic_name: Option<String>,
    pub location_id: Option<Uuid>,
    pub lot_date: NaiveDate,
    pub total_quantity: u64,
    pub row_count: usize,
    pub active_row_count: usize,
    pub merged_root_count: usize,
}
