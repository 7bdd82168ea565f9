//! Unit indexer
//!
//! Expands the aggregate quantity of a virtual batch into positional unit
//! references so hosts can label and print individual items without a row
//! per item. Indices are only valid for the snapshot they were computed from.

use crate::error::{EngineError, EngineResult};
use crate::models::{BatchRecord, UnitRef, VirtualBatch};

/// Label printed for a unit: `"{name} - U#{index:03}"` for multi-unit rows
pub fn unit_label(row: &BatchRecord, index_in_batch: u64) -> String {
    format_unit_label(&row.name, row.quantity, index_in_batch)
}

/// Same as [`unit_label`] for hosts holding only the name and quantity
pub fn format_unit_label(name: &str, quantity: u64, index_in_batch: u64) -> String {
    if quantity > 1 {
        format!("{} - U#{:03}", name, index_in_batch)
    } else {
        name.to_string()
    }
}

/// Every unit of a virtual batch, primary first, then members in order
pub fn expand_units(batch: &VirtualBatch) -> Vec<UnitRef> {
    let total = batch.recount();
    if total == 0 {
        return Vec::new();
    }
    collect_range(batch, 1, total)
}

/// The unit at a 1-based global index
pub fn find_unit(batch: &VirtualBatch, global_index: u64) -> Option<UnitRef> {
    if global_index == 0 {
        return None;
    }
    collect_range(batch, global_index, global_index).pop()
}

/// Units with global indices in `from..=to`
pub fn select_units(batch: &VirtualBatch, from: u64, to: u64) -> EngineResult<Vec<UnitRef>> {
    let total = batch.recount();
    if from == 0 || from > to || to > total {
        return Err(EngineError::InvalidUnitRange { from, to, total });
    }
    Ok(collect_range(batch, from, to))
}

fn collect_range(batch: &VirtualBatch, from: u64, to: u64) -> Vec<UnitRef> {
    let mut units = Vec::new();
    let mut offset = 0u64;

    for row in batch.rows() {
        // Exhausted rows stay in the member list but own no units
        if row.quantity == 0 {
            continue;
        }
        let first = offset + 1;
        let last = offset + row.quantity;
        offset = last;

        if last < from {
            continue;
        }
        if first > to {
            break;
        }

        for global_index in first.max(from)..=last.min(to) {
            let index_in_batch = global_index - first + 1;
            units.push(UnitRef {
                batch_id: row.id,
                index_in_batch,
                global_index,
                is_virtual: row.quantity > 1,
                label: unit_label(row, index_in_batch),
            });
        }
    }

    units
}
