//! Quantity allocator
//!
//! Computes which underlying rows absorb a discard, resize or delete of a
//! virtual batch. Plans are computed in full before anything is applied, so a
//! rejected request never leaves a partial change behind.

use crate::error::{EngineError, EngineResult};
use crate::models::{AllocationPlan, PlanEntry, PlanKind, VirtualBatch};

/// Remove `amount` units, consuming the primary first, then members in order
pub fn plan_discard(batch: &VirtualBatch, amount: u64) -> EngineResult<AllocationPlan> {
    let available = batch.recount();
    if amount == 0 || amount > available {
        return Err(EngineError::InvalidAmount {
            requested: amount as i128,
            available,
        });
    }
    Ok(consume(batch, available, amount, PlanKind::Discard))
}

/// Bring the virtual batch to exactly `new_total` units
///
/// Growth goes to the primary alone; shrinking walks rows like a discard.
///
/// An exhausted primary is never replenished, so growth fails with
/// [`EngineError::ExhaustedPrimary`] once the primary reaches zero. Discards
/// drain the primary first, which means a batch that has lost at least the
/// primary's quantity can only shrink from then on.
pub fn plan_resize(batch: &VirtualBatch, new_total: u64) -> EngineResult<AllocationPlan> {
    let available = batch.recount();

    if new_total < available {
        return Ok(consume(batch, available, available - new_total, PlanKind::Resize));
    }

    let mut plan = AllocationPlan {
        kind: PlanKind::Resize,
        previous_total: available,
        target_total: new_total,
        entries: Vec::new(),
        reason: None,
    };
    if new_total == available {
        return Ok(plan);
    }

    let primary = &batch.primary;
    if primary.is_exhausted() {
        return Err(EngineError::ExhaustedPrimary {
            batch_id: primary.id,
        });
    }
    let grown = primary
        .quantity
        .checked_add(new_total - available)
        .ok_or(EngineError::InvalidAmount {
            requested: new_total as i128,
            available,
        })?;

    plan.entries.push(PlanEntry {
        batch_id: primary.id,
        previous_quantity: primary.quantity,
        new_quantity: grown,
        became_exhausted: false,
    });
    Ok(plan)
}

/// Remove every row of the virtual batch regardless of quantity
pub fn plan_delete(batch: &VirtualBatch) -> AllocationPlan {
    let entries = batch
        .rows()
        .map(|row| PlanEntry {
            batch_id: row.id,
            previous_quantity: row.quantity,
            new_quantity: 0,
            became_exhausted: row.quantity > 0,
        })
        .collect();

    AllocationPlan {
        kind: PlanKind::Delete,
        previous_total: batch.recount(),
        target_total: 0,
        entries,
        reason: None,
    }
}

fn consume(batch: &VirtualBatch, available: u64, amount: u64, kind: PlanKind) -> AllocationPlan {
    let mut remaining = amount;
    let mut entries = Vec::new();

    for row in batch.rows() {
        if remaining == 0 {
            break;
        }
        if row.quantity == 0 {
            continue;
        }
        let taken = row.quantity.min(remaining);
        remaining -= taken;
        let new_quantity = row.quantity - taken;
        entries.push(PlanEntry {
            batch_id: row.id,
            previous_quantity: row.quantity,
            new_quantity,
            became_exhausted: new_quantity == 0,
        });
    }

    tracing::debug!(
        "Planned {} of {} units across {} rows of batch {}",
        kind,
        amount,
        entries.len(),
        batch.primary.id
    );

    AllocationPlan {
        kind,
        previous_total: available,
        target_total: available - amount,
        entries,
        reason: None,
    }
}
