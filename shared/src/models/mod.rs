//! Domain models for the lot lineage engine

mod batch;
mod plan;
mod unit;
mod virtual_batch;

pub use batch::*;
pub use plan::*;
pub use unit::*;
pub use virtual_batch::*;

/// Sum of unit counts, pinned at `u64::MAX` instead of overflowing
pub fn saturating_sum(quantities: impl IntoIterator<Item = u64>) -> u64 {
    quantities
        .into_iter()
        .fold(0u64, |total, quantity| total.saturating_add(quantity))
}
