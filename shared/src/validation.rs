//! Validation utilities for batch snapshots and requests

use std::collections::HashSet;

use crate::models::BatchRecord;
use crate::types::GroupingPolicy;

/// Validate a batch display name
pub fn validate_batch_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Batch name cannot be empty");
    }
    if name.chars().count() > 120 {
        return Err("Batch name must be at most 120 characters");
    }
    Ok(())
}

/// Validate a grouping policy supplied by a host
pub fn validate_policy(policy: &GroupingPolicy) -> Result<(), &'static str> {
    if policy.offset().is_none() {
        return Err("UTC offset must be within 24 hours");
    }
    Ok(())
}

/// Check a snapshot before handing it to the engine
///
/// The engine tolerates duplicates by keeping the first row; hosts that want to
/// reject such snapshots outright call this first.
pub fn validate_snapshot(records: &[BatchRecord]) -> Result<(), &'static str> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id) {
            return Err("Snapshot contains duplicate batch ids");
        }
        validate_batch_name(&record.name)?;
    }
    Ok(())
}
