//! Virtual batch merger
//!
//! Operators often enter one production run as several separate batches.
//! Roots that share a genetic line, local calendar day and location are folded
//! into a single virtual batch anchored on the root with the smallest name.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::lineage::{build_forest, newest_first, LineageNode};
use crate::models::{saturating_sum, BatchRecord, VirtualBatch};
use crate::types::GroupingPolicy;

/// Bucket a root falls into; `None` parts stand for "unknown"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub genetic_id: Option<Uuid>,
    pub lot_date: NaiveDate,
    pub location_id: Option<Uuid>,
    /// Set when the policy keeps an unattributed root in a bucket of its own
    isolated: Option<Uuid>,
}

impl GroupKey {
    pub fn for_root(record: &BatchRecord, policy: &GroupingPolicy) -> Self {
        let genetic_id = record.genetic_id;
        let location_id = record.effective_location();
        let unattributed = genetic_id.is_none() || location_id.is_none();

        Self {
            genetic_id,
            lot_date: policy.calendar_date_of(record.lot_timestamp()),
            location_id,
            isolated: (unattributed && !policy.merge_unattributed).then_some(record.id),
        }
    }
}

/// Merge roots using the default grouping policy
pub fn merge_virtual_batches(roots: &[LineageNode]) -> Vec<VirtualBatch> {
    merge_virtual_batches_with(roots, &GroupingPolicy::default())
}

/// Merge roots that share a grouping key into virtual batches, newest first
pub fn merge_virtual_batches_with(
    roots: &[LineageNode],
    policy: &GroupingPolicy,
) -> Vec<VirtualBatch> {
    let mut buckets: BTreeMap<GroupKey, Vec<&LineageNode>> = BTreeMap::new();
    for root in roots {
        buckets
            .entry(GroupKey::for_root(&root.record, policy))
            .or_default()
            .push(root);
    }

    let mut batches: Vec<VirtualBatch> = buckets
        .into_iter()
        .filter_map(|(key, bucket)| fold_bucket(key.lot_date, bucket))
        .collect();
    batches.sort_by(|a, b| newest_first(&a.primary, &b.primary));

    tracing::debug!(
        "Merged {} roots into {} virtual batches",
        roots.len(),
        batches.len()
    );

    batches
}

fn fold_bucket(lot_date: NaiveDate, mut bucket: Vec<&LineageNode>) -> Option<VirtualBatch> {
    if bucket.len() == 1 {
        let root = bucket.pop()?;
        let members: Vec<BatchRecord> = root.descendants().into_iter().cloned().collect();
        return Some(assemble(root.record.clone(), members, vec![root.record.id], lot_date));
    }

    bucket.sort_by(|a, b| {
        a.record
            .name
            .cmp(&b.record.name)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });

    let (anchor, demoted) = bucket.split_first()?;
    let mut members: Vec<BatchRecord> = anchor.descendants().into_iter().cloned().collect();
    let mut root_ids = vec![anchor.record.id];
    for root in demoted {
        root_ids.push(root.record.id);
        members.push(root.record.clone());
        members.extend(root.descendants().into_iter().cloned());
    }
    members.sort_by(newest_first);

    Some(assemble(anchor.record.clone(), members, root_ids, lot_date))
}

fn assemble(
    primary: BatchRecord,
    members: Vec<BatchRecord>,
    root_ids: Vec<Uuid>,
    lot_date: NaiveDate,
) -> VirtualBatch {
    let total_quantity = saturating_sum(
        std::iter::once(primary.quantity).chain(members.iter().map(|m| m.quantity)),
    );
    VirtualBatch {
        primary,
        members,
        root_ids,
        lot_date,
        total_quantity,
    }
}

/// Build the forest and merge it in one step
pub fn build_virtual_batches(
    records: &[BatchRecord],
    policy: &GroupingPolicy,
) -> EngineResult<Vec<VirtualBatch>> {
    let forest = build_forest(records)?;
    Ok(merge_virtual_batches_with(&forest.roots, policy))
}

/// Virtual batch holding a given row, as primary or member
pub fn find_virtual_batch(batches: &[VirtualBatch], batch_id: Uuid) -> Option<&VirtualBatch> {
    batches.iter().find(|b| b.contains(batch_id))
}
