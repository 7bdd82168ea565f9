//! Lineage forest builder
//!
//! Reconstructs parent/child trees from flat batch records. A record whose
//! parent is absent from the snapshot becomes an orphan root instead of an
//! error, since upstream scoping (e.g. by room) routinely filters parents out.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{saturating_sum, BatchRecord};

/// A batch record with the records split from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineageNode {
    #[serde(flatten)]
    pub record: BatchRecord,
    pub children: Vec<LineageNode>,
}

impl LineageNode {
    /// All records below this node in pre-order, children newest first
    pub fn descendants(&self) -> Vec<&BatchRecord> {
        let mut out = Vec::new();
        let mut stack: Vec<&LineageNode> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(&node.record);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Quantity held by this node and everything below it
    pub fn subtree_quantity(&self) -> u64 {
        saturating_sum(
            std::iter::once(self.record.quantity)
                .chain(self.descendants().iter().map(|r| r.quantity)),
        )
    }
}

/// Batch that references a parent missing from the snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedParent {
    pub batch_id: Uuid,
    pub parent_batch_id: Uuid,
}

/// Parent/child trees built from one snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Forest {
    /// True roots and orphan roots, newest first
    pub roots: Vec<LineageNode>,
    /// Orphans promoted to roots, in input order
    pub unresolved: Vec<UnresolvedParent>,
}

impl Forest {
    pub fn find(&self, batch_id: Uuid) -> Option<&LineageNode> {
        let mut stack: Vec<&LineageNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.record.id == batch_id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    /// Number of records across all trees
    pub fn len(&self) -> usize {
        self.roots.iter().map(|r| 1 + r.descendants().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn is_orphan(&self, batch_id: Uuid) -> bool {
        self.unresolved.iter().any(|u| u.batch_id == batch_id)
    }
}

/// Most recent first, id ascending on equal timestamps
pub(crate) fn newest_first(a: &BatchRecord, b: &BatchRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Build the lineage forest for a snapshot of batch records
///
/// Duplicate ids keep their first occurrence. Fails with
/// [`EngineError::MalformedLineage`] when parent references form a cycle.
pub fn build_forest(records: &[BatchRecord]) -> EngineResult<Forest> {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<&BatchRecord> = Vec::with_capacity(records.len());
    for record in records {
        if index.contains_key(&record.id) {
            tracing::warn!("Ignoring duplicate batch record {}", record.id);
            continue;
        }
        index.insert(record.id, unique.len());
        unique.push(record);
    }

    let mut children_of: HashMap<Uuid, Vec<usize>> = HashMap::new();
    let mut root_idxs = Vec::new();
    let mut unresolved = Vec::new();

    for (i, record) in unique.iter().enumerate() {
        match record.parent_batch_id {
            Some(parent) if index.contains_key(&parent) => {
                children_of.entry(parent).or_default().push(i);
            }
            Some(parent) => {
                unresolved.push(UnresolvedParent {
                    batch_id: record.id,
                    parent_batch_id: parent,
                });
                root_idxs.push(i);
            }
            None => root_idxs.push(i),
        }
    }

    // Pre-order walk from the roots; anything not reached hangs off a cycle
    let mut order = Vec::with_capacity(unique.len());
    let mut visited: HashSet<Uuid> = HashSet::with_capacity(unique.len());
    let mut stack = root_idxs.clone();
    while let Some(i) = stack.pop() {
        let id = unique[i].id;
        if !visited.insert(id) {
            return Err(EngineError::MalformedLineage { batch_id: id });
        }
        order.push(i);
        if let Some(kids) = children_of.get(&id) {
            stack.extend(kids.iter().copied());
        }
    }

    if order.len() != unique.len() {
        let stuck = unique
            .iter()
            .find(|r| !visited.contains(&r.id))
            .map(|r| r.id)
            .unwrap_or_default();
        return Err(EngineError::MalformedLineage { batch_id: stuck });
    }

    // Children precede parents in reverse pre-order
    let mut built: HashMap<Uuid, LineageNode> = HashMap::with_capacity(unique.len());
    for &i in order.iter().rev() {
        let record = unique[i];
        let mut children: Vec<LineageNode> = children_of
            .get(&record.id)
            .map(|kids| {
                kids.iter()
                    .filter_map(|&k| built.remove(&unique[k].id))
                    .collect()
            })
            .unwrap_or_default();
        children.sort_by(|a, b| newest_first(&a.record, &b.record));
        built.insert(
            record.id,
            LineageNode {
                record: record.clone(),
                children,
            },
        );
    }

    let mut roots: Vec<LineageNode> = root_idxs
        .iter()
        .filter_map(|&i| built.remove(&unique[i].id))
        .collect();
    roots.sort_by(|a, b| newest_first(&a.record, &b.record));

    if !unresolved.is_empty() {
        tracing::warn!(
            "Promoted {} batches with missing parents to orphan roots",
            unresolved.len()
        );
    }
    tracing::debug!(
        "Built lineage forest: {} records, {} roots",
        unique.len(),
        roots.len()
    );

    Ok(Forest { roots, unresolved })
}

/// Parent chain of a batch, root first and ending with the batch itself
///
/// Walks `parent_batch_id` links within the snapshot; stops at the first
/// parent that is not present. Returns an empty chain for unknown ids.
pub fn ancestry(records: &[BatchRecord], batch_id: Uuid) -> EngineResult<Vec<Uuid>> {
    let by_id: HashMap<Uuid, &BatchRecord> = records.iter().rev().map(|r| (r.id, r)).collect();

    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = by_id.get(&batch_id).copied();
    while let Some(record) = current {
        if !seen.insert(record.id) {
            return Err(EngineError::MalformedLineage {
                batch_id: record.id,
            });
        }
        chain.push(record.id);
        current = record.parent_batch_id.and_then(|p| by_id.get(&p).copied());
    }

    chain.reverse();
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchStatus;
    use chrono::{TimeZone, Utc};

    fn rec(id: u128, parent: Option<u128>, day: u32, hour: u32, qty: u64) -> BatchRecord {
        BatchRecord {
            id: Uuid::from_u128(id),
            name: format!("LOT-{:04}", id),
            quantity: qty,
            genetic_id: None,
            genetic_name: None,
            location_id: None,
            room_id: None,
            parent_batch_id: parent.map(Uuid::from_u128),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            start_date: None,
            status: BatchStatus::Active,
            notes: None,
        }
    }

    #[test]
    fn test_children_attached_newest_first() {
        let records = vec![
            rec(1, None, 1, 8, 10),
            rec(2, Some(1), 2, 8, 3),
            rec(3, Some(1), 4, 8, 2),
            rec(4, Some(1), 3, 8, 1),
        ];
        let forest = build_forest(&records).unwrap();

        assert_eq!(forest.roots.len(), 1);
        let ids: Vec<u128> = forest.roots[0]
            .children
            .iter()
            .map(|c| c.record.id.as_u128())
            .collect();
        assert_eq!(ids, vec![3, 4, 2]);
        assert!(forest.unresolved.is_empty());
    }

    #[test]
    fn test_orphan_becomes_root() {
        let records = vec![rec(1, None, 1, 8, 10), rec(2, Some(99), 2, 8, 3)];
        let forest = build_forest(&records).unwrap();

        assert_eq!(forest.roots.len(), 2);
        assert_eq!(
            forest.unresolved,
            vec![UnresolvedParent {
                batch_id: Uuid::from_u128(2),
                parent_batch_id: Uuid::from_u128(99),
            }]
        );
        assert!(forest.is_orphan(Uuid::from_u128(2)));
        // Newest root first
        assert_eq!(forest.roots[0].record.id, Uuid::from_u128(2));
    }

    #[test]
    fn test_nested_lineage_and_descendants() {
        let records = vec![
            rec(1, None, 1, 8, 5),
            rec(2, Some(1), 2, 8, 4),
            rec(3, Some(2), 3, 8, 3),
            rec(4, Some(1), 4, 8, 2),
        ];
        let forest = build_forest(&records).unwrap();
        let root = &forest.roots[0];

        let order: Vec<u128> = root.descendants().iter().map(|r| r.id.as_u128()).collect();
        assert_eq!(order, vec![4, 2, 3]);
        assert_eq!(root.subtree_quantity(), 14);
        assert_eq!(forest.len(), 4);
        assert!(forest.find(Uuid::from_u128(3)).is_some());
        assert!(forest.find(Uuid::from_u128(42)).is_none());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut dup = rec(2, Some(1), 2, 8, 99);
        dup.name = "DUPLICATE".to_string();
        let records = vec![rec(1, None, 1, 8, 5), rec(2, Some(1), 2, 8, 4), dup];
        let forest = build_forest(&records).unwrap();

        assert_eq!(forest.len(), 2);
        assert_eq!(forest.roots[0].children[0].record.quantity, 4);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let records = vec![
            rec(1, None, 1, 8, 5),
            rec(2, Some(3), 2, 8, 4),
            rec(3, Some(2), 3, 8, 3),
        ];
        let err = build_forest(&records).unwrap_err();
        assert_eq!(
            err,
            EngineError::MalformedLineage {
                batch_id: Uuid::from_u128(2)
            }
        );
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let records = vec![rec(7, Some(7), 1, 8, 5)];
        assert!(matches!(
            build_forest(&records),
            Err(EngineError::MalformedLineage { .. })
        ));
    }

    #[test]
    fn test_empty_snapshot() {
        let forest = build_forest(&[]).unwrap();
        assert!(forest.is_empty());
        assert_eq!(forest.len(), 0);
    }

    #[test]
    fn test_ancestry_chain() {
        let records = vec![
            rec(1, None, 1, 8, 5),
            rec(2, Some(1), 2, 8, 4),
            rec(3, Some(2), 3, 8, 3),
        ];
        let chain = ancestry(&records, Uuid::from_u128(3)).unwrap();
        assert_eq!(
            chain,
            vec![Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)]
        );
        assert!(ancestry(&records, Uuid::from_u128(50)).unwrap().is_empty());
    }

    #[test]
    fn test_ancestry_cycle() {
        let records = vec![rec(2, Some(3), 2, 8, 4), rec(3, Some(2), 3, 8, 3)];
        assert!(ancestry(&records, Uuid::from_u128(2)).is_err());
    }
}
