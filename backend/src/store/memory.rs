//! In-memory batch store

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use lot_lineage::{validate_snapshot, AllocationPlan, BatchRecord, BatchStatus, PlanKind};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BatchScope, BatchSink, BatchSource};
use crate::error::{AppError, AppResult};

/// Batch rows held in memory, shared between clones
#[derive(Clone, Default)]
pub struct InMemoryBatchStore {
    rows: Arc<RwLock<HashMap<Uuid, BatchRecord>>>,
}

impl InMemoryBatchStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with rows; later duplicates replace earlier ones
    pub fn from_records(records: Vec<BatchRecord>) -> Self {
        let rows = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Load a JSON array of batch records
    pub async fn load_json(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Store(format!("Failed to read {}: {}", path.display(), e)))?;
        let records: Vec<BatchRecord> = serde_json::from_str(&raw)
            .map_err(|e| AppError::Store(format!("Invalid snapshot {}: {}", path.display(), e)))?;

        tracing::info!("Loaded {} batch records from {}", records.len(), path.display());
        Self::from_snapshot(records)
    }

    /// Create a store from a host snapshot, rejecting duplicate ids and blank names
    pub fn from_snapshot(records: Vec<BatchRecord>) -> AppResult<Self> {
        validate_snapshot(&records).map_err(|message| AppError::Validation {
            field: "snapshot".to_string(),
            message: message.to_string(),
        })?;
        Ok(Self::from_records(records))
    }

    pub async fn insert(&self, record: BatchRecord) {
        self.rows.write().await.insert(record.id, record);
    }

    pub async fn get(&self, batch_id: Uuid) -> Option<BatchRecord> {
        self.rows.read().await.get(&batch_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl BatchSource for InMemoryBatchStore {
    async fn fetch(&self, scope: &BatchScope) -> AppResult<Vec<BatchRecord>> {
        let rows = self.rows.read().await;
        let mut records: Vec<BatchRecord> =
            rows.values().filter(|r| scope.includes(r)).cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }
}

impl BatchSink for InMemoryBatchStore {
    async fn apply(&self, plan: &AllocationPlan) -> AppResult<()> {
        let mut rows = self.rows.write().await;

        // Verify every entry before touching any row
        for entry in &plan.entries {
            let actual = rows.get(&entry.batch_id).map(|r| r.quantity);
            if actual != Some(entry.previous_quantity) {
                return Err(AppError::StalePlan {
                    batch_id: entry.batch_id,
                    expected: entry.previous_quantity,
                    actual,
                });
            }
        }

        for entry in &plan.entries {
            if plan.kind == PlanKind::Delete {
                rows.remove(&entry.batch_id);
                continue;
            }
            if let Some(row) = rows.get_mut(&entry.batch_id) {
                row.quantity = entry.new_quantity;
                if entry.became_exhausted {
                    row.status = BatchStatus::Discarded;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lot_lineage::PlanEntry;

    fn record(id: u128, qty: u64) -> BatchRecord {
        BatchRecord {
            id: Uuid::from_u128(id),
            name: format!("BLU-{:04}", id),
            quantity: qty,
            genetic_id: None,
            genetic_name: None,
            location_id: None,
            room_id: None,
            parent_batch_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap(),
            start_date: None,
            status: BatchStatus::Active,
            notes: None,
        }
    }

    fn plan(kind: PlanKind, entries: Vec<PlanEntry>) -> AllocationPlan {
        AllocationPlan {
            kind,
            previous_total: 0,
            target_total: 0,
            entries,
            reason: None,
        }
    }

    fn entry(id: u128, prev: u64, new: u64) -> PlanEntry {
        PlanEntry {
            batch_id: Uuid::from_u128(id),
            previous_quantity: prev,
            new_quantity: new,
            became_exhausted: new == 0,
        }
    }

    #[tokio::test]
    async fn test_apply_updates_and_marks_exhausted() {
        let store = InMemoryBatchStore::from_records(vec![record(1, 5), record(2, 3)]);
        store
            .apply(&plan(PlanKind::Discard, vec![entry(1, 5, 0), entry(2, 3, 2)]))
            .await
            .unwrap();

        let first = store.get(Uuid::from_u128(1)).await.unwrap();
        assert_eq!(first.quantity, 0);
        assert_eq!(first.status, BatchStatus::Discarded);
        assert_eq!(store.get(Uuid::from_u128(2)).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_stale_plan_is_rejected_whole() {
        let store = InMemoryBatchStore::from_records(vec![record(1, 5), record(2, 1)]);
        let err = store
            .apply(&plan(PlanKind::Discard, vec![entry(1, 5, 0), entry(2, 3, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::StalePlan {
                expected: 3,
                actual: Some(1),
                ..
            }
        ));
        // First row untouched
        assert_eq!(store.get(Uuid::from_u128(1)).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_delete_removes_rows() {
        let store = InMemoryBatchStore::from_records(vec![record(1, 5), record(2, 0)]);
        store
            .apply(&plan(PlanKind::Delete, vec![entry(1, 5, 0), entry(2, 0, 0)]))
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_fetch_respects_scope() {
        let mut in_room = record(1, 5);
        in_room.room_id = Some(Uuid::from_u128(7));
        let store = InMemoryBatchStore::from_records(vec![in_room, record(2, 3)]);

        let all = store.fetch(&BatchScope::All).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = store
            .fetch(&BatchScope::Rooms {
                ids: vec![Uuid::from_u128(7)],
            })
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, Uuid::from_u128(1));
    }

    #[tokio::test]
    async fn test_load_json_missing_file() {
        let err = InMemoryBatchStore::load_json("does/not/exist.json")
            .await
            .err()
            .unwrap();
        assert_eq!(err.code(), "STORE_ERROR");
    }

    #[tokio::test]
    async fn test_from_snapshot_rejects_duplicates() {
        let err = InMemoryBatchStore::from_snapshot(vec![record(1, 5), record(1, 3)])
            .err()
            .unwrap();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let mut blank = record(2, 1);
        blank.name = "  ".to_string();
        assert!(InMemoryBatchStore::from_snapshot(vec![blank]).is_err());

        let store = InMemoryBatchStore::from_snapshot(vec![record(1, 5), record(2, 3)]).unwrap();
        assert_eq!(store.len().await, 2);
    }
}
