//! Clone lot service
//!
//! Runs fetch → recompute → plan → apply for virtual batches. Every call starts
//! from a fresh snapshot, so a plan is never computed against quantities read
//! by an earlier call.

use lot_lineage::{
    ancestry, build_virtual_batches, expand_units, find_virtual_batch, next_batch_name, plan_delete,
    plan_discard, plan_resize, select_units, AllocationPlan, Amount, GroupingPolicy, UnitRef,
    VirtualBatch, VirtualBatchSummary,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::{BatchScope, BatchSink, BatchSource};

/// Clone lot service over a record source/sink
#[derive(Clone)]
pub struct CloneLotService<S> {
    store: S,
    policy: GroupingPolicy,
}

/// Input for discarding units from a virtual batch
#[derive(Debug, Deserialize, Validate)]
pub struct DiscardInput {
    pub amount: i64,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Input for setting the unit count of a virtual batch
#[derive(Debug, Deserialize, Validate)]
pub struct ResizeInput {
    pub new_total: i64,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Input for printing labels for a range of units
#[derive(Debug, Deserialize, Validate)]
pub struct LabelRangeInput {
    #[validate(range(min = 1, message = "Range must start at unit 1 or later"))]
    pub from: u32,
    #[validate(range(min = 1, message = "Range must end at unit 1 or later"))]
    pub to: u32,
}

impl<S> CloneLotService<S>
where
    S: BatchSource + BatchSink + Sync,
{
    /// Create a new CloneLotService instance
    pub fn new(store: S, policy: GroupingPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &GroupingPolicy {
        &self.policy
    }

    async fn virtual_batches(&self, scope: &BatchScope) -> AppResult<Vec<VirtualBatch>> {
        let records = self.store.fetch(scope).await?;
        Ok(build_virtual_batches(&records, &self.policy)?)
    }

    /// List virtual batches in a scope, newest first
    pub async fn list(&self, scope: &BatchScope) -> AppResult<Vec<VirtualBatchSummary>> {
        let batches = self.virtual_batches(scope).await?;
        Ok(batches.iter().map(VirtualBatch::summary).collect())
    }

    /// Get the virtual batch holding a row, looked up by any of its row ids
    pub async fn get(&self, scope: &BatchScope, batch_id: Uuid) -> AppResult<VirtualBatch> {
        let batches = self.virtual_batches(scope).await?;
        find_virtual_batch(&batches, batch_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))
    }

    /// Every addressable unit of a virtual batch
    pub async fn units(&self, scope: &BatchScope, batch_id: Uuid) -> AppResult<Vec<UnitRef>> {
        let batch = self.get(scope, batch_id).await?;
        Ok(expand_units(&batch))
    }

    /// Units in a global index range, for label printing
    pub async fn label_range(
        &self,
        scope: &BatchScope,
        batch_id: Uuid,
        input: LabelRangeInput,
    ) -> AppResult<Vec<UnitRef>> {
        input.validate()?;
        let batch = self.get(scope, batch_id).await?;
        Ok(select_units(&batch, input.from.into(), input.to.into())?)
    }

    /// Discard units, consuming the primary first
    pub async fn discard(
        &self,
        scope: &BatchScope,
        batch_id: Uuid,
        input: DiscardInput,
    ) -> AppResult<AllocationPlan> {
        input.validate()?;
        let batch = self.get(scope, batch_id).await?;
        let Amount(amount) = Amount::try_from_signed(input.amount, batch.total_quantity)?;
        let plan = plan_discard(&batch, amount)?.with_reason(input.reason);

        self.store.apply(&plan).await?;
        tracing::info!(
            "Discarded {} units from virtual batch {} across {} rows (reason: {})",
            amount,
            batch.primary.id,
            plan.entries.len(),
            plan.reason.as_deref().unwrap_or("none")
        );
        Ok(plan)
    }

    /// Set the unit count of a virtual batch
    pub async fn resize(
        &self,
        scope: &BatchScope,
        batch_id: Uuid,
        input: ResizeInput,
    ) -> AppResult<AllocationPlan> {
        input.validate()?;
        let batch = self.get(scope, batch_id).await?;
        let Amount(new_total) = Amount::try_from_signed(input.new_total, batch.total_quantity)?;
        let plan = plan_resize(&batch, new_total)?.with_reason(input.reason);

        if plan.is_empty() {
            tracing::debug!("Resize of virtual batch {} is a no-op", batch.primary.id);
            return Ok(plan);
        }

        self.store.apply(&plan).await?;
        tracing::info!(
            "Resized virtual batch {} from {} to {} units (reason: {})",
            batch.primary.id,
            plan.previous_total,
            plan.target_total,
            plan.reason.as_deref().unwrap_or("none")
        );
        Ok(plan)
    }

    /// Delete every row of a virtual batch
    pub async fn delete(&self, scope: &BatchScope, batch_id: Uuid) -> AppResult<AllocationPlan> {
        let batch = self.get(scope, batch_id).await?;
        let plan = plan_delete(&batch);

        self.store.apply(&plan).await?;
        tracing::info!(
            "Deleted virtual batch {} ({} rows)",
            batch.primary.id,
            plan.entries.len()
        );
        Ok(plan)
    }

    /// Parent chain of a row across the whole store, root first
    pub async fn lineage(&self, batch_id: Uuid) -> AppResult<Vec<Uuid>> {
        let records = self.store.fetch(&BatchScope::All).await?;
        let chain = ancestry(&records, batch_id)?;
        if chain.is_empty() {
            return Err(AppError::NotFound("Batch".to_string()));
        }
        Ok(chain)
    }

    /// Next unused `{PREFIX}-{NNNN}` name for a genetic line
    pub async fn next_batch_name(&self, genetic_name: &str) -> AppResult<String> {
        let records = self.store.fetch(&BatchScope::All).await?;
        Ok(next_batch_name(
            records.iter().map(|r| r.name.as_str()),
            genetic_name,
        ))
    }
}
