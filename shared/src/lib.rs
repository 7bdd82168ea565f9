//! Batch lineage aggregation and unit-virtualization engine
//!
//! Turns a flat snapshot of batch records into lineage trees, folds roots that
//! belong to the same production run into virtual batches, addresses every
//! physical unit of a virtual batch by position, and computes
//! quantity-conserving allocation plans for discard, resize and delete.
//!
//! Every function is a pure recompute over the snapshot it is given. Fetching
//! records and applying plans is left to the host.

pub mod allocation;
pub mod error;
pub mod lineage;
pub mod merge;
pub mod models;
pub mod naming;
pub mod types;
pub mod units;
pub mod validation;

pub use allocation::*;
pub use error::*;
pub use lineage::*;
pub use merge::*;
pub use models::*;
pub use naming::*;
pub use types::*;
pub use units::*;
pub use validation::*;
