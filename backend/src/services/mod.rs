//! Business logic services for the lot lineage service

pub mod clone_lot;

pub use clone_lot::{CloneLotService, DiscardInput, LabelRangeInput, ResizeInput};
