pub mod pipeline;
pub mod reconcile;
pub mod snapshot;

pub use pipeline::{ClearedFamily, FamilyReport, Pipeline, PipelineOptions, RunReport};
pub use reconcile::{ApplyRow, EntityReconciler, OwnerAllocators};
pub use snapshot::Snapshot;
