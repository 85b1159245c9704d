//! Plan computation for resource changes.
//!
//! This module refines a client's proposed new state into the planned state:
//! computed attributes are promoted to unknown, then plan modifiers and the
//! resource hook run over the result.

mod modify;
mod plan;
mod promote;

pub use modify::{CANCELLED_SUMMARY, ModifierPassOutcome, run_modifiers};
pub use plan::{
    ChangeKind, PlanResourceChangeRequest, PlanResourceChangeResponse, plan_resource_change,
};
pub use promote::promote_computed_nulls;
