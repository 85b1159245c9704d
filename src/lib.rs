// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![warn(dead_code)]                   // Unused code is reported
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(unused_imports)]              // Unused imports are reported
#![warn(unused_variables)]            // Unused variables are reported
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Halldyll Provider SDK
//!
//! The plan computation engine of an infrastructure-as-code resource plugin.
//!
//! ## Overview
//!
//! Given a resource's configuration, its prior state and the client's proposed
//! new state, the engine computes the planned state and the attributes whose
//! change forces the resource to be destroyed and created again:
//!
//! - Computed attributes the user did not configure are marked unknown
//! - Per-attribute plan modifiers rewrite planned values bottom-up
//! - A resource-level hook refines the plan after every attribute
//! - Requires-replace paths are deduplicated and ordered deterministically
//!
//! ## Architecture
//!
//! 1. **Schema**: Attributes, flags and plan modifiers, built in code or
//!    loaded from `halldyll.schema.yaml`
//! 2. **Values**: A typed tree with null and unknown at any position,
//!    addressed by [`path::AttributePath`]
//! 3. **Planner**: Unknown promotion followed by the modifier pass
//!
//! ## Modules
//!
//! - [`value`]: Value trees, types and the JSON transport
//! - [`path`]: Attribute paths
//! - [`schema`]: Resource schemas and attributes
//! - [`data`]: Path-addressed reads and writes on schema-typed values
//! - [`planmodifier`]: The plan modifier trait and built-in modifiers
//! - [`resource`]: Resource definitions and the resource-level hook
//! - [`planner`]: Plan computation
//! - [`diag`]: Diagnostics
//! - [`config`]: Schema document parsing and validation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! resource:
//!   type_name: example_instance
//! attributes:
//!   name:
//!     type: string
//!     required: true
//!     plan_modifiers: [requires_replace]
//!   id:
//!     type: string
//!     computed: true
//!     plan_modifiers: [use_state_for_unknown]
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod data;
pub mod diag;
pub mod error;
pub mod path;
pub mod planmodifier;
pub mod planner;
pub mod resource;
pub mod schema;
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{SchemaDocument, SchemaParser, SchemaValidator};
pub use data::{DataDescription, ResourceData};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::{Result, SdkError};
pub use path::{AttributePath, PathStep};
pub use planmodifier::PlanModifier;
pub use planner::{
    plan_resource_change, ChangeKind, PlanResourceChangeRequest, PlanResourceChangeResponse,
};
pub use resource::{Resource, ResourceWithModifyPlan};
pub use schema::{Attribute, NestingMode, Schema};
pub use value::{Type, Value};
