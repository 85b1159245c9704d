//! Plan resource change orchestration.
//!
//! This module joins the two plan passes: computed attributes are promoted to
//! unknown first, then attribute plan modifiers and the resource hook refine
//! the result.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::diag::{Diagnostic, Diagnostics};
use crate::path::AttributePath;
use crate::resource::Resource;
use crate::value::Value;

use super::modify::{cancelled_diagnostic, run_modifiers};
use super::promote::promote_computed_nulls;

/// Input of a plan computation.
#[derive(Debug, Clone)]
pub struct PlanResourceChangeRequest {
    /// The user configuration.
    pub config: Value,
    /// The state recorded after the last apply, null when creating.
    pub prior_state: Value,
    /// The client's proposal, null when destroying.
    pub proposed_new_state: Value,
}

/// Output of a plan computation.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResourceChangeResponse {
    /// The state that will be applied.
    #[serde(serialize_with = "serialize_value")]
    pub planned_state: Value,
    /// Attributes whose change forces replacement, parents first.
    pub requires_replace: Vec<AttributePath>,
    /// Everything reported while planning.
    pub diagnostics: Diagnostics,
    /// When the plan was computed.
    pub planned_at: DateTime<Utc>,
}

fn serialize_value<S: serde::Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    crate::value::encode(value).serialize(serializer)
}

/// The kind of change a plan describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The resource will be created.
    Create,
    /// The resource will be updated in place.
    Update,
    /// The resource will be destroyed and created again.
    Replace,
    /// The resource will be destroyed.
    Delete,
    /// Nothing changes.
    Noop,
}

impl PlanResourceChangeResponse {
    /// Classifies the plan against the prior state.
    #[must_use]
    pub fn change_kind(&self, prior_state: &Value) -> ChangeKind {
        match (prior_state.is_null(), self.planned_state.is_null()) {
            (true, true) => ChangeKind::Noop,
            (true, false) => ChangeKind::Create,
            (false, true) => ChangeKind::Delete,
            (false, false) if !self.requires_replace.is_empty() => ChangeKind::Replace,
            (false, false) if self.planned_state == *prior_state => ChangeKind::Noop,
            (false, false) => ChangeKind::Update,
        }
    }

    /// Returns true if the plan must not be applied.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }
}

/// Computes the planned state of one resource.
///
/// Inputs that do not conform to the resource schema are reported as provider
/// bugs and the proposal is returned unchanged. A null proposal (destroy)
/// skips both passes, and so does a token cancelled before planning starts.
#[must_use]
pub fn plan_resource_change(
    resource: &Resource,
    request: PlanResourceChangeRequest,
    cancel: &CancellationToken,
) -> PlanResourceChangeResponse {
    let schema = resource.schema();
    let mut diagnostics = Diagnostics::new();

    info!(resource_type = resource.type_name(), "Planning resource change");

    if let Some(message) = schema.deprecation_message() {
        diagnostics.add_warning(
            "Deprecated Resource",
            format!(
                "The {} resource type is deprecated. {message}",
                resource.type_name()
            ),
        );
    }

    let resource_type = schema.value_type();
    for (label, value) in [
        ("configuration", &request.config),
        ("prior state", &request.prior_state),
        ("proposed new state", &request.proposed_new_state),
    ] {
        if let Err(err) = resource_type.validate(value, &AttributePath::root()) {
            diagnostics.add(Diagnostic::provider_bug(
                "Invalid Plan Input",
                &format!("checking the {label} against the resource schema"),
                &err,
            ));
        }
    }
    if diagnostics.has_error() {
        return respond(request.proposed_new_state, Vec::new(), diagnostics);
    }

    if request.proposed_new_state.is_null() {
        debug!("Proposed new state is null, planning destroy");
        return respond(request.proposed_new_state, Vec::new(), diagnostics);
    }

    if cancel.is_cancelled() {
        warn!(resource_type = resource.type_name(), "Planning cancelled before it started");
        diagnostics.add(cancelled_diagnostic());
        return respond(request.proposed_new_state, Vec::new(), diagnostics);
    }

    let (plan, promote_diags) = promote_computed_nulls(
        request.proposed_new_state,
        &request.config,
        &request.prior_state,
        schema,
    );
    diagnostics.append(promote_diags);

    let outcome = run_modifiers(
        &request.config,
        &request.prior_state,
        plan,
        schema,
        resource.modify_plan_hook(),
        cancel,
    );
    diagnostics.append(outcome.diagnostics);

    info!(
        resource_type = resource.type_name(),
        requires_replace = outcome.requires_replace.len(),
        errors = diagnostics.errors().count(),
        "Planned resource change"
    );

    respond(outcome.plan, outcome.requires_replace, diagnostics)
}

fn respond(
    planned_state: Value,
    requires_replace: Vec<AttributePath>,
    diagnostics: Diagnostics,
) -> PlanResourceChangeResponse {
    PlanResourceChangeResponse {
        planned_state,
        requires_replace,
        diagnostics,
        planned_at: Utc::now(),
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Noop => "no-op",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for PlanResourceChangeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Planned state: {}", self.planned_state)?;

        if !self.requires_replace.is_empty() {
            writeln!(f, "\nRequires replacement:")?;
            for path in &self.requires_replace {
                writeln!(f, "  - {path}")?;
            }
        }

        if !self.diagnostics.is_empty() {
            writeln!(f, "\nDiagnostics:")?;
            for diagnostic in &self.diagnostics {
                writeln!(f, "  {diagnostic}")?;
            }
        }

        Ok(())
    }
}
