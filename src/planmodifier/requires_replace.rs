//! Requires-replace plan modifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::diag::Diagnostics;

use super::{ModifyAttributePlanRequest, ModifyAttributePlanResponse, PlanModifier};

/// Returns true when a replacement flag is meaningless for this request:
/// on create, on destroy, for a computed attribute left unset in the
/// configuration, and when the planned value equals the prior state.
fn skip_replace(request: &ModifyAttributePlanRequest<'_>) -> bool {
    if request.is_create() || request.is_destroy() {
        return true;
    }
    if request.attribute.is_computed() && request.config_value.is_null() {
        return true;
    }
    request.plan_value == request.state_value
}

/// Flags any change to the attribute as requiring replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiresReplace;

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        String::from("If the value of this attribute changes, the resource will be replaced.")
    }

    fn markdown_description(&self) -> String {
        String::from(
            "If the value of this attribute changes, the resource will be destroyed and recreated.",
        )
    }

    fn modify(&self, request: &ModifyAttributePlanRequest<'_>) -> ModifyAttributePlanResponse {
        ModifyAttributePlanResponse {
            requires_replace: !skip_replace(request),
            ..ModifyAttributePlanResponse::default()
        }
    }
}

/// Flags a change as requiring replacement only when the attribute is set
/// in the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiresReplaceIfConfigured;

impl PlanModifier for RequiresReplaceIfConfigured {
    fn description(&self) -> String {
        String::from(
            "If the value of this attribute is configured and changes, the resource will be replaced.",
        )
    }

    fn modify(&self, request: &ModifyAttributePlanRequest<'_>) -> ModifyAttributePlanResponse {
        let requires_replace = !request.config_value.is_null() && !skip_replace(request);
        ModifyAttributePlanResponse {
            requires_replace,
            ..ModifyAttributePlanResponse::default()
        }
    }
}

/// Built-in predicates for [`RequiresReplaceIf`], selectable by name from a
/// schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceCondition {
    /// The planned number is lower than the prior one.
    ValueDecreased,
    /// The planned number is higher than the prior one.
    ValueIncreased,
    /// The attribute had a value in the prior state.
    StateNotNull,
}

impl ReplaceCondition {
    /// Evaluates the condition.
    #[must_use]
    pub fn holds(self, request: &ModifyAttributePlanRequest<'_>) -> bool {
        match self {
            Self::ValueDecreased => matches!(
                (request.plan_value.as_f64(), request.state_value.as_f64()),
                (Some(planned), Some(prior)) if planned < prior
            ),
            Self::ValueIncreased => matches!(
                (request.plan_value.as_f64(), request.state_value.as_f64()),
                (Some(planned), Some(prior)) if planned > prior
            ),
            Self::StateNotNull => !request.state_value.is_null(),
        }
    }

    /// Returns the catalogue name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValueDecreased => "value_decreased",
            Self::ValueIncreased => "value_increased",
            Self::StateNotNull => "state_not_null",
        }
    }
}

impl FromStr for ReplaceCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value_decreased" => Ok(Self::ValueDecreased),
            "value_increased" => Ok(Self::ValueIncreased),
            "state_not_null" => Ok(Self::StateNotNull),
            other => Err(format!(
                "Unknown requires_replace_if condition '{other}'. \
                 Valid: value_decreased, value_increased, state_not_null"
            )),
        }
    }
}

impl fmt::Display for ReplaceCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate deciding whether a change requires replacement.
pub type ReplaceIfFn =
    dyn Fn(&ModifyAttributePlanRequest<'_>) -> (bool, Diagnostics) + Send + Sync;

/// Flags a change as requiring replacement when a predicate says so.
#[derive(Clone)]
pub struct RequiresReplaceIf {
    predicate: Arc<ReplaceIfFn>,
    description: String,
    markdown_description: String,
}

impl RequiresReplaceIf {
    /// Creates the modifier from a predicate and its descriptions.
    pub fn new<F>(
        predicate: F,
        description: impl Into<String>,
        markdown_description: impl Into<String>,
    ) -> Self
    where
        F: Fn(&ModifyAttributePlanRequest<'_>) -> (bool, Diagnostics) + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: description.into(),
            markdown_description: markdown_description.into(),
        }
    }

    /// Creates the modifier from a built-in condition.
    #[must_use]
    pub fn from_condition(condition: ReplaceCondition) -> Self {
        let description = match condition {
            ReplaceCondition::ValueDecreased => {
                "If the value of this attribute decreases, the resource will be replaced."
            }
            ReplaceCondition::ValueIncreased => {
                "If the value of this attribute increases, the resource will be replaced."
            }
            ReplaceCondition::StateNotNull => {
                "If this attribute changes after it was first set, the resource will be replaced."
            }
        };
        Self::new(
            move |request| (condition.holds(request), Diagnostics::new()),
            description,
            description,
        )
    }
}

impl fmt::Debug for RequiresReplaceIf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequiresReplaceIf")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl PlanModifier for RequiresReplaceIf {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn markdown_description(&self) -> String {
        self.markdown_description.clone()
    }

    fn modify(&self, request: &ModifyAttributePlanRequest<'_>) -> ModifyAttributePlanResponse {
        let mut response = ModifyAttributePlanResponse::default();
        if skip_replace(request) {
            return response;
        }

        let (requires_replace, diagnostics) = (self.predicate)(request);
        response.requires_replace = requires_replace;
        response.diagnostics = diagnostics;
        response
    }
}
