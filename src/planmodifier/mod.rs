//! Attribute plan modifiers.
//!
//! A plan modifier inspects one attribute of a proposed plan and may rewrite
//! its planned value, flag it as requiring resource replacement, or report
//! diagnostics. Modifiers are stored in the schema and invoked by the modifier
//! pass in declared order.

mod requires_replace;
mod use_state_for_unknown;

pub use requires_replace::{
    ReplaceCondition, RequiresReplace, RequiresReplaceIf, RequiresReplaceIfConfigured,
};
pub use use_state_for_unknown::UseStateForUnknown;

use std::fmt::Debug;
use std::sync::Arc;

use crate::diag::Diagnostics;
use crate::error::ConfigError;
use crate::path::AttributePath;
use crate::schema::Attribute;
use crate::value::Value;

/// Everything a plan modifier may inspect.
#[derive(Debug, Clone, Copy)]
pub struct ModifyAttributePlanRequest<'a> {
    /// Path of the attribute being modified.
    pub path: &'a AttributePath,
    /// Definition of the attribute.
    pub attribute: &'a Attribute,
    /// Configuration value of the attribute.
    pub config_value: &'a Value,
    /// Prior state value of the attribute.
    pub state_value: &'a Value,
    /// Planned value of the attribute, including earlier modifiers' rewrites.
    pub plan_value: &'a Value,
    /// The whole resource configuration.
    pub config: &'a Value,
    /// The whole prior resource state.
    pub state: &'a Value,
    /// The whole resource plan as it was when the modifier pass started.
    pub plan: &'a Value,
}

impl ModifyAttributePlanRequest<'_> {
    /// Returns true when the resource is being created.
    #[must_use]
    pub const fn is_create(&self) -> bool {
        self.state.is_null()
    }

    /// Returns true when the resource is being destroyed.
    #[must_use]
    pub const fn is_destroy(&self) -> bool {
        self.plan.is_null()
    }
}

/// What a plan modifier returns.
#[derive(Debug, Clone, Default)]
pub struct ModifyAttributePlanResponse {
    /// Rewritten planned value, if the modifier changed it.
    pub plan_value: Option<Value>,
    /// Whether a change to this attribute forces replacement.
    pub requires_replace: bool,
    /// Diagnostics raised by the modifier.
    pub diagnostics: Diagnostics,
}

/// A per-attribute plan modifier.
pub trait PlanModifier: Debug + Send + Sync {
    /// Plain-text description of what the modifier does.
    fn description(&self) -> String;

    /// Markdown description of what the modifier does.
    fn markdown_description(&self) -> String {
        self.description()
    }

    /// Inspects the attribute and returns the modification to apply.
    fn modify(&self, request: &ModifyAttributePlanRequest<'_>) -> ModifyAttributePlanResponse;
}

/// Builds a built-in modifier by catalogue name.
///
/// Known names are `requires_replace`, `requires_replace_if_configured`,
/// `use_state_for_unknown` and `requires_replace_if`, the last of which needs
/// a `condition` (see [`ReplaceCondition`]).
///
/// # Errors
///
/// Returns [`ConfigError::UnknownModifier`] for unknown names and a
/// validation error when a condition is missing or unknown.
pub fn from_name(
    name: &str,
    condition: Option<&str>,
    attribute: &str,
) -> Result<Arc<dyn PlanModifier>, ConfigError> {
    let modifier: Arc<dyn PlanModifier> = match name {
        "requires_replace" => Arc::new(RequiresReplace),
        "requires_replace_if_configured" => Arc::new(RequiresReplaceIfConfigured),
        "use_state_for_unknown" => Arc::new(UseStateForUnknown),
        "requires_replace_if" => {
            let condition = condition.ok_or_else(|| {
                ConfigError::validation(
                    "Modifier requires_replace_if needs a condition",
                    attribute,
                )
            })?;
            let condition: ReplaceCondition = condition.parse().map_err(|message: String| {
                ConfigError::validation(message, attribute)
            })?;
            Arc::new(RequiresReplaceIf::from_condition(condition))
        }
        other => {
            return Err(ConfigError::UnknownModifier {
                name: other.to_string(),
                attribute: attribute.to_string(),
            });
        }
    };
    Ok(modifier)
}

/// Names accepted by [`from_name`].
pub const CATALOGUE: &[&str] = &[
    "requires_replace",
    "requires_replace_if",
    "requires_replace_if_configured",
    "use_state_for_unknown",
];
