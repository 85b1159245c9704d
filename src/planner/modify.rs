//! Plan modifier execution.
//!
//! Walks the plan in lockstep with configuration and prior state, running each
//! attribute's plan modifiers bottom-up: every nested attribute's modifiers
//! finish before those of the attribute containing it. When a chain fails, its
//! remaining ancestors are skipped while siblings still run. The resource-level
//! hook runs last, unless the pass was cancelled.

use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::data::{DataDescription, ResourceData};
use crate::diag::{Diagnostic, Diagnostics};
use crate::error::ValueError;
use crate::path::{AttributePath, PathStep, normalize_requires_replace};
use crate::planmodifier::ModifyAttributePlanRequest;
use crate::resource::{ModifyResourcePlanRequest, ModifyResourcePlanResponse, ResourceWithModifyPlan};
use crate::schema::{Attribute, NestingMode, Schema};
use crate::value::Value;

/// Summary of the cancellation diagnostic.
pub const CANCELLED_SUMMARY: &str = "Plan Modification Cancelled";

/// The error reported when planning stops on cancellation.
pub(crate) fn cancelled_diagnostic() -> Diagnostic {
    Diagnostic::error(
        CANCELLED_SUMMARY,
        "Plan modification was cancelled before all plan modifiers ran. \
         The returned plan is incomplete and must not be applied.",
    )
}

/// Result of the modifier pass.
#[derive(Debug, Clone)]
pub struct ModifierPassOutcome {
    /// The modified plan.
    pub plan: Value,
    /// Sorted, deduplicated paths that force replacement.
    pub requires_replace: Vec<AttributePath>,
    /// Diagnostics from modifiers, the hook, and the pass itself.
    pub diagnostics: Diagnostics,
    /// Whether the pass stopped on cancellation.
    pub cancelled: bool,
}

/// How an attribute chain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    Resolved,
    Failed,
    Cancelled,
}

impl Chain {
    /// Folds a sibling result into this one.
    const fn join(self, other: Self) -> Self {
        match (self, other) {
            (Self::Cancelled, _) | (_, Self::Cancelled) => Self::Cancelled,
            (Self::Failed, _) | (_, Self::Failed) => Self::Failed,
            _ => Self::Resolved,
        }
    }
}

struct ModifierPass<'a> {
    config: &'a Value,
    state: &'a Value,
    snapshot: &'a Value,
    cancel: &'a CancellationToken,
    requires_replace: Vec<AttributePath>,
    diagnostics: Diagnostics,
    invocations: usize,
}

/// Runs every attribute plan modifier and then the resource hook.
///
/// A null plan is returned untouched with no replacement paths. Modifiers see
/// the whole plan as it was when the pass started, plus their own attribute's
/// current planned value.
#[must_use]
pub fn run_modifiers(
    config: &Value,
    prior_state: &Value,
    plan: Value,
    schema: &Schema,
    hook: Option<&dyn ResourceWithModifyPlan>,
    cancel: &CancellationToken,
) -> ModifierPassOutcome {
    if cancel.is_cancelled() {
        warn!("Plan modification cancelled before any plan modifier ran");
        return ModifierPassOutcome {
            plan,
            requires_replace: Vec::new(),
            diagnostics: Diagnostics::from(cancelled_diagnostic()),
            cancelled: true,
        };
    }

    if plan.is_null() {
        debug!("Plan is null, skipping plan modifiers");
        return ModifierPassOutcome {
            plan,
            requires_replace: Vec::new(),
            diagnostics: Diagnostics::new(),
            cancelled: false,
        };
    }

    let snapshot = plan.clone();
    let mut plan = plan;
    let mut pass = ModifierPass {
        config,
        state: prior_state,
        snapshot: &snapshot,
        cancel,
        requires_replace: Vec::new(),
        diagnostics: Diagnostics::new(),
        invocations: 0,
    };

    let chain = if let Value::Object(attributes) = &mut plan {
        pass.visit_object(schema.attributes(), attributes, config, prior_state, &AttributePath::root())
    } else {
        let err = ValueError::ShapeMismatch {
            expected: "object",
            found: plan.shape_name(),
            path: AttributePath::root(),
        };
        pass.diagnostics.add(Diagnostic::provider_bug(
            "Plan Modification Error",
            "running attribute plan modifiers",
            &err,
        ));
        Chain::Failed
    };

    debug!(
        "Ran {} attribute plan modifiers, {} attributes require replacement",
        pass.invocations,
        pass.requires_replace.len()
    );

    // The token may fire after the last modifier ran.
    let cancelled = chain == Chain::Cancelled || cancel.is_cancelled();
    if cancelled {
        pass.diagnostics.add(cancelled_diagnostic());
        warn!("Plan modification cancelled, skipping resource plan hook");
    } else if let Some(hook) = hook {
        plan = pass.run_hook(hook, schema, plan);
    }

    ModifierPassOutcome {
        plan,
        requires_replace: normalize_requires_replace(pass.requires_replace),
        diagnostics: pass.diagnostics,
        cancelled,
    }
}

impl ModifierPass<'_> {
    fn visit_object(
        &mut self,
        attributes: &BTreeMap<String, Attribute>,
        plan: &mut BTreeMap<String, Value>,
        config: &Value,
        state: &Value,
        path: &AttributePath,
    ) -> Chain {
        let mut result = Chain::Resolved;

        for (name, attribute) in attributes {
            let Some(plan_value) = plan.get_mut(name) else {
                continue;
            };
            let step = PathStep::AttributeName(name.clone());
            let chain = self.visit_attribute(
                &path.with_step(step.clone()),
                attribute,
                config.child_or_missing(&step),
                state.child_or_missing(&step),
                plan_value,
            );
            if chain == Chain::Cancelled {
                return chain;
            }
            result = result.join(chain);
        }

        result
    }

    fn visit_attribute(
        &mut self,
        path: &AttributePath,
        attribute: &Attribute,
        config_value: &Value,
        state_value: &Value,
        plan_value: &mut Value,
    ) -> Chain {
        match self.visit_nested(path, attribute, config_value, state_value, plan_value) {
            Chain::Resolved => {}
            Chain::Failed => {
                trace!(attribute_path = %path, "Skipping plan modifiers after nested error");
                return Chain::Failed;
            }
            Chain::Cancelled => return Chain::Cancelled,
        }

        self.run_chain(path, attribute, config_value, state_value, plan_value)
    }

    fn visit_nested(
        &mut self,
        path: &AttributePath,
        attribute: &Attribute,
        config_value: &Value,
        state_value: &Value,
        plan_value: &mut Value,
    ) -> Chain {
        let Some(nested) = attribute.nested_attributes() else {
            return Chain::Resolved;
        };

        let mut result = Chain::Resolved;

        match (nested.mode, &mut *plan_value) {
            (NestingMode::Single, Value::Object(object)) => {
                result = self.visit_object(&nested.attributes, object, config_value, state_value, path);
            }
            (NestingMode::List, Value::List(items)) => {
                for (i, item) in items.iter_mut().enumerate() {
                    let step = PathStep::ElementIndex(i);
                    result = result.join(self.visit_element(&nested.attributes, &step, item, config_value, state_value, path));
                    if result == Chain::Cancelled {
                        return result;
                    }
                }
            }
            (NestingMode::Map, Value::Map(entries)) => {
                for (key, item) in entries.iter_mut() {
                    let step = PathStep::ElementKey(key.clone());
                    result = result.join(self.visit_element(&nested.attributes, &step, item, config_value, state_value, path));
                    if result == Chain::Cancelled {
                        return result;
                    }
                }
            }
            (NestingMode::Set, Value::Set(items)) => {
                // Set elements are correlated with configuration and state by
                // their value before modification.
                for item in items.iter_mut() {
                    let step = PathStep::ElementValue(item.clone());
                    result = result.join(self.visit_element(&nested.attributes, &step, item, config_value, state_value, path));
                    if result == Chain::Cancelled {
                        return result;
                    }
                }
            }
            _ => {}
        }

        let merged = plan_value.dedup_set();
        if merged > 0 {
            debug!(attribute_path = %path, "Merged {merged} set elements made equal by plan modifiers");
        }

        result
    }

    fn visit_element(
        &mut self,
        attributes: &BTreeMap<String, Attribute>,
        step: &PathStep,
        item: &mut Value,
        config_value: &Value,
        state_value: &Value,
        path: &AttributePath,
    ) -> Chain {
        let Value::Object(object) = item else {
            return Chain::Resolved;
        };
        self.visit_object(
            attributes,
            object,
            config_value.child_or_missing(step),
            state_value.child_or_missing(step),
            &path.with_step(step.clone()),
        )
    }

    fn run_chain(
        &mut self,
        path: &AttributePath,
        attribute: &Attribute,
        config_value: &Value,
        state_value: &Value,
        plan_value: &mut Value,
    ) -> Chain {
        let mut requires_replace = false;
        let mut result = Chain::Resolved;

        for modifier in attribute.plan_modifiers() {
            if self.cancel.is_cancelled() {
                self.diagnostics.add(cancelled_diagnostic());
                result = Chain::Cancelled;
                break;
            }

            let response = modifier.modify(&ModifyAttributePlanRequest {
                path,
                attribute,
                config_value,
                state_value,
                plan_value,
                config: self.config,
                state: self.state,
                plan: self.snapshot,
            });
            self.invocations += 1;

            trace!(
                attribute_path = %path,
                modifier = %modifier.description(),
                requires_replace = response.requires_replace,
                "Called plan modifier"
            );

            requires_replace |= response.requires_replace;
            let failed = response.diagnostics.has_error();
            self.diagnostics.append(response.diagnostics);

            if let Some(value) = response.plan_value {
                match attribute.value_type().validate(&value, path) {
                    Ok(()) => *plan_value = value,
                    Err(err) => {
                        self.diagnostics.add(
                            Diagnostic::provider_bug(
                                "Plan Modification Error",
                                "applying the planned value returned by a plan modifier",
                                &err,
                            )
                            .with_path(path.clone()),
                        );
                        result = Chain::Failed;
                        break;
                    }
                }
            }

            if failed {
                result = Chain::Failed;
                break;
            }
        }

        if requires_replace {
            debug!(attribute_path = %path, "Attribute requires replacement");
            self.requires_replace.push(path.clone());
        }

        result
    }

    fn run_hook(&mut self, hook: &dyn ResourceWithModifyPlan, schema: &Schema, plan: Value) -> Value {
        let request = ModifyResourcePlanRequest {
            config: ResourceData::new(schema, DataDescription::Configuration, self.config.clone()),
            state: ResourceData::new(schema, DataDescription::State, self.state.clone()),
        };
        let mut response = ModifyResourcePlanResponse {
            plan: ResourceData::new(schema, DataDescription::Plan, plan),
            requires_replace: Vec::new(),
            diagnostics: Diagnostics::new(),
        };

        hook.modify_plan(&request, &mut response);
        debug!(
            "Resource plan hook returned {} requires-replace paths and {} diagnostics",
            response.requires_replace.len(),
            response.diagnostics.len()
        );

        self.requires_replace.append(&mut response.requires_replace);
        self.diagnostics.append(response.diagnostics);
        response.plan.into_value()
    }
}
