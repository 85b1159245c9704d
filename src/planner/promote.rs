//! Unknown promotion for computed attributes.
//!
//! When a change is in flight, a computed attribute the user did not
//! configure has no planned value yet. The proposed plan carries null for it,
//! which would tell the caller the attribute will be cleared. This pass marks
//! those attributes unknown instead, so the provider can fill them at apply.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::diag::{Diagnostic, Diagnostics};
use crate::error::ValueError;
use crate::path::{AttributePath, PathStep};
use crate::schema::{Attribute, NestingMode, Schema};
use crate::value::Value;

/// Marks every computed attribute that is null in both `plan` and `config`
/// as unknown.
///
/// The pass is skipped when the plan is null (destroy) or equal to the prior
/// state (no change). Nested attributes are visited for single, list and map
/// nesting. Set elements and the children of typed attributes are not.
#[must_use]
pub fn promote_computed_nulls(
    mut plan: Value,
    config: &Value,
    prior_state: &Value,
    schema: &Schema,
) -> (Value, Diagnostics) {
    let mut diags = Diagnostics::new();

    if plan.is_null() {
        debug!("Plan is null, skipping unknown promotion");
        return (plan, diags);
    }
    if plan == *prior_state {
        debug!("Plan matches prior state, skipping unknown promotion");
        return (plan, diags);
    }

    if let Value::Object(attributes) = &mut plan {
        let promoted =
            promote_object(schema.attributes(), attributes, config, &AttributePath::root());
        debug!("Promoted {promoted} computed attributes to unknown");
    } else {
        let err = ValueError::ShapeMismatch {
            expected: "object",
            found: plan.shape_name(),
            path: AttributePath::root(),
        };
        diags.add(Diagnostic::provider_bug(
            "Plan Modification Error",
            "marking computed attributes as unknown",
            &err,
        ));
    }

    (plan, diags)
}

fn promote_object(
    schema: &BTreeMap<String, Attribute>,
    plan: &mut BTreeMap<String, Value>,
    config: &Value,
    path: &AttributePath,
) -> usize {
    let mut promoted = 0;

    for (name, attribute) in schema {
        let Some(plan_value) = plan.get_mut(name) else {
            continue;
        };
        let step = PathStep::AttributeName(name.clone());
        let config_value = config.child_or_missing(&step);
        let attribute_path = path.with_step(step);

        if attribute.is_computed() && config_value.is_null() && plan_value.is_null() {
            trace!(attribute_path = %attribute_path, "Marking computed attribute as unknown");
            *plan_value = Value::Unknown;
            promoted += 1;
            continue;
        }

        promoted += promote_nested(attribute, plan_value, config_value, &attribute_path);
    }

    promoted
}

fn promote_nested(
    attribute: &Attribute,
    plan_value: &mut Value,
    config_value: &Value,
    path: &AttributePath,
) -> usize {
    let Some(nested) = attribute.nested_attributes() else {
        return 0;
    };

    match (nested.mode, plan_value) {
        (NestingMode::Single, Value::Object(object)) => {
            promote_object(&nested.attributes, object, config_value, path)
        }
        (NestingMode::List, Value::List(items)) => items
            .iter_mut()
            .enumerate()
            .map(|(i, item)| {
                let step = PathStep::ElementIndex(i);
                let config_item = config_value.child_or_missing(&step);
                match item {
                    Value::Object(object) => {
                        promote_object(&nested.attributes, object, config_item, &path.with_step(step))
                    }
                    _ => 0,
                }
            })
            .sum(),
        (NestingMode::Map, Value::Map(entries)) => entries
            .iter_mut()
            .map(|(key, item)| {
                let step = PathStep::ElementKey(key.clone());
                let config_item = config_value.child_or_missing(&step);
                match item {
                    Value::Object(object) => {
                        promote_object(&nested.attributes, object, config_item, &path.with_step(step))
                    }
                    _ => 0,
                }
            })
            .sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::builder()
            .attribute("name", Attribute::string().required())
            .attribute("x", Attribute::string().optional().computed())
            .attribute("plain", Attribute::string().optional())
            .attribute(
                "obj",
                Attribute::single_nested([
                    ("inner", Attribute::string().computed()),
                    ("other", Attribute::string().optional()),
                ]),
            )
            .attribute(
                "rules",
                Attribute::list_nested([
                    ("port", Attribute::number().required()),
                    ("id", Attribute::string().computed()),
                ]),
            )
            .build()
    }

    fn resource(x: Value, obj: Value, rules: Value) -> Value {
        Value::object([
            ("name", Value::string("new")),
            ("x", x),
            ("plain", Value::Null),
            ("obj", obj),
            ("rules", rules),
        ])
    }

    fn at(value: &Value, path: &AttributePath) -> Value {
        value.walk(path).cloned().unwrap()
    }

    #[test]
    fn test_promotes_unconfigured_computed() {
        let schema = schema();
        let config = resource(Value::Null, Value::Null, Value::Null);
        let plan = config.clone();
        let prior = Value::Null;

        let (plan, diags) = promote_computed_nulls(plan, &config, &prior, &schema);

        assert!(diags.is_empty());
        assert!(at(&plan, &AttributePath::root().at_name("x")).is_unknown());
        assert!(at(&plan, &AttributePath::root().at_name("plain")).is_null());
    }

    #[test]
    fn test_known_plan_value_untouched() {
        let schema = schema();
        let config = resource(Value::Null, Value::Null, Value::Null);
        let plan = resource(Value::string("known-value"), Value::Null, Value::Null);

        let (plan, _) = promote_computed_nulls(plan, &config, &Value::Null, &schema);
        assert_eq!(
            at(&plan, &AttributePath::root().at_name("x")),
            Value::string("known-value")
        );
    }

    #[test]
    fn test_nested_object() {
        let schema = schema();
        let obj = Value::object([("inner", Value::Null), ("other", Value::Null)]);
        let config = resource(Value::string("set"), obj, Value::Null);
        let plan = config.clone();

        let (plan, _) = promote_computed_nulls(plan, &config, &Value::Null, &schema);

        let obj_path = AttributePath::root().at_name("obj");
        assert!(at(&plan, &obj_path.at_name("inner")).is_unknown());
        assert!(at(&plan, &obj_path.at_name("other")).is_null());
    }

    #[test]
    fn test_list_elements_by_position() {
        let schema = schema();
        let rule = |port| Value::object([("port", Value::int(port)), ("id", Value::Null)]);
        let config = resource(
            Value::string("set"),
            Value::Null,
            Value::list([rule(80)]),
        );
        // The second element has no counterpart in config.
        let plan = resource(
            Value::string("set"),
            Value::Null,
            Value::list([rule(80), rule(443)]),
        );

        let (plan, _) = promote_computed_nulls(plan, &config, &Value::Null, &schema);

        let rules = AttributePath::root().at_name("rules");
        assert!(at(&plan, &rules.at_list_index(0).at_name("id")).is_unknown());
        assert!(at(&plan, &rules.at_list_index(1).at_name("id")).is_unknown());
        assert_eq!(at(&plan, &rules.at_list_index(1).at_name("port")), Value::int(443));
    }

    fn collections() -> Schema {
        Schema::builder()
            .attribute("name", Attribute::string().required())
            .attribute(
                "rules",
                Attribute::set_nested([
                    ("port", Attribute::number().required()),
                    ("id", Attribute::string().computed()),
                ])
                .optional(),
            )
            .attribute(
                "disks",
                Attribute::map_nested([
                    ("size", Attribute::number().optional()),
                    ("id", Attribute::string().computed()),
                ])
                .optional(),
            )
            .build()
    }

    #[test]
    fn test_set_elements_not_visited() {
        let rule = Value::object([("port", Value::int(80)), ("id", Value::Null)]);
        let value = Value::object([
            ("name", Value::string("new")),
            ("rules", Value::set([rule.clone()])),
            ("disks", Value::Null),
        ]);

        let (plan, diags) = promote_computed_nulls(value.clone(), &value, &Value::Null, &collections());

        assert!(diags.is_empty());
        let element = AttributePath::root().at_name("rules").at_set_value(rule);
        assert!(at(&plan, &element.at_name("id")).is_null());
        assert_eq!(plan, value);
    }

    #[test]
    fn test_map_elements_by_key() {
        let disk = |size| Value::object([("size", Value::int(size)), ("id", Value::Null)]);
        let config = Value::object([
            ("name", Value::string("new")),
            ("rules", Value::Null),
            ("disks", Value::map([("boot", disk(10))])),
        ]);
        // "data" has no counterpart in config.
        let plan = Value::object([
            ("name", Value::string("new")),
            ("rules", Value::Null),
            ("disks", Value::map([("boot", disk(10)), ("data", disk(20))])),
        ]);

        let (plan, _) = promote_computed_nulls(plan, &config, &Value::Null, &collections());

        let disks = AttributePath::root().at_name("disks");
        assert!(at(&plan, &disks.at_map_key("boot").at_name("id")).is_unknown());
        assert!(at(&plan, &disks.at_map_key("data").at_name("id")).is_unknown());
        assert_eq!(at(&plan, &disks.at_map_key("data").at_name("size")), Value::int(20));
    }

    #[test]
    fn test_configured_map_element_child_kept() {
        let disk = |id: Value| Value::object([("size", Value::int(10)), ("id", id)]);
        let config = Value::object([
            ("name", Value::string("new")),
            ("rules", Value::Null),
            ("disks", Value::map([("boot", disk(Value::string("d-1")))])),
        ]);
        let prior = Value::object([
            ("name", Value::string("old")),
            ("rules", Value::Null),
            ("disks", Value::Null),
        ]);

        let (plan, _) = promote_computed_nulls(config.clone(), &config, &prior, &collections());
        assert_eq!(plan, config);
    }

    #[test]
    fn test_skipped_when_plan_equals_prior() {
        let schema = schema();
        let state = resource(Value::Null, Value::Null, Value::Null);

        let (plan, _) = promote_computed_nulls(state.clone(), &state, &state, &schema);
        assert_eq!(plan, state);
    }

    #[test]
    fn test_skipped_when_plan_null() {
        let (plan, diags) =
            promote_computed_nulls(Value::Null, &Value::Null, &Value::int(1), &schema());
        assert!(plan.is_null());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_non_object_plan_is_bug() {
        let (_, diags) =
            promote_computed_nulls(Value::int(1), &Value::Null, &Value::Null, &schema());
        assert!(diags.has_error());
    }
}
