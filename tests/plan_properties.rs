use halldyll_provider_sdk::path::normalize_requires_replace;
use halldyll_provider_sdk::planmodifier::{
    ModifyAttributePlanRequest, ModifyAttributePlanResponse, PlanModifier,
};
use halldyll_provider_sdk::planner::{promote_computed_nulls, run_modifiers};
use halldyll_provider_sdk::{Attribute, AttributePath, Schema, Value};
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct Answer(bool);

impl PlanModifier for Answer {
    fn description(&self) -> String {
        format!("answers {}", self.0)
    }

    fn modify(&self, _request: &ModifyAttributePlanRequest<'_>) -> ModifyAttributePlanResponse {
        ModifyAttributePlanResponse {
            requires_replace: self.0,
            ..ModifyAttributePlanResponse::default()
        }
    }
}

/// Flags of one generated attribute.
#[derive(Debug, Clone, Copy)]
enum Flags {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

fn flags() -> impl Strategy<Value = Flags> {
    prop_oneof![
        Just(Flags::Required),
        Just(Flags::Optional),
        Just(Flags::Computed),
        Just(Flags::OptionalComputed),
    ]
}

fn maybe_string() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Null), "[a-z]{1,4}".prop_map(Value::string)]
}

/// Where the prior state of a generated resource comes from.
#[derive(Debug, Clone, Copy)]
enum Prior {
    /// Creating: no prior state.
    Absent,
    /// Nothing changed: the prior state equals the plan.
    SameAsPlan,
    /// Updating: the generated per-attribute prior values.
    Generated,
}

fn prior() -> impl Strategy<Value = Prior> {
    prop_oneof![Just(Prior::Absent), Just(Prior::SameAsPlan), Just(Prior::Generated)]
}

/// A generated resource: per attribute its flags, config, plan and prior
/// values.
fn resource() -> impl Strategy<Value = (Vec<(Flags, Value, Value, Value)>, Prior)> {
    (
        prop::collection::vec((flags(), maybe_string(), maybe_string(), maybe_string()), 1..6),
        prior(),
    )
}

fn build(attrs: &[(Flags, Value, Value, Value)], source: Prior) -> (Schema, Value, Value, Value) {
    let mut builder = Schema::builder();
    let mut config = Vec::new();
    let mut plan = Vec::new();
    let mut prior = Vec::new();
    for (i, (flags, config_value, plan_value, prior_value)) in attrs.iter().enumerate() {
        let name = format!("a{i}");
        let attribute = match flags {
            Flags::Required => Attribute::string().required(),
            Flags::Optional => Attribute::string().optional(),
            Flags::Computed => Attribute::string().computed(),
            Flags::OptionalComputed => Attribute::string().optional().computed(),
        };
        builder = builder.attribute(name.clone(), attribute);
        config.push((name.clone(), config_value.clone()));
        plan.push((name.clone(), plan_value.clone()));
        prior.push((name, prior_value.clone()));
    }
    let plan = Value::object(plan);
    let prior = match source {
        Prior::Absent => Value::Null,
        Prior::SameAsPlan => plan.clone(),
        Prior::Generated => Value::object(prior),
    };
    (builder.build(), Value::object(config), plan, prior)
}

fn path_pool() -> Vec<AttributePath> {
    let root = AttributePath::root();
    vec![
        root.at_name("name1"),
        root.at_name("list").at_list_index(1234),
        root.at_name("list"),
        root.at_name("list").at_list_index(2).at_name("id"),
        root.at_name("tags").at_map_key("env"),
        root.at_name("rules").at_set_value(Value::int(80)),
        root.at_name("rules"),
    ]
}

proptest! {
    #[test]
    fn prop_promotion_is_idempotent((attrs, source) in resource()) {
        let (schema, config, plan, prior) = build(&attrs, source);

        let (once, _) = promote_computed_nulls(plan, &config, &prior, &schema);
        let (twice, _) = promote_computed_nulls(once.clone(), &config, &prior, &schema);

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_promotion_only_touches_computed((attrs, source) in resource()) {
        let (schema, config, plan, prior) = build(&attrs, source);

        let (promoted, _) = promote_computed_nulls(plan.clone(), &config, &prior, &schema);
        if plan == prior {
            prop_assert_eq!(&promoted, &plan);
        }

        for (i, (flags, _, _, _)) in attrs.iter().enumerate() {
            let path = AttributePath::root().at_name(format!("a{i}"));
            let before = plan.walk(&path).unwrap();
            let after = promoted.walk(&path).unwrap();
            match flags {
                Flags::Required | Flags::Optional => prop_assert_eq!(before, after),
                Flags::Computed | Flags::OptionalComputed => {
                    prop_assert!(before == after || (before.is_null() && after.is_unknown()));
                }
            }
        }
    }

    #[test]
    fn prop_requires_replace_is_sticky(answers in prop::collection::vec(any::<bool>(), 0..8)) {
        let mut attribute = Attribute::string().required();
        for answer in &answers {
            attribute = attribute.with_plan_modifier(Answer(*answer));
        }
        let schema = Schema::builder().attribute("name", attribute).build();
        let value = Value::object([("name", Value::string("web"))]);

        let outcome = run_modifiers(&value, &value, value.clone(), &schema, None, &CancellationToken::new());

        let expected = if answers.iter().any(|a| *a) {
            vec![AttributePath::root().at_name("name")]
        } else {
            Vec::new()
        };
        prop_assert_eq!(outcome.requires_replace, expected);
    }

    #[test]
    fn prop_normalization_is_deterministic(
        picks in prop::collection::vec(0..7usize, 0..20),
        rotation in 0..20usize,
    ) {
        let pool = path_pool();
        let paths: Vec<_> = picks.iter().map(|i| pool[*i].clone()).collect();
        let mut rotated = paths.clone();
        if !rotated.is_empty() {
            let len = rotated.len();
            rotated.rotate_left(rotation % len);
        }
        let mut reversed = paths.clone();
        reversed.reverse();

        let normalized = normalize_requires_replace(paths);
        prop_assert_eq!(&normalized, &normalize_requires_replace(rotated));
        prop_assert_eq!(&normalized, &normalize_requires_replace(reversed));

        // Sorted, unique, parents before descendants.
        for (i, a) in normalized.iter().enumerate() {
            for b in &normalized[i + 1..] {
                prop_assert!(a < b);
                prop_assert!(!b.is_ancestor_of(a));
            }
        }
    }
}
