//! Copies prior state into an unknown plan value.

use super::{ModifyAttributePlanRequest, ModifyAttributePlanResponse, PlanModifier};

/// Keeps a computed attribute stable across updates by planning its prior
/// state value instead of unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        String::from("Once set, the value of this attribute in state will not change.")
    }

    fn modify(&self, request: &ModifyAttributePlanRequest<'_>) -> ModifyAttributePlanResponse {
        let mut response = ModifyAttributePlanResponse::default();

        if request.state_value.is_null()
            || !request.plan_value.is_unknown()
            || request.config_value.is_unknown()
        {
            return response;
        }

        response.plan_value = Some(request.state_value.clone());
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::AttributePath;
    use crate::schema::Attribute;
    use crate::value::Value;

    fn run(config: &Value, state: &Value, plan: &Value) -> ModifyAttributePlanResponse {
        let path = AttributePath::root().at_name("id");
        let attribute = Attribute::string().computed();
        let request = ModifyAttributePlanRequest {
            path: &path,
            attribute: &attribute,
            config_value: config,
            state_value: state,
            plan_value: plan,
            config: &Value::Null,
            state: &Value::Null,
            plan: &Value::Null,
        };
        UseStateForUnknown.modify(&request)
    }

    #[test]
    fn test_copies_state() {
        let response = run(&Value::Null, &Value::string("i-123"), &Value::Unknown);
        assert_eq!(response.plan_value, Some(Value::string("i-123")));
        assert!(!response.requires_replace);
    }

    #[test]
    fn test_no_state() {
        assert_eq!(run(&Value::Null, &Value::Null, &Value::Unknown).plan_value, None);
    }

    #[test]
    fn test_known_plan_untouched() {
        let response = run(&Value::Null, &Value::string("old"), &Value::string("new"));
        assert_eq!(response.plan_value, None);
    }

    #[test]
    fn test_unknown_config() {
        let response = run(&Value::Unknown, &Value::string("old"), &Value::Unknown);
        assert_eq!(response.plan_value, None);
    }
}
