//! Resource definitions.

use std::fmt;
use std::sync::Arc;

use crate::data::ResourceData;
use crate::diag::Diagnostics;
use crate::path::AttributePath;
use crate::schema::Schema;

/// Input of a resource-level plan hook.
#[derive(Debug)]
pub struct ModifyResourcePlanRequest<'s> {
    /// The resource configuration.
    pub config: ResourceData<'s>,
    /// The prior resource state.
    pub state: ResourceData<'s>,
}

/// Output of a resource-level plan hook.
///
/// The plan arrives with every attribute modifier already applied. The hook
/// may rewrite it through [`ResourceData::set_at_path`].
#[derive(Debug)]
pub struct ModifyResourcePlanResponse<'s> {
    /// The plan being refined.
    pub plan: ResourceData<'s>,
    /// Additional paths that force replacement.
    pub requires_replace: Vec<AttributePath>,
    /// Diagnostics raised by the hook.
    pub diagnostics: Diagnostics,
}

/// A resource-level plan hook, run after all attribute plan modifiers.
pub trait ResourceWithModifyPlan: Send + Sync {
    /// Refines the plan.
    fn modify_plan(
        &self,
        request: &ModifyResourcePlanRequest<'_>,
        response: &mut ModifyResourcePlanResponse<'_>,
    );
}

/// A managed resource type: its schema and optional plan hook.
#[derive(Clone)]
pub struct Resource {
    type_name: String,
    schema: Schema,
    modify_plan: Option<Arc<dyn ResourceWithModifyPlan>>,
}

impl Resource {
    /// Creates a resource type without a plan hook.
    #[must_use]
    pub fn new(type_name: impl Into<String>, schema: Schema) -> Self {
        Self {
            type_name: type_name.into(),
            schema,
            modify_plan: None,
        }
    }

    /// Installs a resource-level plan hook.
    #[must_use]
    pub fn with_modify_plan(mut self, hook: impl ResourceWithModifyPlan + 'static) -> Self {
        self.modify_plan = Some(Arc::new(hook));
        self
    }

    /// Returns the resource type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the plan hook, if any.
    #[must_use]
    pub fn modify_plan_hook(&self) -> Option<&dyn ResourceWithModifyPlan> {
        self.modify_plan.as_deref()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("type_name", &self.type_name)
            .field("schema", &self.schema)
            .field("modify_plan", &self.modify_plan.is_some())
            .finish()
    }
}
