use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::output::StackState;
use crate::plan::Plan;
use crate::provider::CloudProvider;
use crate::resources::ApplyContext;

/// One provider per binding name of the plan.
#[derive(Default)]
pub struct Providers {
    by_binding: HashMap<String, Box<dyn CloudProvider>>,
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, binding: &str, provider: impl CloudProvider + 'static) {
        self.by_binding.insert(binding.to_string(), Box::new(provider));
    }

    pub fn get(&self, binding: &str) -> Result<&dyn CloudProvider> {
        self.by_binding
            .get(binding)
            .map(|p| &**p)
            .ok_or_else(|| Error::MissingProvider(binding.to_string()))
    }
}

/// Provisions every resource of the plan, one at a time, dependencies first.
/// Stops at the first failure; whatever was created before it stays created.
pub async fn apply(plan: &Plan, providers: &Providers) -> Result<StackState> {
    let order = plan.order()?;
    for planned in &order {
        providers.get(&planned.binding)?;
    }

    let mut state = StackState::new();
    let total = order.len();
    for (i, planned) in order.into_iter().enumerate() {
        let provider = providers.get(&planned.binding)?;
        tracing::info!(
            stack = plan.stack(),
            resource = %planned.logical_id,
            kind = planned.resource.type_string(),
            region = provider.region(),
            "provisioning {}/{}", i + 1, total
        );
        let ctx = ApplyContext {
            stack: plan.stack(),
            logical_id: &planned.logical_id,
            state: &state,
        };
        let attributes = planned
            .resource
            .provision(&ctx, provider)
            .await
            .map_err(|e| Error::Provision {
                logical_id: planned.logical_id.clone(),
                source: Box::new(e),
            })?;
        tracing::debug!(resource = %planned.logical_id, ?attributes, "provisioned");
        state.insert(&planned.logical_id, attributes);
    }
    Ok(state)
}
