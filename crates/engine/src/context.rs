//! Context resolution for actions that declare required variables.
//!
//! Runs at dispatch time, before any job record exists: a requirement
//! that cannot be satisfied is an `InvalidContext` error to the caller,
//! never a runtime failure inside the worker.

use std::collections::BTreeMap;

use quill_core::action::{ActionDescriptor, ContextSource};
use quill_core::error::CoreError;
use quill_core::target::Target;

/// Build the variable map passed to the worker.
///
/// Precedence, lowest to highest:
/// 1. the action's `parameter_defaults`
/// 2. caller-supplied variables
/// 3. declared context requirements resolved from the target / caller
///
/// A requirement whose source resolves to nothing (missing field, missing
/// provided key, or a null/empty value) fails the whole dispatch.
pub fn resolve_variables(
    descriptor: &ActionDescriptor,
    target: &Target,
    provided: &BTreeMap<String, serde_json::Value>,
) -> Result<BTreeMap<String, serde_json::Value>, CoreError> {
    let mut variables = descriptor.parameter_defaults.clone();
    for (key, value) in provided {
        variables.insert(key.clone(), value.clone());
    }

    let Some(requirements) = &descriptor.context_requirements else {
        return Ok(variables);
    };

    for requirement in requirements {
        let resolved = match &requirement.source {
            ContextSource::Field(handle) => target.field(handle).cloned().ok_or_else(|| {
                CoreError::InvalidContext(format!(
                    "action '{}' requires variable '{}' from field '{}', \
                     which is missing on {} '{}'",
                    descriptor.handle,
                    requirement.variable,
                    handle,
                    target.kind(),
                    target.id(),
                ))
            })?,
            ContextSource::Provided(key) => provided.get(key).cloned().ok_or_else(|| {
                CoreError::InvalidContext(format!(
                    "action '{}' requires caller-provided variable '{}'",
                    descriptor.handle, key,
                ))
            })?,
        };

        if is_empty(&resolved) {
            return Err(CoreError::InvalidContext(format!(
                "required variable '{}' for action '{}' resolved to an empty value",
                requirement.variable, descriptor.handle,
            )));
        }

        variables.insert(requirement.variable.clone(), resolved);
    }

    Ok(variables)
}

fn is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        _ => false,
    }
}
