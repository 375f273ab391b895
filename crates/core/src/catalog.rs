//! Compiled-in action catalog.
//!
//! Built once at startup from a fixed slice of [`ActionDefinition`]s; no
//! filesystem scanning or runtime discovery. A malformed definition is
//! skipped and recorded, never fatal — the catalog keeps serving every
//! other action. Callers log [`Catalog::skipped`] at assembly time.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::action::{
    ActionDefinition, ActionDescriptor, ContextRequirement, FieldCategory,
};
use crate::mime;

/// A definition that failed validation during catalog construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDefinition {
    pub name: String,
    pub reason: String,
}

/// Read-only registry of all registered actions, keyed by handle.
///
/// Iteration order is registration order (`IndexMap`), so
/// [`available_handles`](Catalog::available_handles) is deterministic.
#[derive(Debug, Default)]
pub struct Catalog {
    actions: IndexMap<String, ActionDescriptor>,
    skipped: Vec<SkippedDefinition>,
}

impl Catalog {
    /// Build a catalog from a fixed set of definitions.
    ///
    /// Validation per definition:
    /// - non-empty name that derives a non-empty handle
    /// - every accepted format is a well-formed MIME pattern
    /// - no duplicate handles
    /// - parameter defaults must parse as JSON
    ///
    /// Failures skip the one definition and record the reason.
    pub fn build(definitions: &[ActionDefinition]) -> Self {
        let mut catalog = Catalog::default();

        for def in definitions {
            match catalog.descriptor_from(def) {
                Ok(descriptor) => {
                    catalog.actions.insert(descriptor.handle.clone(), descriptor);
                }
                Err(reason) => catalog.skipped.push(SkippedDefinition {
                    name: def.name.to_string(),
                    reason,
                }),
            }
        }

        catalog
    }

    fn descriptor_from(&self, def: &ActionDefinition) -> Result<ActionDescriptor, String> {
        let handle = crate::action::derive_handle(def.name);
        if handle.is_empty() {
            return Err("definition name derives an empty handle".to_string());
        }
        if self.actions.contains_key(&handle) {
            return Err(format!("duplicate handle '{handle}'"));
        }

        for pattern in def.accepted_formats {
            if !mime::is_valid_pattern(pattern) {
                return Err(format!("malformed MIME pattern '{pattern}'"));
            }
        }

        let mut parameter_defaults = BTreeMap::new();
        for (key, raw) in def.parameter_defaults {
            let value: serde_json::Value = serde_json::from_str(raw)
                .map_err(|e| format!("parameter default '{key}' is not valid JSON: {e}"))?;
            parameter_defaults.insert((*key).to_string(), value);
        }

        let context_requirements = if def.context_requirements.is_empty() {
            None
        } else {
            Some(
                def.context_requirements
                    .iter()
                    .map(|(variable, source)| ContextRequirement {
                        variable: (*variable).to_string(),
                        source: (*source).into(),
                    })
                    .collect(),
            )
        };

        Ok(ActionDescriptor {
            handle,
            label: def.label.to_string(),
            capability: def.capability,
            accepted_formats: def.accepted_formats.iter().map(|f| f.to_string()).collect(),
            field_categories: def.field_categories.to_vec(),
            parameter_defaults,
            context_requirements,
        })
    }

    /// Look up a descriptor by handle.
    pub fn lookup(&self, handle: &str) -> Option<&ActionDescriptor> {
        self.actions.get(handle)
    }

    /// Whether a handle is registered.
    pub fn exists(&self, handle: &str) -> bool {
        self.actions.contains_key(handle)
    }

    /// Handles offered for a given field category, in registration order.
    pub fn available_handles(&self, category: FieldCategory) -> Vec<&str> {
        self.actions
            .values()
            .filter(|d| d.field_categories.contains(&category))
            .map(|d| d.handle.as_str())
            .collect()
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.values()
    }

    /// Definitions that failed validation during construction.
    pub fn skipped(&self) -> &[SkippedDefinition] {
        &self.skipped
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
