//! Action definitions and descriptors.
//!
//! An [`ActionDefinition`] is the compile-time registration input for one
//! AI action; the catalog turns it into an immutable [`ActionDescriptor`]
//! keyed by a kebab-cased handle derived from the definition name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Capability types
// ---------------------------------------------------------------------------

/// The category of backend operation an action requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityType {
    /// Plain text completion.
    Text,
    /// Vision call with an input asset (image understanding).
    Vision,
    /// Audio transcription.
    Audio,
}

impl CapabilityType {
    /// Stable string form used in logs and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Vision => "vision",
            Self::Audio => "audio",
        }
    }
}

// ---------------------------------------------------------------------------
// Field categories
// ---------------------------------------------------------------------------

/// The CMS field kinds an action can be offered on.
///
/// Used by the catalog's `available_handles` to answer "which actions make
/// sense for this field type" when the CMS builds its field UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    /// Single-line text fields (titles, slugs, alt text).
    Text,
    /// Rich / long-form text fields (body, summary).
    RichText,
    /// Taxonomy term selections (tags, categories).
    Taxonomy,
    /// Asset reference fields.
    Asset,
}

// ---------------------------------------------------------------------------
// Context requirements
// ---------------------------------------------------------------------------

/// Where a required context variable is resolved from at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "key")]
pub enum ContextSource {
    /// The text value of a sibling field on the target.
    Field(String),
    /// A variable the caller must supply in the dispatch options
    /// (e.g. the list of existing taxonomy terms the CMS already knows).
    Provided(String),
}

/// One named variable an action requires before it can be dispatched.
///
/// Resolution failures surface as `InvalidContext` at dispatch time,
/// never at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRequirement {
    /// Variable name the prompt template expects.
    pub variable: String,
    pub source: ContextSource,
}

// ---------------------------------------------------------------------------
// Definition and descriptor
// ---------------------------------------------------------------------------

/// Compile-time registration input for one action.
///
/// `name` is the PascalCase definition name; the catalog derives the
/// public handle from it (`ProposeTitle` -> `propose-title`).
#[derive(Debug, Clone)]
pub struct ActionDefinition {
    pub name: &'static str,
    pub label: &'static str,
    pub capability: CapabilityType,
    /// Accepted input MIME patterns. Empty means unrestricted.
    pub accepted_formats: &'static [&'static str],
    /// Field kinds this action may be offered on.
    pub field_categories: &'static [FieldCategory],
    /// Sparse parameter defaults merged under caller variables.
    pub parameter_defaults: &'static [(&'static str, &'static str)],
    /// Variables that must be resolvable before dispatch.
    pub context_requirements: &'static [(&'static str, ContextSourceSpec)],
}

/// Static form of [`ContextSource`] usable in `const` definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSourceSpec {
    Field(&'static str),
    Provided(&'static str),
}

impl From<ContextSourceSpec> for ContextSource {
    fn from(spec: ContextSourceSpec) -> Self {
        match spec {
            ContextSourceSpec::Field(h) => ContextSource::Field(h.to_string()),
            ContextSourceSpec::Provided(k) => ContextSource::Provided(k.to_string()),
        }
    }
}

/// Immutable registered action, one per handle, owned by the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDescriptor {
    /// Unique kebab-case key, derived from the definition name.
    pub handle: String,
    /// Human-readable label for UI listings.
    pub label: String,
    pub capability: CapabilityType,
    /// Accepted input MIME patterns. Empty means unrestricted.
    pub accepted_formats: Vec<String>,
    pub field_categories: Vec<FieldCategory>,
    pub parameter_defaults: BTreeMap<String, serde_json::Value>,
    /// Present only for actions that declare context requirements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_requirements: Option<Vec<ContextRequirement>>,
}

impl ActionDescriptor {
    /// Whether the action restricts input formats at all.
    pub fn restricts_formats(&self) -> bool {
        !self.accepted_formats.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Handle derivation
// ---------------------------------------------------------------------------

/// Derive the public handle from a PascalCase definition name.
///
/// `ProposeTitle` -> `propose-title`, `AltText` -> `alt-text`.
/// Existing separators (`_`, `-`, spaces) are normalized to hyphens.
pub fn derive_handle(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !out.ends_with('-') {
                out.push('-');
            }
            prev_lower = false;
        } else if ch.is_ascii_uppercase() {
            if prev_lower && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out.trim_matches('-').to_string()
}
