//! Prompt rendering seam.
//!
//! The engine treats rendering as an opaque function from (action handle,
//! variables) to prompt strings. [`BuiltinTemplates`] is the bundled
//! implementation with one hard-wired template per built-in action;
//! deployments with their own template store implement [`PromptRenderer`].

use std::collections::BTreeMap;

use quill_core::error::CoreError;
use serde_json::json;

/// Rendered prompts handed to the generation backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
    /// Optional JSON shape the backend should coerce its output into.
    pub schema: Option<serde_json::Value>,
}

/// Renders prompts for an action from the resolved variable map.
pub trait PromptRenderer: Send + Sync {
    fn render(
        &self,
        action_handle: &str,
        variables: &BTreeMap<String, serde_json::Value>,
    ) -> Result<RenderedPrompt, CoreError>;
}

/// Minimal built-in templates for the bundled actions.
#[derive(Debug, Default)]
pub struct BuiltinTemplates;

impl PromptRenderer for BuiltinTemplates {
    fn render(
        &self,
        action_handle: &str,
        variables: &BTreeMap<String, serde_json::Value>,
    ) -> Result<RenderedPrompt, CoreError> {
        let (system, user, schema) = match action_handle {
            "propose-title" => (
                "You are an editor proposing concise, accurate titles.",
                format!(
                    "Propose a title of at most {} words, tone {}, for this text:\n\n{}",
                    text(variables, "max_words"),
                    text(variables, "tone"),
                    text(variables, "body"),
                ),
                Some(json!({"title": "string"})),
            ),
            "summarize-body" => (
                "You summarize CMS content faithfully and briefly.",
                format!(
                    "Summarize the following in at most {} sentences:\n\n{}",
                    text(variables, "max_sentences"),
                    text(variables, "body"),
                ),
                None,
            ),
            "extract-tags" => (
                "You extract taxonomy terms, preferring terms that already exist.",
                format!(
                    "Extract up to {} tags for this text. Existing terms: {}.\n\n{}",
                    text(variables, "max_tags"),
                    text(variables, "existing_terms"),
                    text(variables, "body"),
                ),
                Some(json!({"tags": ["string"]})),
            ),
            "alt-text" => (
                "You write short, descriptive alt text for images.",
                format!(
                    "Describe the attached image in at most {} words.",
                    text(variables, "max_words"),
                ),
                Some(json!({"alt": "string"})),
            ),
            "transcribe-audio" => (
                "You transcribe audio verbatim.",
                "Transcribe the attached audio.".to_string(),
                None,
            ),
            other => {
                return Err(CoreError::Internal(format!(
                    "no template registered for action '{other}'"
                )))
            }
        };

        Ok(RenderedPrompt {
            system: system.to_string(),
            user,
            schema,
        })
    }
}

/// Variable as display text; JSON strings render unquoted, everything
/// else via its JSON form.
fn text(variables: &BTreeMap<String, serde_json::Value>, key: &str) -> String {
    match variables.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
