//! Built-in action registrations.
//!
//! One registration function per action; [`definitions`] is the fixed
//! table the catalog is built from at process start. Handles are derived
//! from the definition names (`ProposeTitle` -> `propose-title`).

use crate::action::{
    ActionDefinition, CapabilityType, ContextSourceSpec, FieldCategory,
};

/// The fixed set of built-in action definitions, in listing order.
pub fn definitions() -> Vec<ActionDefinition> {
    vec![
        propose_title(),
        summarize_body(),
        extract_tags(),
        alt_text(),
        transcribe_audio(),
    ]
}

/// Propose a title from the entry's body text.
fn propose_title() -> ActionDefinition {
    ActionDefinition {
        name: "ProposeTitle",
        label: "Propose title",
        capability: CapabilityType::Text,
        accepted_formats: &[],
        field_categories: &[FieldCategory::Text],
        parameter_defaults: &[("max_words", "12"), ("tone", "\"neutral\"")],
        context_requirements: &[("body", ContextSourceSpec::Field("body"))],
    }
}

/// Summarize the entry's body into a short abstract.
fn summarize_body() -> ActionDefinition {
    ActionDefinition {
        name: "SummarizeBody",
        label: "Summarize",
        capability: CapabilityType::Text,
        accepted_formats: &[],
        field_categories: &[FieldCategory::Text, FieldCategory::RichText],
        parameter_defaults: &[("max_sentences", "3")],
        context_requirements: &[("body", ContextSourceSpec::Field("body"))],
    }
}

/// Extract taxonomy terms, biased towards terms that already exist.
fn extract_tags() -> ActionDefinition {
    ActionDefinition {
        name: "ExtractTags",
        label: "Extract tags",
        capability: CapabilityType::Text,
        accepted_formats: &[],
        field_categories: &[FieldCategory::Taxonomy],
        parameter_defaults: &[("max_tags", "8")],
        context_requirements: &[
            ("body", ContextSourceSpec::Field("body")),
            ("existing_terms", ContextSourceSpec::Provided("existing_terms")),
        ],
    }
}

/// Generate alt text for an image asset.
fn alt_text() -> ActionDefinition {
    ActionDefinition {
        name: "AltText",
        label: "Generate alt text",
        capability: CapabilityType::Vision,
        accepted_formats: &["image/*"],
        field_categories: &[FieldCategory::Text, FieldCategory::Asset],
        parameter_defaults: &[("max_words", "25")],
        context_requirements: &[],
    }
}

/// Transcribe an audio asset to text.
fn transcribe_audio() -> ActionDefinition {
    ActionDefinition {
        name: "TranscribeAudio",
        label: "Transcribe audio",
        capability: CapabilityType::Audio,
        accepted_formats: &["audio/*", "video/mp4"],
        field_categories: &[FieldCategory::RichText, FieldCategory::Asset],
        parameter_defaults: &[],
        context_requirements: &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn all_builtins_register_cleanly() {
        let catalog = Catalog::build(&definitions());
        assert_eq!(catalog.skipped().len(), 0);
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn expected_handles_are_present() {
        let catalog = Catalog::build(&definitions());
        for handle in [
            "propose-title",
            "summarize-body",
            "extract-tags",
            "alt-text",
            "transcribe-audio",
        ] {
            assert!(catalog.exists(handle), "missing builtin: {handle}");
        }
    }

    #[test]
    fn alt_text_restricts_to_images() {
        let catalog = Catalog::build(&definitions());
        let alt = catalog.lookup("alt-text").unwrap();
        assert_eq!(alt.capability, CapabilityType::Vision);
        assert_eq!(alt.accepted_formats, vec!["image/*"]);
    }

    #[test]
    fn extract_tags_requires_existing_terms() {
        let catalog = Catalog::build(&definitions());
        let tags = catalog.lookup("extract-tags").unwrap();
        let reqs = tags.context_requirements.as_ref().unwrap();
        assert!(reqs.iter().any(|r| r.variable == "existing_terms"));
    }
}
