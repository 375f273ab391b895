//! Targets: the content entities actions operate on.
//!
//! A target is either a content entry or an asset, as a tagged union with
//! one narrow capability surface (`id`, `blueprint`, `field`). The CMS is
//! the caller and owns resolution; it submits a snapshot of the target,
//! its blueprint field configuration, and its field values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::FieldCategory;

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// Per-field configuration from the target's blueprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    pub category: Option<FieldCategory>,
    /// Action handles enabled for this field. An action absent from this
    /// list is ineligible on the field regardless of catalog validity.
    #[serde(default)]
    pub actions: Vec<String>,
}

/// The schema of a target: field handle -> field configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
}

impl Blueprint {
    pub fn field_config(&self, handle: &str) -> Option<&FieldConfig> {
        self.fields.get(handle)
    }
}

// ---------------------------------------------------------------------------
// Asset metadata
// ---------------------------------------------------------------------------

/// Resolved metadata for an asset, either the target itself or an
/// explicitly referenced input asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub mime_type: String,
    pub url: String,
    #[serde(default)]
    pub extension: Option<String>,
}

// ---------------------------------------------------------------------------
// Target variants
// ---------------------------------------------------------------------------

/// A content entry with its blueprint and field values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryTarget {
    pub id: String,
    pub blueprint: Blueprint,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// An asset-like entity: carries the same schema surface as an entry plus
/// its own media metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetTarget {
    pub id: String,
    pub blueprint: Blueprint,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
    pub asset: AssetInfo,
}

/// The content entity an action operates on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Entry(EntryTarget),
    Asset(AssetTarget),
}

impl Target {
    pub fn id(&self) -> &str {
        match self {
            Self::Entry(e) => &e.id,
            Self::Asset(a) => &a.id,
        }
    }

    /// `"entry"` or `"asset"`, as stored in the job context.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Entry(_) => "entry",
            Self::Asset(_) => "asset",
        }
    }

    pub fn blueprint(&self) -> &Blueprint {
        match self {
            Self::Entry(e) => &e.blueprint,
            Self::Asset(a) => &a.blueprint,
        }
    }

    /// Read a field value from the snapshot.
    pub fn field(&self, handle: &str) -> Option<&serde_json::Value> {
        match self {
            Self::Entry(e) => e.fields.get(handle),
            Self::Asset(a) => a.fields.get(handle),
        }
    }

    /// The target's own asset metadata, when it is asset-like.
    pub fn own_asset(&self) -> Option<&AssetInfo> {
        match self {
            Self::Entry(_) => None,
            Self::Asset(a) => Some(&a.asset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blueprint() -> Blueprint {
        let mut fields = BTreeMap::new();
        fields.insert(
            "title".to_string(),
            FieldConfig {
                category: Some(FieldCategory::Text),
                actions: vec!["propose-title".to_string()],
            },
        );
        Blueprint { fields }
    }

    #[test]
    fn entry_target_accessors() {
        let mut values = BTreeMap::new();
        values.insert("body".to_string(), json!("Some long body text."));
        let target = Target::Entry(EntryTarget {
            id: "e1".into(),
            blueprint: blueprint(),
            fields: values,
        });

        assert_eq!(target.id(), "e1");
        assert_eq!(target.kind(), "entry");
        assert!(target.own_asset().is_none());
        assert_eq!(target.field("body"), Some(&json!("Some long body text.")));
        assert!(target.blueprint().field_config("title").is_some());
    }

    #[test]
    fn asset_target_exposes_media_metadata() {
        let target = Target::Asset(AssetTarget {
            id: "a1".into(),
            blueprint: Blueprint::default(),
            fields: BTreeMap::new(),
            asset: AssetInfo {
                mime_type: "image/png".into(),
                url: "https://cdn.example.test/a1.png".into(),
                extension: Some("png".into()),
            },
        });

        assert_eq!(target.kind(), "asset");
        assert_eq!(target.own_asset().unwrap().mime_type, "image/png");
    }

    #[test]
    fn target_deserializes_from_tagged_json() {
        let value = json!({
            "kind": "entry",
            "id": "e9",
            "blueprint": { "fields": {} },
            "fields": { "body": "text" }
        });
        let target: Target = serde_json::from_value(value).unwrap();
        assert_eq!(target.kind(), "entry");
        assert_eq!(target.id(), "e9");
    }
}
