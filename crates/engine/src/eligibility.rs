//! Eligibility checking: may this action run against this target/field?
//!
//! Pure read-only checks against the target's blueprint, the catalog, and
//! resolved asset metadata. Nothing here writes state; a failed check
//! means no job record is ever created.

use quill_core::action::ActionDescriptor;
use quill_core::catalog::Catalog;
use quill_core::error::CoreError;
use quill_core::mime;
use quill_core::target::{AssetInfo, Target};

/// Assert that `action_handle` may execute against `(target, field_handle)`.
///
/// Steps, in order:
/// 1. The field's configured action list must contain the handle.
/// 2. The handle must resolve in the catalog.
/// 3. If the action restricts formats, the input asset (the target itself
///    when asset-like, else the explicitly supplied `asset`) must match
///    one accepted pattern. With no resolvable asset the format check is
///    skipped — text-only actions have no asset.
///
/// Returns the resolved descriptor so the dispatcher does not look it up
/// twice.
pub fn assert_executable<'c>(
    catalog: &'c Catalog,
    action_handle: &str,
    target: &Target,
    field_handle: &str,
    explicit_asset: Option<&AssetInfo>,
) -> Result<&'c ActionDescriptor, CoreError> {
    let configured = target
        .blueprint()
        .field_config(field_handle)
        .map(|config| config.actions.iter().any(|a| a == action_handle))
        .unwrap_or(false);
    if !configured {
        return Err(CoreError::Ineligible(format!(
            "action '{action_handle}' is not configured for field '{field_handle}'"
        )));
    }

    let descriptor = catalog
        .lookup(action_handle)
        .ok_or_else(|| CoreError::Ineligible(format!("unknown action '{action_handle}'")))?;

    if descriptor.restricts_formats() {
        let asset = target.own_asset().or(explicit_asset);
        if let Some(asset) = asset {
            if !mime::matches_any(&asset.mime_type, &descriptor.accepted_formats) {
                return Err(CoreError::UnsupportedFormat {
                    actual: asset.mime_type.clone(),
                    accepted: descriptor.accepted_formats.clone(),
                });
            }
        }
    }

    Ok(descriptor)
}

/// Boolean form of [`assert_executable`].
pub fn can_execute(
    catalog: &Catalog,
    action_handle: &str,
    target: &Target,
    field_handle: &str,
    explicit_asset: Option<&AssetInfo>,
) -> bool {
    assert_executable(catalog, action_handle, target, field_handle, explicit_asset).is_ok()
}
