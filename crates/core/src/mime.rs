//! MIME pattern matching for action format constraints.
//!
//! Patterns are either exact types (`image/png`) or a wildcard over the
//! subtype (`image/*`). Matching is case-insensitive per RFC 2045; any
//! `;charset=...` style parameters on the candidate type are ignored.

/// Check whether a concrete MIME type matches a single accepted pattern.
///
/// - Exact match: `image/png` matches `image/png`.
/// - Wildcard: `image/*` matches any `image/...` subtype.
pub fn matches_pattern(mime: &str, pattern: &str) -> bool {
    let mime = normalize(mime);
    let pattern = pattern.trim().to_ascii_lowercase();

    if let Some(prefix) = pattern.strip_suffix("/*") {
        mime.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    } else {
        mime == pattern
    }
}

/// Check a MIME type against a list of accepted patterns.
///
/// An empty list means the action is unrestricted and anything matches.
pub fn matches_any(mime: &str, patterns: &[String]) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| matches_pattern(mime, p))
}

/// Validate that a pattern is well-formed: `type/subtype` or `type/*`,
/// with a non-empty type and subtype.
pub fn is_valid_pattern(pattern: &str) -> bool {
    match pattern.split_once('/') {
        Some((ty, sub)) => {
            !ty.is_empty() && !sub.is_empty() && !ty.contains('*') && !sub.contains(' ')
        }
        None => false,
    }
}

/// Lowercase and strip any parameters (`; charset=utf-8`).
fn normalize(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(matches_pattern("image/png", "image/png"));
        assert!(!matches_pattern("image/jpeg", "image/png"));
    }

    #[test]
    fn wildcard_matches_any_subtype() {
        assert!(matches_pattern("image/png", "image/*"));
        assert!(matches_pattern("image/svg+xml", "image/*"));
        assert!(!matches_pattern("application/pdf", "image/*"));
    }

    #[test]
    fn wildcard_does_not_match_type_prefix() {
        // "imagery/png" must not match "image/*".
        assert!(!matches_pattern("imagery/png", "image/*"));
    }

    #[test]
    fn matching_is_case_insensitive_and_ignores_parameters() {
        assert!(matches_pattern("Image/PNG", "image/png"));
        assert!(matches_pattern("text/plain; charset=utf-8", "text/plain"));
    }

    #[test]
    fn empty_pattern_list_is_unrestricted() {
        assert!(matches_any("anything/at-all", &[]));
    }

    #[test]
    fn any_requires_one_match() {
        let patterns = vec!["image/*".to_string(), "application/pdf".to_string()];
        assert!(matches_any("application/pdf", &patterns));
        assert!(matches_any("image/webp", &patterns));
        assert!(!matches_any("text/plain", &patterns));
    }

    #[test]
    fn pattern_validation() {
        assert!(is_valid_pattern("image/png"));
        assert!(is_valid_pattern("image/*"));
        assert!(!is_valid_pattern("image"));
        assert!(!is_valid_pattern("/png"));
        assert!(!is_valid_pattern("image/"));
        assert!(!is_valid_pattern("*/png"));
    }
}
