//! Identifier validation shared by stages, actions, artifacts and units.

use crate::errors::{ComposerError, ComposerResult};
use regex::Regex;
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.@_-]{1,100}$").expect("name pattern is a valid regex")
});

/// Returns true if `name` is an acceptable identifier.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Validates an identifier, naming its `kind` in the error.
pub fn validate_name(kind: &'static str, name: &str) -> ComposerResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ComposerError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_pipeline_identifiers() {
        for name in ["Source", "BuildCdkStage", "build-1", "v1.2", "team@stage", "a_b"] {
            assert!(is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("slash/name"));
        assert!(!is_valid_name(&"x".repeat(101)));
    }

    #[test]
    fn test_validate_name_error() {
        let err = validate_name("stage", "bad name").unwrap_err();
        assert_eq!(err.code(), "COMPOSE-009-NAME");
        assert!(err.to_string().contains("stage"));
    }
}
