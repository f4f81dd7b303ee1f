//! Request DTOs for the operator API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum number of keys accepted by a single invalidation request
pub const MAX_INVALIDATE_KEYS: usize = 10_000;

/// Request body for POST /invalidate
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateKeysRequest {
    /// Keys to remove from both tiers
    pub keys: Vec<String>,
}

impl InvalidateKeysRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.keys.is_empty() {
            return Some("At least one key is required".to_string());
        }
        if self.keys.len() > MAX_INVALIDATE_KEYS {
            return Some(format!(
                "At most {} keys can be invalidated per request",
                MAX_INVALIDATE_KEYS
            ));
        }
        if self.keys.iter().any(|key| key.is_empty()) {
            return Some("Keys cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /invalidate/pattern
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidatePatternRequest {
    /// Glob pattern, `*` matches any substring
    pub pattern: String,
}

impl InvalidatePatternRequest {
    pub fn validate(&self) -> Option<String> {
        if self.pattern.trim().is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_keys_deserialize() {
        let json = r#"{"keys": ["fpl:players:1", "fpl:players:2"]}"#;
        let req: InvalidateKeysRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.keys.len(), 2);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_key_list() {
        let req = InvalidateKeysRequest { keys: vec![] };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_blank_key() {
        let req = InvalidateKeysRequest {
            keys: vec!["ok".to_string(), String::new()],
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_pattern() {
        let ok: InvalidatePatternRequest =
            serde_json::from_str(r#"{"pattern": "fpl:*"}"#).unwrap();
        assert!(ok.validate().is_none());

        let blank = InvalidatePatternRequest {
            pattern: "  ".to_string(),
        };
        assert!(blank.validate().is_some());
    }
}
