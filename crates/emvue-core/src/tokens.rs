//! Credential snapshot type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A snapshot of the credentials issued by the identity provider.
///
/// All fields are optional: a freshly constructed session holds an empty
/// set until the first successful exchange. Every refresh produces a whole
/// new `TokenSet`; holders replace their copy atomically rather than
/// mutating fields piecemeal.
///
/// # Security
///
/// Token values are never exposed in Debug output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Short-lived bearer token authorizing API calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Short-lived token carrying identity claims, sent as the `authtoken`
    /// request header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Longer-lived token used to obtain a new access/identity pair without
    /// re-supplying a password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token type reported by the provider, usually `Bearer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenSet {
    /// Returns true if no credential material is present at all.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.id_token.is_none()
            && self.refresh_token.is_none()
    }

    /// Returns true if the full access/identity/refresh triple is present.
    ///
    /// A stored set is only usable for restoring a session when complete.
    pub fn is_complete(&self) -> bool {
        self.access_token.is_some()
            && self.id_token.is_some()
            && self.refresh_token.is_some()
    }
}

// Hide token values in Debug output; show only which fields are present.
impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mark(field: &Option<String>) -> &'static str {
            if field.is_some() { "[REDACTED]" } else { "None" }
        }

        f.debug_struct("TokenSet")
            .field("access_token", &mark(&self.access_token))
            .field("id_token", &mark(&self.id_token))
            .field("refresh_token", &mark(&self.refresh_token))
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set() -> TokenSet {
        TokenSet {
            access_token: Some("access-secret".into()),
            id_token: Some("id-secret".into()),
            refresh_token: Some("refresh-secret".into()),
            token_type: Some("Bearer".into()),
        }
    }

    #[test]
    fn token_set_hides_values_in_debug() {
        let debug = format!("{:?}", full_set());
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn empty_and_complete() {
        assert!(TokenSet::default().is_empty());
        assert!(!TokenSet::default().is_complete());
        assert!(full_set().is_complete());

        let partial = TokenSet {
            id_token: Some("id".into()),
            ..TokenSet::default()
        };
        assert!(!partial.is_empty());
        assert!(!partial.is_complete());
    }

    #[test]
    fn serde_uses_snake_case_keys() {
        let json = serde_json::to_value(full_set()).unwrap();
        assert_eq!(json["access_token"], "access-secret");
        assert_eq!(json["id_token"], "id-secret");
        assert_eq!(json["refresh_token"], "refresh-secret");

        let none = serde_json::to_value(TokenSet::default()).unwrap();
        assert_eq!(none, serde_json::json!({}));
    }
}
