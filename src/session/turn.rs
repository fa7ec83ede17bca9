//! Chat turn and session identifier types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque session key. Never parsed or validated beyond being a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One immutable message in a session's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_deserialize() {
        let json = r#"{"role": "assistant", "content": "hi", "metadata": {"model": "m1"}}"#;
        let turn: Turn = serde_json::from_str(json).unwrap();

        assert_eq!(turn, Turn::assistant("hi").with_metadata("model", "m1"));
    }

    #[test]
    fn test_turn_metadata_defaults_to_empty() {
        let turn: Turn = serde_json::from_str(r#"{"role": "user", "content": "q"}"#).unwrap();
        assert!(turn.metadata.is_empty());
    }

    #[test]
    fn test_turn_rejects_untyped_shapes() {
        assert!(serde_json::from_str::<Turn>(r#"{"role": "bot", "content": "x"}"#).is_err());
        assert!(serde_json::from_str::<Turn>(r#"{"user_query": "x"}"#).is_err());
        assert!(
            serde_json::from_str::<Turn>(r#"{"role": "user", "content": "x", "extra": 1}"#)
                .is_err()
        );
    }

    #[test]
    fn test_session_id_is_opaque() {
        let id = SessionId::from("  weird/ID::with spaces ");
        assert_eq!(id.as_str(), "  weird/ID::with spaces ");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""  weird/ID::with spaces ""#);
    }
}
