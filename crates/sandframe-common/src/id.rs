use serde::{Deserialize, Serialize};
use std::fmt;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Identifies one bridge session; reported to the host in `webview-ready`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_valid_uuid() {
        let id = new_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn new_id_is_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn session_id_display_matches_str() {
        let sid = SessionId::new();
        assert_eq!(sid.to_string(), sid.as_str());
    }

    #[test]
    fn session_id_serializes_as_plain_string() {
        let sid = SessionId::new();
        let json = serde_json::to_string(&sid).unwrap();
        assert_eq!(json, format!("\"{}\"", sid.as_str()));
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(sid, back);
    }

    #[test]
    fn session_ids_differ() {
        assert_ne!(SessionId::new(), SessionId::default());
    }
}
