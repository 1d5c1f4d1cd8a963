use crate::model::InvalidIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const PATH_PREFIX: &str = "session/";

/// Identifier of one meeting, assigned by whoever creates it.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses an id as it appears in a URL path. A leading `session/` segment is
    /// stripped so `session/abc` and `abc` name the same session.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidIdentifier> {
        let s = s.into();
        let trimmed = s.strip_prefix(PATH_PREFIX).unwrap_or(&s);
        if trimmed.trim().is_empty() {
            return Err(InvalidIdentifier);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = InvalidIdentifier;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = InvalidIdentifier;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
