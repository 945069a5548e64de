//! Invalidation tags
//!
//! A tag carries no data. Cache entries list the tags they provide;
//! mutations list the tags they invalidate. A bare tag (`Ticket`) matches
//! every tag of that kind, an id tag (`Ticket:1`) only itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Tag {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    pub fn with_id(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
        }
    }

    /// The bare tag of the same kind
    pub fn bare(&self) -> Tag {
        Tag::new(self.kind.clone())
    }

    pub fn is_bare(&self) -> bool {
        self.id.is_none()
    }

    /// Parse `Kind` or `Kind:id`
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((kind, id)) if !id.is_empty() => Tag::with_id(kind, id),
            _ => Tag::new(s.trim_end_matches(':')),
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag::parse(s)
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Tag::parse(&s)
    }
}
