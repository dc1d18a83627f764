//! Identity types for pages and components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Prefix carried by component ids that were generated locally and have not
/// been persisted yet.
pub const PLACEHOLDER_PREFIX: &str = "temp-";

/// A unique identifier for a page.
///
/// UUID assigned by the durable store when the page row is created.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(uuid::Uuid);

impl PageId {
    /// Create a new random PageId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse a PageId from its hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ModelError::InvalidPageId(s.to_string()))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PageId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

/// Identity of a component instance.
///
/// A durable id is the row key the store knows the component by. A
/// placeholder id is minted by the editor for a component that has not been
/// inserted yet; it must never be sent to storage.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentId {
    /// Id assigned by durable storage.
    Durable(String),
    /// Locally generated id (`temp-…`).
    Placeholder(String),
}

impl ComponentId {
    /// Create a new durable id (UUID v4), as the store would assign.
    pub fn new_durable() -> Self {
        Self::Durable(uuid::Uuid::new_v4().to_string())
    }

    /// Create a new placeholder id.
    pub fn placeholder() -> Self {
        Self::Placeholder(format!(
            "{}{}",
            PLACEHOLDER_PREFIX,
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Parse an id, classifying it by its prefix.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidComponentId(s.to_string()));
        }
        if let Some(rest) = trimmed.strip_prefix(PLACEHOLDER_PREFIX) {
            if rest.is_empty() {
                return Err(ModelError::InvalidComponentId(s.to_string()));
            }
            return Ok(Self::Placeholder(trimmed.to_string()));
        }
        Ok(Self::Durable(trimmed.to_string()))
    }

    /// Whether the store already knows this component.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Durable(_))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Durable(s) | Self::Placeholder(s) => s,
        }
    }
}

impl TryFrom<String> for ComponentId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        match id {
            ComponentId::Durable(s) | ComponentId::Placeholder(s) => s,
        }
    }
}

impl FromStr for ComponentId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable(s) => write!(f, "ComponentId({})", s),
            Self::Placeholder(s) => write!(f, "ComponentId(placeholder {})", s),
        }
    }
}
