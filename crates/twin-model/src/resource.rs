//! # Resources
//!
//! Resource types and resource keys. A resource key pairs a resource
//! type (an opaque namespace such as `thing`, `policy` or `message`)
//! with a JSON pointer into that type's document. Enforcement trees are
//! built and queried per type and never merged across types.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::pointer::JsonPointer;

/// An opaque resource namespace.
///
/// A declaration whose type differs from a query's type is simply
/// invisible to that query; a mismatch is never an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    /// Create a resource type from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResourceType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A (resource type, JSON pointer) pair identifying one node of a
/// hierarchical document.
///
/// Textual form is `type:/pointer`, e.g. `thing:/features/motor`.
///
/// # Example
///
/// ```
/// use twin_model::ResourceKey;
///
/// let key = ResourceKey::parse("thing:/features/motor").unwrap();
/// assert_eq!(key.resource_type().as_str(), "thing");
/// assert_eq!(key.path().len(), 2);
/// assert_eq!(key.to_string(), "thing:/features/motor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    resource_type: ResourceType,
    path: JsonPointer,
}

impl ResourceKey {
    /// Create a resource key from a type and a pointer.
    pub fn new(resource_type: impl Into<ResourceType>, path: JsonPointer) -> Self {
        Self {
            resource_type: resource_type.into(),
            path,
        }
    }

    /// The root key (`/`) of a resource type.
    pub fn root(resource_type: impl Into<ResourceType>) -> Self {
        Self::new(resource_type, JsonPointer::root())
    }

    /// Parse a resource key from its `type:/pointer` textual form.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidResourceKey`] if the separator or type is
    /// missing, or the pointer part does not parse.
    ///
    /// # Example
    ///
    /// ```
    /// use twin_model::ResourceKey;
    ///
    /// assert!(ResourceKey::parse("thing:/").is_ok());
    /// assert!(ResourceKey::parse("no-separator").is_err());
    /// assert!(ResourceKey::parse(":/path").is_err());
    /// ```
    pub fn parse(s: &str) -> ModelResult<Self> {
        let (type_part, path_part) = s
            .split_once(':')
            .ok_or_else(|| ModelError::InvalidResourceKey(s.to_string()))?;
        if type_part.is_empty() {
            return Err(ModelError::InvalidResourceKey(s.to_string()));
        }
        let path = JsonPointer::parse(path_part)
            .map_err(|_| ModelError::InvalidResourceKey(s.to_string()))?;
        Ok(Self::new(type_part, path))
    }

    /// Get the resource type.
    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    /// Get the pointer part.
    pub fn path(&self) -> &JsonPointer {
        &self.path
    }

    /// Return this key with the pointer extended by one child segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        Self {
            resource_type: self.resource_type.clone(),
            path: self.path.child(segment),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.path)
    }
}

// Resource keys travel as their `type:/pointer` text, also when used
// as JSON object keys.
impl Serialize for ResourceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let key = ResourceKey::parse("thing:/features/motor").unwrap();
        assert_eq!(key.resource_type().as_str(), "thing");
        assert_eq!(key.path().segments(), ["features", "motor"]);
        assert_eq!(key.to_string(), "thing:/features/motor");
    }

    #[test]
    fn test_parse_root() {
        let key = ResourceKey::parse("policy:/").unwrap();
        assert!(key.path().is_root());
        assert_eq!(key, ResourceKey::root("policy"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ResourceKey::parse("no-separator"),
            Err(ModelError::InvalidResourceKey("no-separator".to_string()))
        );
        assert!(ResourceKey::parse(":/path").is_err());
        assert!(ResourceKey::parse("thing:bad-pointer").is_err());
    }

    #[test]
    fn test_child() {
        let key = ResourceKey::root("thing").child("attributes").child("vin");
        assert_eq!(key.to_string(), "thing:/attributes/vin");
    }

    #[test]
    fn test_serde_as_text() {
        let key = ResourceKey::parse("thing:/features/motor").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"thing:/features/motor\"");
        let back: ResourceKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);

        assert!(serde_json::from_str::<ResourceKey>("\"no-separator\"").is_err());
    }
}
