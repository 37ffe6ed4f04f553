//! # JSON Pointers
//!
//! Hierarchical paths into a JSON document, and the location evaluator
//! classifying one pointer relative to another. Pointers address the
//! nodes of the twin's resource tree: `/` is the twin itself,
//! `/features/motor/properties/speed` a nested property.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Where a candidate pointer lies relative to a reference pointer.
///
/// Used by the enforcement engines to decide whether a declaration at
/// one tree node is relevant to a query at another: declarations at or
/// above a key propagate downward, declarations below it matter only
/// for partial and view queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointerLocation {
    /// The pointers are structurally equal.
    Same,
    /// The reference is a strict ancestor of the candidate.
    Above,
    /// The reference is a strict descendant of the candidate.
    Below,
    /// Neither pointer is a prefix of the other.
    Different,
}

/// An ordered sequence of path segments into a JSON document.
///
/// The root pointer is the empty sequence. Textual form follows
/// RFC 6901 (`~0` escapes `~`, `~1` escapes `/`), with one platform
/// convention on top: empty segments are dropped, so `/a//b` and
/// `/a/b/` both parse to `/a/b`, and `/` parses to the root.
///
/// # Example
///
/// ```
/// use twin_model::JsonPointer;
///
/// let pointer = JsonPointer::parse("/features/motor").unwrap();
/// assert_eq!(pointer.len(), 2);
/// assert_eq!(pointer.to_string(), "/features/motor");
/// assert!(JsonPointer::root().is_root());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// The root pointer (empty segment sequence).
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a pointer from an iterable of segments.
    ///
    /// Segments are taken verbatim; no escaping is interpreted.
    pub fn of<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a pointer from its RFC 6901 textual form.
    ///
    /// # Arguments
    ///
    /// * `s` - `""` or `"/"` for the root, otherwise `/seg/seg/...`
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidPointer`] if a non-empty pointer does not
    /// start with `/` or contains an incomplete `~` escape.
    ///
    /// # Example
    ///
    /// ```
    /// use twin_model::JsonPointer;
    ///
    /// let p = JsonPointer::parse("/a~1b/c~0d").unwrap();
    /// assert_eq!(p.segments(), ["a/b", "c~d"]);
    /// assert!(JsonPointer::parse("missing-slash").is_err());
    /// ```
    pub fn parse(s: &str) -> ModelResult<Self> {
        if s.is_empty() || s == "/" {
            return Ok(Self::root());
        }
        if !s.starts_with('/') {
            return Err(ModelError::InvalidPointer(s.to_string()));
        }
        let mut segments = Vec::new();
        for raw in s[1..].split('/') {
            if raw.is_empty() {
                continue;
            }
            segments.push(unescape_segment(raw, s)?);
        }
        Ok(Self { segments })
    }

    /// Get the pointer's segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Get the number of segments (0 for the root).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root pointer.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Return this pointer extended by one child segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Return the parent pointer, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Check whether `prefix` is a (non-strict) prefix of this pointer.
    pub fn starts_with(&self, prefix: &JsonPointer) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Classify where `candidate` lies relative to this pointer.
    ///
    /// # Example
    ///
    /// ```
    /// use twin_model::{JsonPointer, PointerLocation};
    ///
    /// let features = JsonPointer::parse("/features").unwrap();
    /// let speed = JsonPointer::parse("/features/motor/speed").unwrap();
    ///
    /// assert_eq!(features.locate(&speed), PointerLocation::Above);
    /// assert_eq!(speed.locate(&features), PointerLocation::Below);
    /// assert_eq!(features.locate(&features), PointerLocation::Same);
    /// ```
    pub fn locate(&self, candidate: &JsonPointer) -> PointerLocation {
        if self.segments == candidate.segments {
            PointerLocation::Same
        } else if candidate.starts_with(self) {
            PointerLocation::Above
        } else if self.starts_with(candidate) {
            PointerLocation::Below
        } else {
            PointerLocation::Different
        }
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", escape_segment(segment))?;
        }
        Ok(())
    }
}

// Pointers travel in their escaped textual form.
impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(raw: &str, pointer: &str) -> ModelResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(ModelError::InvalidPointer(pointer.to_string())),
        }
    }
    Ok(out)
}
