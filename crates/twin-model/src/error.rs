//! Error types for the policy data model
//!
//! This module defines the failures that can occur while constructing
//! model values from raw text (pointers, resource keys, labels). The
//! query surface of the enforcement engines is total and never reports
//! through these types; only construction does.

use thiserror::Error;

/// Policy model error types.
///
/// These errors cover malformed textual inputs. They are raised at
/// construction time so that a bad declaration can never be mistaken
/// for a legitimate "permission denied" outcome at query time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A JSON pointer string could not be parsed.
    #[error("Invalid JSON pointer: {0}")]
    InvalidPointer(String),

    /// A resource key string could not be parsed.
    #[error("Invalid resource key: {0}")]
    InvalidResourceKey(String),

    /// A policy entry label was empty.
    #[error("Policy entry label must not be empty")]
    EmptyLabel,
}

/// Result type for model construction operations.
pub type ModelResult<T> = Result<T, ModelError>;
