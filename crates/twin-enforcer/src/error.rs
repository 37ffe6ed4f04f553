//! Error types for enforcer construction
//!
//! Queries on a built enforcer are total and never fail; construction
//! is the only fallible step. A construction failure yields no usable
//! instance, keeping bugs distinguishable from "permission denied".

use thiserror::Error;
use twin_model::ModelError;

/// Enforcer construction error types.
#[derive(Debug, Error)]
pub enum EnforcerError {
    /// A model value inside the policy could not be constructed.
    #[error("Policy model error: {0}")]
    Model(#[from] ModelError),

    /// The policy violates a structural precondition.
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),
}

/// Result type for enforcer construction.
pub type EnforcerResult<T> = Result<T, EnforcerError>;
