//! Error types for the Region3D engine
//!
//! This module defines the error types used throughout the engine,
//! covering hull construction, registry key misuse, and internal
//! invariant checks.

use std::fmt;

use crate::geometry::region::RegionId;

/// Result type for Region3D engine operations
pub type Region3dResult<T> = Result<T, Region3dError>;

/// Region3D engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region3dError {
    /// Hull construction was given an empty point set
    EmptyInput,

    /// A region with this identifier is already registered
    DuplicateId(RegionId),

    /// No region with this identifier is registered
    NotFound(RegionId),

    /// The spatial index has no entry for the given internal key
    KeyNotFound,

    /// An internal geometry or index invariant failed.
    ///
    /// This signals a programming error (hull convexity broken, index
    /// tree corrupted). Callers should treat it as fatal, not recover.
    InvariantViolation(String),
}

impl fmt::Display for Region3dError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region3dError::EmptyInput => write!(f, "Empty input: hull construction requires at least one point"),
            Region3dError::DuplicateId(id) => write!(f, "Duplicate region id: {}", id.0),
            Region3dError::NotFound(id) => write!(f, "Region not found: {}", id.0),
            Region3dError::KeyNotFound => write!(f, "Spatial index entry not found for key"),
            Region3dError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
        }
    }
}

impl std::error::Error for Region3dError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
