//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! identifier validation and snapshot content validation.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Member identifier was empty or whitespace
    #[error("Invalid member id: {0:?}")]
    InvalidMemberId(String),

    /// Group tag was empty, whitespace, or contained a path separator
    #[error("Invalid group tag: {0:?}")]
    InvalidGroupTag(String),
}

/// Errors raised while parsing or validating snapshot content
///
/// Every variant means the snapshot is skipped entirely and the previously
/// known state for the group is kept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The content is not valid JSON
    #[error("Snapshot is not valid JSON: {0}")]
    InvalidJson(String),

    /// The JSON is well-formed but does not have the expected shape
    #[error("Malformed snapshot: {0}")]
    Malformed(String),

    /// The same member id appears more than once
    #[error("Malformed snapshot: duplicate member id {0}")]
    DuplicateMember(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidMemberId(String::new());
        assert_eq!(err.to_string(), "Invalid member id: \"\"");

        let err = SnapshotError::DuplicateMember("7656".to_string());
        assert_eq!(
            err.to_string(),
            "Malformed snapshot: duplicate member id 7656"
        );
    }

    #[test]
    fn test_error_equality() {
        let a = SnapshotError::Malformed("members".to_string());
        let b = SnapshotError::Malformed("members".to_string());
        let c = SnapshotError::InvalidJson("members".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
