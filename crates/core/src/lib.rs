//! Shared primitives for all Rust crates in Evidentia.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::PrincipalId;

/// Result type used across Evidentia crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string for the named input field.
    pub fn new(field: &str, value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::validation(
                field,
                "value must not be empty or whitespace",
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated principal accompanies the request.
    #[error("authentication required")]
    Unauthenticated,

    /// Principal is authenticated but does not satisfy the requirement.
    #[error("forbidden: requires {requirement}")]
    Forbidden {
        /// Rendered form of the unmet requirement.
        requirement: String,
    },

    /// Requested resource does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Entity kind label.
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A lifecycle transition was attempted out of order.
    #[error("invalid transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// Invalid input or violated invariant on a named field.
    #[error("validation failed for '{field}': {reason}")]
    Validation {
        /// Offending input field.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Write lost an optimistic-concurrency race and may be retried.
    #[error("conflicting write: {0}")]
    Conflict(String),

    /// Persistence or storage collaborator could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a validation error for one input field.
    #[must_use]
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    /// Builds a not-found error for one entity.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Builds an invalid-transition error between two named states.
    #[must_use]
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Returns whether the caller may retry the operation unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString, PrincipalId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("reason", "   ");
        assert!(matches!(
            result,
            Err(AppError::Validation { ref field, .. }) if field == "reason"
        ));
    }

    #[test]
    fn principal_id_formats_as_uuid() {
        let principal_id = PrincipalId::new();
        assert_eq!(principal_id.to_string().len(), 36);
    }

    #[test]
    fn principal_id_parses_its_display_form() {
        let principal_id = PrincipalId::new();
        let parsed = principal_id.to_string().parse::<PrincipalId>();
        assert_eq!(parsed.ok(), Some(principal_id));
    }

    #[test]
    fn only_conflicts_and_outages_are_retryable() {
        assert!(AppError::Conflict("stale".to_owned()).is_retryable());
        assert!(AppError::Unavailable("down".to_owned()).is_retryable());
        assert!(!AppError::Unauthenticated.is_retryable());
        assert!(!AppError::validation("reason", "empty").is_retryable());
    }
}
