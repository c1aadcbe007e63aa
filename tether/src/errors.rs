use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;

/// Top-level error type returned by tether stores and aggregators.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Validation failed for one or more fields.
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Missing, expired or unknown credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// The requester does not own the resource it tried to act on.
    #[error("forbidden: {action}")]
    Forbidden { action: Cow<'static, str> },

    /// Target entity was not found when performing a read or mutation.
    #[error("entity not found")]
    NotFound { entity_id: Option<String> },

    /// Unique constraint violation - the value(s) already exist on another entity.
    #[error("unique constraint violation: fields {fields:?} with values {values:?} already exist on entity '{existing_entity_id}'")]
    UniqueConstraintViolation {
        fields: Vec<String>,
        values: Vec<String>,
        existing_entity_id: String,
    },

    /// Optimistic concurrency guard detected a stale version.
    #[error("version conflict (expected {expected:?}, actual {actual:?})")]
    VersionConflict { expected: Option<u64>, actual: Option<u64> },

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl RepoError {
    pub fn not_found(entity_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn forbidden(action: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden { action: action.into() }
    }

    pub fn other(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Other { message: message.into() }
    }

    /// Short machine-checkable reason code surfaced to API clients.
    pub fn reason(&self) -> &'static str {
        match self {
            RepoError::Validation(_) => "validation_failed",
            RepoError::Unauthorized => "unauthorized",
            RepoError::Forbidden { .. } => "forbidden",
            RepoError::NotFound { .. } => "not_found",
            RepoError::UniqueConstraintViolation { .. } | RepoError::VersionConflict { .. } => "conflict",
            RepoError::Redis(_) | RepoError::Other { .. } => "internal",
        }
    }
}

/// Collection of validation issues encountered while preparing a mutation.
#[derive(Debug, Error)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true when any issue carries the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    /// Returns `Ok(())` when no issues were collected.
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Detailed validation failure for a single field or logical path.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
