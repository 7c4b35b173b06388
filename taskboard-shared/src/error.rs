/// Service-level errors
///
/// Every engine operation returns `Result<T, ServiceError>`. Store failures
/// are classified on the way in: unique violations become `AlreadyExists`,
/// rows that vanished mid-operation become `NotFound`, everything else is
/// carried as an infrastructure failure.
///
/// # Example
///
/// ```
/// use taskboard_shared::error::{EntityKey, ServiceError};
/// use taskboard_shared::models::EntityKind;
///
/// let err = ServiceError::not_found(EntityKind::Task, 7);
/// assert_eq!(err.to_string(), "Task with id 7 not found");
///
/// let err = ServiceError::NotFound {
///     kind: EntityKind::TaskStatus,
///     key: EntityKey::Slug("draft".to_string()),
/// };
/// assert_eq!(err.to_string(), "TaskStatus with slug 'draft' not found");
/// ```

use crate::auth::password::PasswordError;
use crate::models::EntityKind;
use crate::repository::StoreError;
use serde::Serialize;
use std::fmt;

/// Reason attached to guard refusals
pub const REFERENCED_BY_TASK: &str = "referenced by at least one task";

/// Lookup key of an entity that could not be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKey {
    Id(i64),
    Slug(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Id(id) => write!(f, "id {}", id),
            EntityKey::Slug(slug) => write!(f, "slug '{}'", slug),
        }
    }
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears in the request payload
    pub field: String,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Target entity or referenced entity does not exist
    #[error("{kind} with {key} not found")]
    NotFound { kind: EntityKind, key: EntityKey },

    /// Delete refused because other records still point at the entity
    #[error("Cannot delete {kind} with id {id}: {reason}")]
    Conflict {
        kind: EntityKind,
        id: i64,
        reason: String,
    },

    /// Unique constraint violated on save
    #[error("Duplicate value violates unique constraint {constraint}")]
    AlreadyExists { constraint: String },

    /// Malformed input caught before touching storage
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// Wrong email or password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Storage failure
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Password hashing failure
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ServiceError {
    /// NotFound keyed by id
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        ServiceError::NotFound {
            kind,
            key: EntityKey::Id(id),
        }
    }

    /// NotFound keyed by slug
    pub fn slug_not_found(kind: EntityKind, slug: &str) -> Self {
        ServiceError::NotFound {
            kind,
            key: EntityKey::Slug(slug.to_string()),
        }
    }

    /// Guard refusal for a referenced entity
    pub fn referenced(kind: EntityKind, id: i64) -> Self {
        ServiceError::Conflict {
            kind,
            id,
            reason: REFERENCED_BY_TASK.to_string(),
        }
    }

    /// Validation failure for a single field
    pub fn invalid(field: &str, message: &str) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) => ServiceError::AlreadyExists { constraint },
            StoreError::MissingRow { kind, id } => ServiceError::not_found(kind, id),
            other => ServiceError::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ServiceError::Validation(details)
    }
}
