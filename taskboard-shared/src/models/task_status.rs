/// Task status model
///
/// A status is a named workflow state (`Draft`, `To review`, ...) addressed by
/// a unique slug. Tasks refer to their status by slug in request payloads.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_statuses (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use super::{Entity, EntityKind};
use crate::error::{FieldError, ServiceError};
use crate::patch::PatchField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskStatus {
    pub id: i64,

    /// Display name
    pub name: String,

    /// Unique, non-blank identifier used by task payloads and filters
    pub slug: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskStatus {
    pub name: String,
    pub slug: String,
}

impl Entity for TaskStatus {
    type Draft = NewTaskStatus;

    const KIND: EntityKind = EntityKind::TaskStatus;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTaskStatus {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,

    #[validate(length(min = 1, message = "must not be empty"))]
    pub slug: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateTaskStatus {
    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub name: PatchField<String>,

    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub slug: PatchField<String>,
}

impl UpdateTaskStatus {
    /// Checks supplied fields only
    pub fn check(&self) -> Result<(), ServiceError> {
        let mut errors = Vec::new();
        if let PatchField::Present(name) = &self.name {
            if name.is_empty() {
                errors.push(FieldError::new("name", "must not be empty"));
            }
        }
        if let PatchField::Present(slug) = &self.slug {
            if slug.trim().is_empty() {
                errors.push(FieldError::new("slug", "must not be blank"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl From<&TaskStatus> for TaskStatusDto {
    fn from(status: &TaskStatus) -> Self {
        Self {
            id: status.id,
            name: status.name.clone(),
            slug: status.slug.clone(),
            created_at: status.created_at,
        }
    }
}

/// Trims a slug, rejecting blank ones
pub fn normalize_slug(raw: &str) -> Result<String, ServiceError> {
    let slug = raw.trim();
    if slug.is_empty() {
        return Err(ServiceError::invalid("slug", "must not be blank"));
    }
    Ok(slug.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug(" to_review ").unwrap(), "to_review");
        assert!(normalize_slug("  ").is_err());
    }

    #[test]
    fn test_update_check() {
        let patch: UpdateTaskStatus = serde_json::from_str(r#"{"slug": " "}"#).unwrap();
        assert!(patch.name.is_unset());
        assert!(matches!(patch.check(), Err(ServiceError::Validation(ref f)) if f[0].field == "slug"));

        let patch: UpdateTaskStatus = serde_json::from_str(r#"{"name": "Published"}"#).unwrap();
        assert!(patch.check().is_ok());
    }
}
