/// Label model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE labels (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(1000) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use super::{Entity, EntityKind};
use crate::error::ServiceError;
use crate::patch::PatchField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Bounds on label name length, in characters
pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    pub name: String,
}

impl Entity for Label {
    type Draft = NewLabel;

    const KIND: EntityKind = EntityKind::Label;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLabel {
    #[validate(length(min = 3, max = 1000, message = "must be between 3 and 1000 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateLabel {
    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub name: PatchField<String>,
}

impl UpdateLabel {
    pub fn check(&self) -> Result<(), ServiceError> {
        if let PatchField::Present(name) = &self.name {
            let len = name.chars().count();
            if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
                return Err(ServiceError::invalid(
                    "name",
                    "must be between 3 and 1000 characters",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDto {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Label> for LabelDto {
    fn from(label: &Label) -> Self {
        Self {
            id: label.id,
            name: label.name.clone(),
            created_at: label.created_at,
        }
    }
}
