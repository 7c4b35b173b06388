/// User model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     first_name VARCHAR(255) NOT NULL DEFAULT '',
///     last_name VARCHAR(255) NOT NULL DEFAULT '',
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```
/// use taskboard_shared::models::user::{normalize_email, UpdateUser};
/// use taskboard_shared::patch::PatchField;
///
/// assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
///
/// let patch: UpdateUser = serde_json::from_str(r#"{"firstName": null}"#).unwrap();
/// assert_eq!(patch.first_name, PatchField::Present(None));
/// assert!(patch.password.is_unset());
/// ```

use super::{Entity, EntityKind};
use crate::error::{FieldError, ServiceError};
use crate::patch::PatchField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail};

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Store-assigned id
    pub id: i64,

    /// Given name, empty string when not provided
    pub first_name: String,

    /// Family name, empty string when not provided
    pub last_name: String,

    /// Login email, trimmed and lower-cased, unique
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

impl Entity for User {
    type Draft = NewUser;

    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[validate(email(message = "must be a well-formed email address"))]
    pub email: String,

    /// Plaintext password, hashed before storage
    #[validate(length(min = 3, message = "must be at least 3 characters long"))]
    pub password: String,
}

/// Partial update payload
///
/// `null` names become the empty string. The password is re-hashed only when
/// supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub first_name: PatchField<Option<String>>,

    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub last_name: PatchField<Option<String>>,

    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub email: PatchField<String>,

    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub password: PatchField<String>,
}

impl UpdateUser {
    /// Checks supplied fields only
    pub fn check(&self) -> Result<(), ServiceError> {
        let mut errors = Vec::new();

        if let PatchField::Present(email) = &self.email {
            if !email.trim().validate_email() {
                errors.push(FieldError::new("email", "must be a well-formed email address"));
            }
        }

        if let PatchField::Present(password) = &self.password {
            if password.chars().count() < 3 {
                errors.push(FieldError::new("password", "must be at least 3 characters long"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors))
        }
    }
}

/// Public view of a user, without the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Trims and lower-cases an email address
///
/// # Errors
///
/// Returns a validation error if nothing is left after trimming.
pub fn normalize_email(raw: &str) -> Result<String, ServiceError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ServiceError::invalid("email", "must not be blank"));
    }
    Ok(email)
}

/// Blank or missing names are stored as the empty string
pub fn normalize_name(raw: Option<String>) -> String {
    match raw {
        Some(name) if !name.trim().is_empty() => name,
        _ => String::new(),
    }
}
