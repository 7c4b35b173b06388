/// Applies partial update payloads to entities
///
/// Every `apply_*` method first turns the supplied fields into final values
/// (normalizing emails and slugs, hashing passwords, resolving references)
/// and only then writes them. A failure therefore leaves the entity exactly
/// as it was. Nothing here saves; the caller decides when to persist.
///
/// Reference resolution differs per field:
///
/// - status slugs are strict: an unknown slug is `NotFound`
/// - assignees are strict: an unknown user id is `NotFound`
/// - labels are lenient: unknown ids are dropped
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::auth::password::Argon2Encoder;
/// use taskboard_shared::models::label::{Label, UpdateLabel};
/// use taskboard_shared::patch::PatchField;
/// use taskboard_shared::patcher::EntityPatcher;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let patcher = EntityPatcher::new(Arc::new(Argon2Encoder::with_cost(1024, 1, 1)));
///
/// let mut label = Label { id: 1, name: "bug".into(), created_at: chrono::Utc::now() };
/// patcher.apply_label(&mut label, UpdateLabel::default())?;
/// assert_eq!(label.name, "bug");
///
/// patcher.apply_label(&mut label, UpdateLabel { name: PatchField::Present("defect".into()) })?;
/// assert_eq!(label.name, "defect");
/// # Ok(())
/// # }
/// ```

use crate::auth::password::PasswordEncoder;
use crate::error::ServiceError;
use crate::models::label::{Label, UpdateLabel};
use crate::models::task::{dedup_labels, Task, UpdateTask};
use crate::models::task_status::{normalize_slug, TaskStatus, UpdateTaskStatus};
use crate::models::user::{normalize_email, normalize_name, UpdateUser, User};
use crate::models::EntityKind;
use crate::patch::PatchField;
use crate::repository::{Repository, TaskStatusRepository, UnitOfWork};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Field-by-field patch application with derived effects
#[derive(Clone)]
pub struct EntityPatcher {
    encoder: Arc<dyn PasswordEncoder>,
}

impl EntityPatcher {
    pub fn new(encoder: Arc<dyn PasswordEncoder>) -> Self {
        Self { encoder }
    }

    /// Hashes a raw password with the configured encoder
    pub fn encode_password(&self, raw: &str) -> Result<String, ServiceError> {
        Ok(self.encoder.encode(raw)?)
    }

    /// Patches a user
    ///
    /// A supplied email is normalized; a supplied password replaces the
    /// stored hash with a fresh one. Unset fields stay untouched.
    pub fn apply_user(&self, user: &mut User, patch: UpdateUser) -> Result<(), ServiceError> {
        patch.check()?;

        let email = patch.email.try_map(|email| normalize_email(&email))?;
        let password_hash = patch.password.try_map(|raw| self.encode_password(&raw))?;

        patch
            .first_name
            .map(normalize_name)
            .apply_to(&mut user.first_name);
        patch
            .last_name
            .map(normalize_name)
            .apply_to(&mut user.last_name);
        email.apply_to(&mut user.email);
        if password_hash.apply_to(&mut user.password_hash) {
            debug!(user_id = user.id, "Password re-encoded");
        }

        Ok(())
    }

    pub fn apply_task_status(
        &self,
        status: &mut TaskStatus,
        patch: UpdateTaskStatus,
    ) -> Result<(), ServiceError> {
        patch.check()?;

        let slug = patch.slug.try_map(|slug| normalize_slug(&slug))?;

        patch.name.apply_to(&mut status.name);
        slug.apply_to(&mut status.slug);
        Ok(())
    }

    pub fn apply_label(&self, label: &mut Label, patch: UpdateLabel) -> Result<(), ServiceError> {
        patch.check()?;
        patch.name.apply_to(&mut label.name);
        Ok(())
    }

    /// Patches a task, resolving references through `uow`
    ///
    /// All lookups run before the first field is written.
    pub async fn apply_task<U: UnitOfWork>(
        &self,
        uow: &mut U,
        task: &mut Task,
        patch: UpdateTask,
    ) -> Result<(), ServiceError> {
        patch.check()?;

        let status = match patch.status {
            PatchField::Present(slug) => PatchField::Present(resolve_status(uow, &slug).await?),
            PatchField::Unset => PatchField::Unset,
        };
        let assignee_id = match patch.assignee_id {
            PatchField::Present(assignee) => PatchField::Present(resolve_assignee(uow, assignee).await?),
            PatchField::Unset => PatchField::Unset,
        };
        let labels = match patch.task_label_ids {
            PatchField::Present(ids) => PatchField::Present(resolve_labels(uow, ids).await?),
            PatchField::Unset => PatchField::Unset,
        };

        patch.title.apply_to(&mut task.title);
        patch.content.apply_to(&mut task.description);
        patch.index.apply_to(&mut task.index);
        assignee_id.apply_to(&mut task.assignee_id);
        status.apply_to(&mut task.status);
        if let PatchField::Present(labels) = labels {
            task.set_labels(labels);
        }

        Ok(())
    }
}

/// Looks a status up by slug, failing with `NotFound` when it is unknown
pub async fn resolve_status<U: UnitOfWork>(uow: &mut U, slug: &str) -> Result<TaskStatus, ServiceError> {
    uow.task_statuses()
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| ServiceError::slug_not_found(EntityKind::TaskStatus, slug))
}

/// Checks that an assignee exists; `None` passes through as "unassigned"
pub async fn resolve_assignee<U: UnitOfWork>(
    uow: &mut U,
    assignee_id: Option<i64>,
) -> Result<Option<i64>, ServiceError> {
    let Some(id) = assignee_id else {
        return Ok(None);
    };
    if uow.users().exists_by_id(id).await? {
        Ok(Some(id))
    } else {
        Err(ServiceError::not_found(EntityKind::User, id))
    }
}

/// Loads the labels that exist, ordered by id
///
/// Unknown ids are skipped. `None` and an empty set both yield no labels.
pub async fn resolve_labels<U: UnitOfWork>(
    uow: &mut U,
    label_ids: Option<BTreeSet<i64>>,
) -> Result<Vec<Label>, ServiceError> {
    let mut labels = Vec::new();
    for id in label_ids.unwrap_or_default() {
        match uow.labels().find_by_id(id).await? {
            Some(label) => labels.push(label),
            None => debug!(label_id = id, "Dropping unknown label"),
        }
    }
    Ok(dedup_labels(labels))
}
