/// Pre-delete referential checks
///
/// Users, task statuses and labels may only be deleted while no task points
/// at them. Tasks are never guarded. The check runs inside the caller's unit
/// of work so that it and the delete commit or fail together.

use crate::error::ServiceError;
use crate::models::EntityKind;
use crate::repository::{TaskRepository, UnitOfWork};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferentialGuard;

impl ReferentialGuard {
    /// Returns whether no task references the entity
    pub async fn can_delete<U: UnitOfWork>(
        &self,
        uow: &mut U,
        kind: EntityKind,
        id: i64,
    ) -> Result<bool, ServiceError> {
        let referenced = match kind {
            EntityKind::User => uow.tasks().exists_by_assignee_id(id).await?,
            EntityKind::TaskStatus => uow.tasks().exists_by_status_id(id).await?,
            EntityKind::Label => uow.tasks().exists_by_labels_id(id).await?,
            EntityKind::Task => false,
        };
        Ok(!referenced)
    }

    /// Fails with `Conflict` when a task references the entity
    pub async fn ensure_can_delete<U: UnitOfWork>(
        &self,
        uow: &mut U,
        kind: EntityKind,
        id: i64,
    ) -> Result<(), ServiceError> {
        if self.can_delete(uow, kind, id).await? {
            return Ok(());
        }
        warn!(kind = %kind, id, "Delete refused, entity is referenced by a task");
        Err(ServiceError::referenced(kind, id))
    }
}
