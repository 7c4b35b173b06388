/// Domain models for Taskboard
///
/// Each model module holds the stored entity, the draft used to insert it,
/// the create/update request payloads and the response DTO.
///
/// # Models
///
/// - `user`: User accounts
/// - `task_status`: Workflow states, addressed by slug
/// - `label`: Free-form task tags
/// - `task`: Tasks referencing a status, an optional assignee and labels
///
/// # Example
///
/// ```
/// use taskboard_shared::models::{Entity, EntityKind};
/// use taskboard_shared::models::label::Label;
///
/// assert_eq!(Label::KIND, EntityKind::Label);
/// assert_eq!(EntityKind::TaskStatus.to_string(), "TaskStatus");
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod label;
pub mod task;
pub mod task_status;
pub mod user;

/// The four entity kinds managed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    TaskStatus,
    Label,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::TaskStatus => "TaskStatus",
            EntityKind::Label => "Label",
            EntityKind::Task => "Task",
        };
        f.write_str(name)
    }
}

/// A stored record with a store-assigned id
///
/// `Draft` is the shape handed to the store on insert, before an id and
/// timestamps exist.
pub trait Entity: Clone + Send + Sync + 'static {
    type Draft: Send + 'static;

    const KIND: EntityKind;

    fn id(&self) -> i64;
}
