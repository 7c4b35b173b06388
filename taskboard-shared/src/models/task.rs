/// Task model
///
/// Tasks are the only entity with outgoing references: exactly one status,
/// at most one assignee and any number of labels. In memory a task carries
/// its status and labels hydrated, so predicates can be evaluated without
/// going back to the store.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     position INTEGER,
///     assignee_id BIGINT REFERENCES users(id) ON DELETE RESTRICT,
///     status_id BIGINT NOT NULL REFERENCES task_statuses(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_labels (
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     label_id BIGINT NOT NULL REFERENCES labels(id) ON DELETE RESTRICT,
///     PRIMARY KEY (task_id, label_id)
/// );
/// ```
///
/// # Example
///
/// ```
/// use taskboard_shared::models::task::UpdateTask;
/// use taskboard_shared::patch::PatchField;
///
/// let patch: UpdateTask = serde_json::from_str(
///     r#"{"content": null, "status": "published", "taskLabelIds": []}"#,
/// )
/// .unwrap();
///
/// assert_eq!(patch.content, PatchField::Present(None));
/// assert_eq!(patch.status, PatchField::Present("published".to_string()));
/// assert!(patch.title.is_unset());
/// ```

use super::label::Label;
use super::task_status::TaskStatus;
use super::{Entity, EntityKind};
use crate::error::ServiceError;
use crate::patch::PatchField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,

    pub title: String,

    /// Free-form body, exposed as `content` in the API
    pub description: Option<String>,

    /// Ordering hint
    pub index: Option<i32>,

    /// Id of the assigned user, if any
    pub assignee_id: Option<i64>,

    pub status: TaskStatus,

    /// Attached labels, sorted and unique by id
    pub labels: Vec<Label>,

    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn label_ids(&self) -> Vec<i64> {
        self.labels.iter().map(|label| label.id).collect()
    }

    pub fn has_label(&self, label_id: i64) -> bool {
        self.labels.iter().any(|label| label.id == label_id)
    }

    /// Replaces the label set, keeping it sorted and unique by id
    pub fn set_labels(&mut self, labels: Vec<Label>) {
        self.labels = dedup_labels(labels);
    }
}

/// Insert shape for a task, with references already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub index: Option<i32>,
    pub assignee_id: Option<i64>,
    pub status: TaskStatus,
    pub labels: Vec<Label>,
}

impl Entity for Task {
    type Draft = NewTask;

    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Create payload
///
/// `status` is a status slug. Unknown label ids are dropped.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub index: Option<i32>,

    #[serde(default, rename = "assignee_id")]
    pub assignee_id: Option<i64>,

    #[validate(length(min = 1, message = "must not be empty"))]
    pub status: String,

    #[serde(default)]
    pub task_label_ids: Option<BTreeSet<i64>>,
}

/// Partial update payload
///
/// `taskLabelIds: null` and `taskLabelIds: []` both clear the labels;
/// `assignee_id: null` unassigns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTask {
    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub title: PatchField<String>,

    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub content: PatchField<Option<String>>,

    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub index: PatchField<Option<i32>>,

    #[serde(rename = "assignee_id", skip_serializing_if = "PatchField::is_unset")]
    pub assignee_id: PatchField<Option<i64>>,

    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub status: PatchField<String>,

    #[serde(skip_serializing_if = "PatchField::is_unset")]
    pub task_label_ids: PatchField<Option<BTreeSet<i64>>>,
}

impl UpdateTask {
    pub fn check(&self) -> Result<(), ServiceError> {
        if let PatchField::Present(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ServiceError::invalid("title", "must not be blank"));
            }
        }
        if let PatchField::Present(status) = &self.status {
            if status.trim().is_empty() {
                return Err(ServiceError::invalid("status", "must not be blank"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i64,
    pub index: Option<i32>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "assignee_id")]
    pub assignee_id: Option<i64>,
    pub title: String,
    pub content: Option<String>,
    /// Status slug
    pub status: String,
    pub task_label_ids: Vec<i64>,
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            index: task.index,
            created_at: task.created_at,
            assignee_id: task.assignee_id,
            title: task.title.clone(),
            content: task.description.clone(),
            status: task.status.slug.clone(),
            task_label_ids: task.label_ids(),
        }
    }
}

/// Sorts labels by id and drops repeats
pub fn dedup_labels(mut labels: Vec<Label>) -> Vec<Label> {
    labels.sort_by_key(|label| label.id);
    labels.dedup_by_key(|label| label.id);
    labels
}
