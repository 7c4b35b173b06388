/// Storage backends implementing the repository contract
///
/// - `memory`: process-local tables behind an async mutex; used by tests and
///   for running small data sets without a database
/// - `postgres`: sqlx transactions over a `PgPool`

pub mod memory;
pub mod postgres;

/// Constraint names shared by both backends, matching the Postgres schema
pub mod constraints {
    pub const USERS_EMAIL_KEY: &str = "users_email_key";
    pub const TASK_STATUSES_SLUG_KEY: &str = "task_statuses_slug_key";
    pub const LABELS_NAME_KEY: &str = "labels_name_key";
    pub const TASKS_ASSIGNEE_FKEY: &str = "tasks_assignee_id_fkey";
    pub const TASKS_STATUS_FKEY: &str = "tasks_status_id_fkey";
    pub const TASK_LABELS_LABEL_FKEY: &str = "task_labels_label_id_fkey";
}
