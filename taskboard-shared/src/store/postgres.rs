/// PostgreSQL store
///
/// Each unit of work is one sqlx transaction. Integrity is enforced by the
/// schema (unique keys, `ON DELETE RESTRICT` foreign keys); constraint
/// failures come back as [`StoreError::UniqueViolation`] or
/// [`StoreError::ForeignKeyViolation`].
///
/// `lock_by_id` takes a `FOR UPDATE` row lock, so a delete that checked for
/// referencing tasks cannot race a concurrent insert pointing at the same row:
/// the insert's foreign key check waits for the lock.
///
/// Tasks are read with their status joined in and labels loaded by a second
/// query over all returned task ids.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::repository::{Store, TaskRepository, UnitOfWork};
/// use taskboard_shared::store::postgres::PgStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgStore::new(pool);
/// let mut uow = store.begin().await?;
/// let in_use = uow.tasks().exists_by_status_id(1).await?;
/// uow.commit().await?;
/// # Ok(())
/// # }
/// ```

use crate::db::pool::health_check;
use crate::filter::TaskPredicate;
use crate::models::label::{Label, NewLabel};
use crate::models::task::{dedup_labels, NewTask, Task};
use crate::models::task_status::{NewTaskStatus, TaskStatus};
use crate::models::user::{NewUser, User};
use crate::models::EntityKind;
use crate::repository::{
    Repository, Store, StoreError, TaskRepository, TaskStatusRepository, UnitOfWork, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use std::collections::HashMap;
use tracing::debug;

const TASK_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.position, t.assignee_id, t.created_at,
           s.id AS status_id, s.name AS status_name, s.slug AS status_slug,
           s.created_at AS status_created_at
    FROM tasks t
    JOIN task_statuses s ON s.id = t.status_id
"#;

/// Store backed by a Postgres connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await?;
        Ok(())
    }
}

/// One database transaction; rolled back if dropped before `commit`
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl PgTx {
    fn task_from_row(row: &PgRow) -> Result<Task, sqlx::Error> {
        Ok(Task {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            index: row.try_get("position")?,
            assignee_id: row.try_get("assignee_id")?,
            status: TaskStatus {
                id: row.try_get("status_id")?,
                name: row.try_get("status_name")?,
                slug: row.try_get("status_slug")?,
                created_at: row.try_get("status_created_at")?,
            },
            labels: Vec::new(),
            created_at: row.try_get("created_at")?,
        })
    }

    /// Maps task rows and attaches their labels
    async fn hydrate_tasks(&mut self, rows: Vec<PgRow>) -> Result<Vec<Task>, StoreError> {
        let mut tasks = rows
            .iter()
            .map(Self::task_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        if tasks.is_empty() {
            return Ok(tasks);
        }

        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let label_rows = sqlx::query(
            r#"
            SELECT tl.task_id, l.id, l.name, l.created_at
            FROM task_labels tl
            JOIN labels l ON l.id = tl.label_id
            WHERE tl.task_id = ANY($1)
            ORDER BY tl.task_id, l.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut by_task: HashMap<i64, Vec<Label>> = HashMap::new();
        for row in &label_rows {
            let task_id: i64 = row.try_get("task_id")?;
            by_task.entry(task_id).or_default().push(Label {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                created_at: row.try_get("created_at")?,
            });
        }

        for task in &mut tasks {
            if let Some(labels) = by_task.remove(&task.id) {
                task.labels = labels;
            }
        }
        Ok(tasks)
    }

    async fn replace_task_labels(&mut self, task_id: i64, labels: &[Label]) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *self.tx)
            .await?;
        self.insert_task_labels(task_id, labels).await
    }

    async fn insert_task_labels(&mut self, task_id: i64, labels: &[Label]) -> Result<(), StoreError> {
        if labels.is_empty() {
            return Ok(());
        }
        let label_ids: Vec<i64> = labels.iter().map(|l| l.id).collect();
        sqlx::query(
            "INSERT INTO task_labels (task_id, label_id) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
        )
        .bind(task_id)
        .bind(&label_ids)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgTx {
    type Users = PgTx;
    type Statuses = PgTx;
    type Labels = PgTx;
    type Tasks = PgTx;

    fn users(&mut self) -> &mut PgTx {
        self
    }

    fn task_statuses(&mut self) -> &mut PgTx {
        self
    }

    fn labels(&mut self) -> &mut PgTx {
        self
    }

    fn tasks(&mut self) -> &mut PgTx {
        self
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }
}

#[async_trait]
impl Repository<User> for PgTx {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn find_all(&mut self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(users)
    }

    async fn insert(&mut self, draft: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(draft.first_name)
        .bind(draft.last_name)
        .bind(draft.email)
        .bind(draft.password_hash)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn save(&mut self, user: &User) -> Result<User, StoreError> {
        let saved = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4, password_hash = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, first_name, last_name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_optional(&mut *self.tx)
        .await?;

        saved.ok_or(StoreError::MissingRow {
            kind: EntityKind::User,
            id: user.id,
        })
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(exists)
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn lock_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(locked.is_some())
    }
}

#[async_trait]
impl UserRepository for PgTx {
    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl Repository<TaskStatus> for PgTx {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<TaskStatus>, StoreError> {
        let status = sqlx::query_as::<_, TaskStatus>(
            "SELECT id, name, slug, created_at FROM task_statuses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(status)
    }

    async fn find_all(&mut self) -> Result<Vec<TaskStatus>, StoreError> {
        let statuses = sqlx::query_as::<_, TaskStatus>(
            "SELECT id, name, slug, created_at FROM task_statuses ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(statuses)
    }

    async fn insert(&mut self, draft: NewTaskStatus) -> Result<TaskStatus, StoreError> {
        let status = sqlx::query_as::<_, TaskStatus>(
            r#"
            INSERT INTO task_statuses (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, created_at
            "#,
        )
        .bind(draft.name)
        .bind(draft.slug)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(status)
    }

    async fn save(&mut self, status: &TaskStatus) -> Result<TaskStatus, StoreError> {
        let saved = sqlx::query_as::<_, TaskStatus>(
            r#"
            UPDATE task_statuses
            SET name = $2, slug = $3
            WHERE id = $1
            RETURNING id, name, slug, created_at
            "#,
        )
        .bind(status.id)
        .bind(&status.name)
        .bind(&status.slug)
        .fetch_optional(&mut *self.tx)
        .await?;

        saved.ok_or(StoreError::MissingRow {
            kind: EntityKind::TaskStatus,
            id: status.id,
        })
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM task_statuses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM task_statuses WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(exists)
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM task_statuses")
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn lock_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let locked =
            sqlx::query_scalar::<_, i64>("SELECT id FROM task_statuses WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(locked.is_some())
    }
}

#[async_trait]
impl TaskStatusRepository for PgTx {
    async fn find_by_slug(&mut self, slug: &str) -> Result<Option<TaskStatus>, StoreError> {
        let status = sqlx::query_as::<_, TaskStatus>(
            "SELECT id, name, slug, created_at FROM task_statuses WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(status)
    }
}

#[async_trait]
impl Repository<Label> for PgTx {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Label>, StoreError> {
        let label = sqlx::query_as::<_, Label>("SELECT id, name, created_at FROM labels WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(label)
    }

    async fn find_all(&mut self) -> Result<Vec<Label>, StoreError> {
        let labels = sqlx::query_as::<_, Label>("SELECT id, name, created_at FROM labels ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(labels)
    }

    async fn insert(&mut self, draft: NewLabel) -> Result<Label, StoreError> {
        let label = sqlx::query_as::<_, Label>(
            "INSERT INTO labels (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(draft.name)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(label)
    }

    async fn save(&mut self, label: &Label) -> Result<Label, StoreError> {
        let saved = sqlx::query_as::<_, Label>(
            "UPDATE labels SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(label.id)
        .bind(&label.name)
        .fetch_optional(&mut *self.tx)
        .await?;

        saved.ok_or(StoreError::MissingRow {
            kind: EntityKind::Label,
            id: label.id,
        })
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM labels WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM labels WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(exists)
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM labels")
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn lock_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM labels WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(locked.is_some())
    }
}

#[async_trait]
impl Repository<Task> for PgTx {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(TASK_SELECT);
        qb.push(" WHERE t.id = ").push_bind(id);
        let row = qb.build().fetch_optional(&mut *self.tx).await?;

        match row {
            Some(row) => Ok(self.hydrate_tasks(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_all(&mut self) -> Result<Vec<Task>, StoreError> {
        <Self as TaskRepository>::find_all_matching(self, &TaskPredicate::Always).await
    }

    async fn insert(&mut self, draft: NewTask) -> Result<Task, StoreError> {
        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            INSERT INTO tasks (title, description, position, assignee_id, status_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.index)
        .bind(draft.assignee_id)
        .bind(draft.status.id)
        .fetch_one(&mut *self.tx)
        .await?;

        let labels = dedup_labels(draft.labels);
        self.insert_task_labels(id, &labels).await?;

        Ok(Task {
            id,
            title: draft.title,
            description: draft.description,
            index: draft.index,
            assignee_id: draft.assignee_id,
            status: draft.status,
            labels,
            created_at,
        })
    }

    async fn save(&mut self, task: &Task) -> Result<Task, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, position = $4, assignee_id = $5, status_id = $6
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.index)
        .bind(task.assignee_id)
        .bind(task.status.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow {
                kind: EntityKind::Task,
                id: task.id,
            });
        }

        let mut saved = task.clone();
        saved.set_labels(task.labels.clone());
        self.replace_task_labels(task.id, &saved.labels).await?;
        Ok(saved)
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(exists)
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks")
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl TaskRepository for PgTx {
    async fn find_all_matching(&mut self, predicate: &TaskPredicate) -> Result<Vec<Task>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(TASK_SELECT);
        if !predicate.is_always() {
            qb.push(" WHERE ");
            predicate.push_sql(&mut qb);
        }
        qb.push(" ORDER BY t.id");

        let rows = qb.build().fetch_all(&mut *self.tx).await?;
        self.hydrate_tasks(rows).await
    }

    async fn exists_by_assignee_id(&mut self, user_id: i64) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tasks WHERE assignee_id = $1)")
                .bind(user_id)
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(exists)
    }

    async fn exists_by_status_id(&mut self, status_id: i64) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tasks WHERE status_id = $1)")
                .bind(status_id)
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(exists)
    }

    async fn exists_by_labels_id(&mut self, label_id: i64) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM task_labels WHERE label_id = $1)",
        )
        .bind(label_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_select_joins_status() {
        assert!(TASK_SELECT.contains("JOIN task_statuses s ON s.id = t.status_id"));
        assert!(TASK_SELECT.contains("t.position"));
    }

    #[test]
    fn test_matching_query_shape() {
        let mut qb = QueryBuilder::<Postgres>::new(TASK_SELECT);
        qb.push(" WHERE ");
        TaskPredicate::HasLabel(4).push_sql(&mut qb);
        qb.push(" ORDER BY t.id");

        let sql = qb.sql();
        assert!(sql.contains("EXISTS (SELECT 1 FROM task_labels tl WHERE tl.task_id = t.id AND tl.label_id = $1)"));
        assert!(sql.trim_end().ends_with("ORDER BY t.id"));
    }
}
