/// Storage contract consumed by the engine
///
/// The engine never talks to a database directly. It opens a unit of work on
/// a [`Store`], reaches the per-kind repositories through it, and commits.
/// Dropping a unit of work without committing discards its changes.
///
/// # Layout
///
/// - [`Repository<E>`]: operations every entity kind supports
/// - [`UserRepository`], [`TaskStatusRepository`], [`TaskRepository`]: kind-specific
///   lookups (by email, by slug, by predicate and by foreign key)
/// - [`UnitOfWork`]: one transaction, exposing the four repositories
/// - [`Store`]: opens units of work
///
/// # Example
///
/// ```
/// use taskboard_shared::models::task_status::NewTaskStatus;
/// use taskboard_shared::repository::{Repository, Store, TaskStatusRepository, UnitOfWork};
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), taskboard_shared::repository::StoreError> {
/// let store = MemoryStore::new();
///
/// let mut uow = store.begin().await?;
/// let status = uow
///     .task_statuses()
///     .insert(NewTaskStatus { name: "Draft".into(), slug: "draft".into() })
///     .await?;
/// uow.commit().await?;
///
/// let mut uow = store.begin().await?;
/// let found = uow.task_statuses().find_by_slug("draft").await?;
/// assert_eq!(found, Some(status));
/// # Ok(())
/// # }
/// ```

use crate::filter::TaskPredicate;
use crate::models::label::Label;
use crate::models::task::Task;
use crate::models::task_status::TaskStatus;
use crate::models::user::User;
use crate::models::{Entity, EntityKind};
use async_trait::async_trait;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint rejected the write or delete
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// The row to update disappeared
    #[error("{kind} with id {id} does not exist")]
    MissingRow { kind: EntityKind, id: i64 },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return StoreError::UniqueViolation(constraint),
                Some(FOREIGN_KEY_VIOLATION) => return StoreError::ForeignKeyViolation(constraint),
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Operations shared by all entity kinds
#[async_trait]
pub trait Repository<E: Entity>: Send {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<E>, StoreError>;

    /// All rows, ordered by id
    async fn find_all(&mut self) -> Result<Vec<E>, StoreError>;

    /// Inserts a draft and returns the stored entity with its new id
    async fn insert(&mut self, draft: E::Draft) -> Result<E, StoreError>;

    /// Overwrites the stored row with `entity`'s current state
    async fn save(&mut self, entity: &E) -> Result<E, StoreError>;

    /// Returns whether a row was removed
    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError>;

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError>;

    async fn count(&mut self) -> Result<i64, StoreError>;

    /// Checks existence and holds the row against concurrent writers until
    /// the unit of work ends
    async fn lock_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        self.exists_by_id(id).await
    }
}

#[async_trait]
pub trait UserRepository: Repository<User> {
    /// Looks up a user by normalized email
    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait TaskStatusRepository: Repository<TaskStatus> {
    async fn find_by_slug(&mut self, slug: &str) -> Result<Option<TaskStatus>, StoreError>;
}

#[async_trait]
pub trait TaskRepository: Repository<Task> {
    /// Tasks satisfying `predicate`, ordered by id, each at most once
    async fn find_all_matching(&mut self, predicate: &TaskPredicate) -> Result<Vec<Task>, StoreError>;

    async fn exists_by_assignee_id(&mut self, user_id: i64) -> Result<bool, StoreError>;

    async fn exists_by_status_id(&mut self, status_id: i64) -> Result<bool, StoreError>;

    async fn exists_by_labels_id(&mut self, label_id: i64) -> Result<bool, StoreError>;
}

/// One atomic unit of work over all four repositories
#[async_trait]
pub trait UnitOfWork: Send + Sized + 'static {
    type Users: UserRepository + 'static;
    type Statuses: TaskStatusRepository + 'static;
    type Labels: Repository<Label> + 'static;
    type Tasks: TaskRepository + 'static;

    fn users(&mut self) -> &mut Self::Users;

    fn task_statuses(&mut self) -> &mut Self::Statuses;

    fn labels(&mut self) -> &mut Self::Labels;

    fn tasks(&mut self) -> &mut Self::Tasks;

    /// Makes every change of this unit of work visible at once
    async fn commit(self) -> Result<(), StoreError>;
}

/// Entry point to a storage backend
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Cheap liveness probe
    async fn ping(&self) -> Result<(), StoreError>;
}
