/// In-memory store
///
/// Keeps four tables in process memory behind a `tokio::sync::Mutex`. A unit
/// of work holds the mutex for its whole lifetime and edits a private view of
/// the tables; `commit` writes the view back, dropping discards it. A table is
/// copied the first time a unit of work writes to it, so reads cost nothing
/// extra but each write still copies the whole table it touches. The store
/// suits tests and small local data sets. Units of
/// work therefore run one at a time (serializable isolation), which is what
/// makes guard-then-delete atomic here.
///
/// The same integrity rules as the Postgres schema are enforced:
///
/// - unique email, status slug and label name
/// - task references to statuses, users and labels must exist
/// - users, statuses and labels referenced by a task cannot be deleted
///
/// # Example
///
/// ```
/// use taskboard_shared::models::label::NewLabel;
/// use taskboard_shared::repository::{Repository, Store, UnitOfWork};
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), taskboard_shared::repository::StoreError> {
/// let store = MemoryStore::new();
///
/// let mut uow = store.begin().await?;
/// uow.labels().insert(NewLabel { name: "bug".into() }).await?;
/// drop(uow); // rolled back
///
/// let mut uow = store.begin().await?;
/// assert_eq!(uow.labels().count().await?, 0);
/// # Ok(())
/// # }
/// ```

use super::constraints::*;
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
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Rows keyed by id, with a monotonically increasing id sequence
#[derive(Debug, Clone)]
struct Table<R> {
    rows: BTreeMap<i64, R>,
    last_id: i64,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<R: Clone> Table<R> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn get(&self, id: i64) -> Option<R> {
        self.rows.get(&id).cloned()
    }

    fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    fn all(&self) -> Vec<R> {
        self.rows.values().cloned().collect()
    }

    fn put(&mut self, id: i64, row: R) {
        self.rows.insert(id, row);
    }

    fn remove(&mut self, id: i64) -> bool {
        self.rows.remove(&id).is_some()
    }

    fn count(&self) -> i64 {
        self.rows.len() as i64
    }

    /// Fails if any row other than `except` satisfies `clash`
    fn ensure_unique<F>(&self, except: Option<i64>, constraint: &str, clash: F) -> Result<(), StoreError>
    where
        F: Fn(&R) -> bool,
    {
        let taken = self
            .rows
            .iter()
            .any(|(id, row)| Some(*id) != except && clash(row));
        if taken {
            return Err(StoreError::UniqueViolation(constraint.to_string()));
        }
        Ok(())
    }
}

/// Stored form of a task: references by id
#[derive(Debug, Clone)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    index: Option<i32>,
    assignee_id: Option<i64>,
    status_id: i64,
    label_ids: BTreeSet<i64>,
    created_at: DateTime<Utc>,
}

/// Tables are shared with the committed state until a unit of work first
/// writes to them
#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Arc<Table<User>>,
    statuses: Arc<Table<TaskStatus>>,
    labels: Arc<Table<Label>>,
    tasks: Arc<Table<TaskRow>>,
}

impl MemoryState {
    fn hydrate(&self, row: &TaskRow) -> Result<Task, StoreError> {
        let status = self.statuses.get(row.status_id).ok_or(StoreError::MissingRow {
            kind: EntityKind::TaskStatus,
            id: row.status_id,
        })?;
        let labels = row
            .label_ids
            .iter()
            .filter_map(|id| self.labels.get(*id))
            .collect();

        Ok(Task {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            index: row.index,
            assignee_id: row.assignee_id,
            status,
            labels: dedup_labels(labels),
            created_at: row.created_at,
        })
    }

    fn check_task_references(
        &self,
        status_id: i64,
        assignee_id: Option<i64>,
        label_ids: &BTreeSet<i64>,
    ) -> Result<(), StoreError> {
        if !self.statuses.contains(status_id) {
            return Err(StoreError::ForeignKeyViolation(TASKS_STATUS_FKEY.to_string()));
        }
        if let Some(user_id) = assignee_id {
            if !self.users.contains(user_id) {
                return Err(StoreError::ForeignKeyViolation(TASKS_ASSIGNEE_FKEY.to_string()));
            }
        }
        if label_ids.iter().any(|id| !self.labels.contains(*id)) {
            return Err(StoreError::ForeignKeyViolation(TASK_LABELS_LABEL_FKEY.to_string()));
        }
        Ok(())
    }

    fn any_task<F>(&self, test: F) -> bool
    where
        F: Fn(&TaskRow) -> bool,
    {
        self.tasks.rows.values().any(test)
    }
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = Working(Arc::new(StdMutex::new((*guard).clone())));
        Ok(MemoryTx {
            guard,
            users: MemoryUsers(working.clone()),
            statuses: MemoryStatuses(working.clone()),
            labels: MemoryLabels(working.clone()),
            tasks: MemoryTasks(working.clone()),
            working,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Private copy of the tables, shared by the repositories of one unit of work
#[derive(Debug, Clone)]
struct Working(Arc<StdMutex<MemoryState>>);

impl Working {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Unit of work holding the store lock until commit or drop
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: Working,
    users: MemoryUsers,
    statuses: MemoryStatuses,
    labels: MemoryLabels,
    tasks: MemoryTasks,
}

pub struct MemoryUsers(Working);

pub struct MemoryStatuses(Working);

pub struct MemoryLabels(Working);

pub struct MemoryTasks(Working);

#[async_trait]
impl UnitOfWork for MemoryTx {
    type Users = MemoryUsers;
    type Statuses = MemoryStatuses;
    type Labels = MemoryLabels;
    type Tasks = MemoryTasks;

    fn users(&mut self) -> &mut MemoryUsers {
        &mut self.users
    }

    fn task_statuses(&mut self) -> &mut MemoryStatuses {
        &mut self.statuses
    }

    fn labels(&mut self) -> &mut MemoryLabels {
        &mut self.labels
    }

    fn tasks(&mut self) -> &mut MemoryTasks {
        &mut self.tasks
    }

    async fn commit(self) -> Result<(), StoreError> {
        let MemoryTx {
            mut guard, working, ..
        } = self;
        *guard = std::mem::take(&mut *working.lock());
        debug!("Memory unit of work committed");
        Ok(())
    }
}

#[async_trait]
impl Repository<User> for MemoryUsers {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.0.lock().users.get(id))
    }

    async fn find_all(&mut self) -> Result<Vec<User>, StoreError> {
        Ok(self.0.lock().users.all())
    }

    async fn insert(&mut self, draft: NewUser) -> Result<User, StoreError> {
        let mut state = self.0.lock();
        let users = Arc::make_mut(&mut state.users);
        users.ensure_unique(None, USERS_EMAIL_KEY, |u| u.email == draft.email)?;

        let now = Utc::now();
        let user = User {
            id: users.next_id(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            password_hash: draft.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.put(user.id, user.clone());
        Ok(user)
    }

    async fn save(&mut self, user: &User) -> Result<User, StoreError> {
        let mut state = self.0.lock();
        let users = Arc::make_mut(&mut state.users);
        if !users.contains(user.id) {
            return Err(StoreError::MissingRow {
                kind: EntityKind::User,
                id: user.id,
            });
        }
        users.ensure_unique(Some(user.id), USERS_EMAIL_KEY, |u| u.email == user.email)?;

        let mut stored = user.clone();
        stored.updated_at = Utc::now();
        users.put(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.0.lock();
        if state.any_task(|t| t.assignee_id == Some(id)) {
            return Err(StoreError::ForeignKeyViolation(TASKS_ASSIGNEE_FKEY.to_string()));
        }
        Ok(Arc::make_mut(&mut state.users).remove(id))
    }

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self.0.lock().users.contains(id))
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        Ok(self.0.lock().users.count())
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.0.lock();
        Ok(state.users.rows.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl Repository<TaskStatus> for MemoryStatuses {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<TaskStatus>, StoreError> {
        Ok(self.0.lock().statuses.get(id))
    }

    async fn find_all(&mut self) -> Result<Vec<TaskStatus>, StoreError> {
        Ok(self.0.lock().statuses.all())
    }

    async fn insert(&mut self, draft: NewTaskStatus) -> Result<TaskStatus, StoreError> {
        let mut state = self.0.lock();
        let statuses = Arc::make_mut(&mut state.statuses);
        statuses.ensure_unique(None, TASK_STATUSES_SLUG_KEY, |s| s.slug == draft.slug)?;

        let status = TaskStatus {
            id: statuses.next_id(),
            name: draft.name,
            slug: draft.slug,
            created_at: Utc::now(),
        };
        statuses.put(status.id, status.clone());
        Ok(status)
    }

    async fn save(&mut self, status: &TaskStatus) -> Result<TaskStatus, StoreError> {
        let mut state = self.0.lock();
        let statuses = Arc::make_mut(&mut state.statuses);
        if !statuses.contains(status.id) {
            return Err(StoreError::MissingRow {
                kind: EntityKind::TaskStatus,
                id: status.id,
            });
        }
        statuses.ensure_unique(Some(status.id), TASK_STATUSES_SLUG_KEY, |s| s.slug == status.slug)?;
        statuses.put(status.id, status.clone());
        Ok(status.clone())
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.0.lock();
        if state.any_task(|t| t.status_id == id) {
            return Err(StoreError::ForeignKeyViolation(TASKS_STATUS_FKEY.to_string()));
        }
        Ok(Arc::make_mut(&mut state.statuses).remove(id))
    }

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self.0.lock().statuses.contains(id))
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        Ok(self.0.lock().statuses.count())
    }
}

#[async_trait]
impl TaskStatusRepository for MemoryStatuses {
    async fn find_by_slug(&mut self, slug: &str) -> Result<Option<TaskStatus>, StoreError> {
        let state = self.0.lock();
        Ok(state.statuses.rows.values().find(|s| s.slug == slug).cloned())
    }
}

#[async_trait]
impl Repository<Label> for MemoryLabels {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Label>, StoreError> {
        Ok(self.0.lock().labels.get(id))
    }

    async fn find_all(&mut self) -> Result<Vec<Label>, StoreError> {
        Ok(self.0.lock().labels.all())
    }

    async fn insert(&mut self, draft: NewLabel) -> Result<Label, StoreError> {
        let mut state = self.0.lock();
        let labels = Arc::make_mut(&mut state.labels);
        labels.ensure_unique(None, LABELS_NAME_KEY, |l| l.name == draft.name)?;

        let label = Label {
            id: labels.next_id(),
            name: draft.name,
            created_at: Utc::now(),
        };
        labels.put(label.id, label.clone());
        Ok(label)
    }

    async fn save(&mut self, label: &Label) -> Result<Label, StoreError> {
        let mut state = self.0.lock();
        let labels = Arc::make_mut(&mut state.labels);
        if !labels.contains(label.id) {
            return Err(StoreError::MissingRow {
                kind: EntityKind::Label,
                id: label.id,
            });
        }
        labels.ensure_unique(Some(label.id), LABELS_NAME_KEY, |l| l.name == label.name)?;
        labels.put(label.id, label.clone());
        Ok(label.clone())
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.0.lock();
        if state.any_task(|t| t.label_ids.contains(&id)) {
            return Err(StoreError::ForeignKeyViolation(TASK_LABELS_LABEL_FKEY.to_string()));
        }
        Ok(Arc::make_mut(&mut state.labels).remove(id))
    }

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self.0.lock().labels.contains(id))
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        Ok(self.0.lock().labels.count())
    }
}

#[async_trait]
impl Repository<Task> for MemoryTasks {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        let state = self.0.lock();
        match state.tasks.rows.get(&id) {
            Some(row) => Ok(Some(state.hydrate(row)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&mut self) -> Result<Vec<Task>, StoreError> {
        let state = self.0.lock();
        state.tasks.rows.values().map(|row| state.hydrate(row)).collect()
    }

    async fn insert(&mut self, draft: NewTask) -> Result<Task, StoreError> {
        let mut state = self.0.lock();
        let label_ids: BTreeSet<i64> = draft.labels.iter().map(|l| l.id).collect();
        state.check_task_references(draft.status.id, draft.assignee_id, &label_ids)?;

        let row = TaskRow {
            id: Arc::make_mut(&mut state.tasks).next_id(),
            title: draft.title,
            description: draft.description,
            index: draft.index,
            assignee_id: draft.assignee_id,
            status_id: draft.status.id,
            label_ids,
            created_at: Utc::now(),
        };
        let task = state.hydrate(&row)?;
        Arc::make_mut(&mut state.tasks).put(row.id, row);
        Ok(task)
    }

    async fn save(&mut self, task: &Task) -> Result<Task, StoreError> {
        let mut state = self.0.lock();
        if !state.tasks.contains(task.id) {
            return Err(StoreError::MissingRow {
                kind: EntityKind::Task,
                id: task.id,
            });
        }
        let label_ids: BTreeSet<i64> = task.labels.iter().map(|l| l.id).collect();
        state.check_task_references(task.status.id, task.assignee_id, &label_ids)?;

        let row = TaskRow {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            index: task.index,
            assignee_id: task.assignee_id,
            status_id: task.status.id,
            label_ids,
            created_at: task.created_at,
        };
        let saved = state.hydrate(&row)?;
        Arc::make_mut(&mut state.tasks).put(row.id, row);
        Ok(saved)
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(Arc::make_mut(&mut self.0.lock().tasks).remove(id))
    }

    async fn exists_by_id(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self.0.lock().tasks.contains(id))
    }

    async fn count(&mut self) -> Result<i64, StoreError> {
        Ok(self.0.lock().tasks.count())
    }
}

#[async_trait]
impl TaskRepository for MemoryTasks {
    async fn find_all_matching(&mut self, predicate: &TaskPredicate) -> Result<Vec<Task>, StoreError> {
        let state = self.0.lock();
        let mut matching = Vec::new();
        for row in state.tasks.rows.values() {
            let task = state.hydrate(row)?;
            if predicate.matches(&task) {
                matching.push(task);
            }
        }
        Ok(matching)
    }

    async fn exists_by_assignee_id(&mut self, user_id: i64) -> Result<bool, StoreError> {
        Ok(self.0.lock().any_task(|t| t.assignee_id == Some(user_id)))
    }

    async fn exists_by_status_id(&mut self, status_id: i64) -> Result<bool, StoreError> {
        Ok(self.0.lock().any_task(|t| t.status_id == status_id))
    }

    async fn exists_by_labels_id(&mut self, label_id: i64) -> Result<bool, StoreError> {
        Ok(self.0.lock().any_task(|t| t.label_ids.contains(&label_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_status(store: &MemoryStore, slug: &str) -> TaskStatus {
        let mut uow = store.begin().await.unwrap();
        let status = uow
            .task_statuses()
            .insert(NewTaskStatus {
                name: slug.to_uppercase(),
                slug: slug.to_string(),
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        status
    }

    fn new_task(title: &str, status: &TaskStatus, labels: Vec<Label>) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            index: None,
            assignee_id: None,
            status: status.clone(),
            labels,
        }
    }

    #[tokio::test]
    async fn test_commit_makes_changes_visible() {
        let store = MemoryStore::new();
        let status = seed_status(&store, "draft").await;

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.task_statuses().find_by_slug("draft").await.unwrap(), Some(status));
        assert_eq!(uow.task_statuses().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.labels()
                .insert(NewLabel {
                    name: "bug".to_string(),
                })
                .await
                .unwrap();
        }
        let mut uow = store.begin().await.unwrap();
        assert!(uow.labels().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tables_are_copied_only_when_written() {
        let store = MemoryStore::new();
        seed_status(&store, "draft").await;
        let before = store.state.lock().await.clone();

        let mut uow = store.begin().await.unwrap();
        uow.task_statuses().find_all().await.unwrap();
        uow.users().count().await.unwrap();
        uow.labels()
            .insert(NewLabel {
                name: "bug".to_string(),
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let after = store.state.lock().await.clone();
        assert!(Arc::ptr_eq(&before.statuses, &after.statuses));
        assert!(Arc::ptr_eq(&before.users, &after.users));
        assert!(Arc::ptr_eq(&before.tasks, &after.tasks));
        assert!(!Arc::ptr_eq(&before.labels, &after.labels));
        assert_eq!(after.labels.count(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_table() {
        let store = MemoryStore::new();
        let first = seed_status(&store, "a").await;
        let second = seed_status(&store, "b").await;
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_unique_slug() {
        let store = MemoryStore::new();
        seed_status(&store, "draft").await;

        let mut uow = store.begin().await.unwrap();
        let err = uow
            .task_statuses()
            .insert(NewTaskStatus {
                name: "Other".to_string(),
                slug: "draft".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(ref c) if c == TASK_STATUSES_SLUG_KEY));
    }

    #[tokio::test]
    async fn test_unique_email_on_save() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let draft = |email: &str| NewUser {
            first_name: String::new(),
            last_name: String::new(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        };
        uow.users().insert(draft("a@example.com")).await.unwrap();
        let mut b = uow.users().insert(draft("b@example.com")).await.unwrap();

        b.email = "a@example.com".to_string();
        let err = uow.users().save(&b).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_task_hydration_and_restrict() {
        let store = MemoryStore::new();
        let status = seed_status(&store, "draft").await;

        let mut uow = store.begin().await.unwrap();
        let label = uow
            .labels()
            .insert(NewLabel {
                name: "feature".to_string(),
            })
            .await
            .unwrap();
        let task = uow
            .tasks()
            .insert(new_task("Ship it", &status, vec![label.clone(), label.clone()]))
            .await
            .unwrap();

        assert_eq!(task.status.slug, "draft");
        assert_eq!(task.label_ids(), vec![label.id]);

        let err = uow.labels().delete_by_id(label.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

        let err = uow.task_statuses().delete_by_id(status.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

        assert!(uow.tasks().delete_by_id(task.id).await.unwrap());
        assert!(uow.labels().delete_by_id(label.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_rejects_dangling_references() {
        let store = MemoryStore::new();
        let status = seed_status(&store, "draft").await;

        let mut uow = store.begin().await.unwrap();
        let mut draft = new_task("t", &status, vec![]);
        draft.assignee_id = Some(42);
        let err = uow.tasks().insert(draft).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(ref c) if c == TASKS_ASSIGNEE_FKEY));
    }

    #[tokio::test]
    async fn test_find_all_matching_and_exists() {
        let store = MemoryStore::new();
        let draft_status = seed_status(&store, "draft").await;
        let done_status = seed_status(&store, "done").await;

        let mut uow = store.begin().await.unwrap();
        uow.tasks()
            .insert(new_task("Review PR", &draft_status, vec![]))
            .await
            .unwrap();
        uow.tasks()
            .insert(new_task("Deploy", &done_status, vec![]))
            .await
            .unwrap();

        let found = uow
            .tasks()
            .find_all_matching(&TaskPredicate::StatusIs("done".to_string()))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Deploy");

        assert!(uow.tasks().exists_by_status_id(draft_status.id).await.unwrap());
        assert!(!uow.tasks().exists_by_labels_id(1).await.unwrap());
        assert!(!uow.tasks().exists_by_assignee_id(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_missing_row() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let ghost = Label {
            id: 99,
            name: "ghost".to_string(),
            created_at: Utc::now(),
        };
        let err = uow.labels().save(&ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingRow { kind: EntityKind::Label, id: 99 }));
    }
}
