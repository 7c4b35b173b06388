/// Generic CRUD orchestration
///
/// [`CrudService`] runs list, get, create, update, delete and count for any
/// entity kind, each inside one unit of work. What differs per kind lives in
/// a [`Resource`] implementation:
///
/// - which repository of the unit of work holds the entity
/// - how a create payload becomes a draft (validation, normalization,
///   reference resolution, password hashing)
/// - how an update payload is applied (through [`EntityPatcher`])
/// - how a list filter selects rows
///
/// Deletes check existence, then the [`ReferentialGuard`], then delete, all
/// before commit.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::auth::password::Argon2Encoder;
/// use taskboard_shared::models::label::CreateLabel;
/// use taskboard_shared::service::Services;
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), taskboard_shared::error::ServiceError> {
/// let services = Services::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(Argon2Encoder::with_cost(1024, 1, 1)),
/// );
///
/// let label = services.labels.create(CreateLabel { name: "bug".into() }).await?;
/// assert_eq!(services.labels.count().await?, 1);
///
/// services.labels.delete(label.id).await?;
/// assert_eq!(services.labels.count().await?, 0);
/// # Ok(())
/// # }
/// ```

use crate::auth::password::PasswordEncoder;
use crate::auth::service::AuthService;
use crate::error::ServiceError;
use crate::filter::{TaskFilter, TaskSpecification};
use crate::guard::ReferentialGuard;
use crate::models::label::{CreateLabel, Label, LabelDto, NewLabel, UpdateLabel};
use crate::models::task::{CreateTask, NewTask, Task, TaskDto, UpdateTask};
use crate::models::task_status::{
    normalize_slug, CreateTaskStatus, NewTaskStatus, TaskStatus, TaskStatusDto, UpdateTaskStatus,
};
use crate::models::user::{
    normalize_email, normalize_name, CreateUser, NewUser, UpdateUser, User, UserDto,
};
use crate::models::Entity;
use crate::patcher::{resolve_assignee, resolve_labels, resolve_status, EntityPatcher};
use crate::repository::{Repository, Store, StoreError, TaskRepository, UnitOfWork};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Per-kind behaviour plugged into [`CrudService`]
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Entity: Entity;
    type Dto: Serialize + Send + 'static;
    type Create: Send + 'static;
    type Patch: Send + 'static;
    type Filter: Send + Sync + 'static;

    /// The repository of `uow` holding this kind
    fn repository<U: UnitOfWork>(uow: &mut U) -> &mut dyn Repository<Self::Entity>;

    fn to_dto(entity: &Self::Entity) -> Self::Dto;

    /// Validates a create payload and turns it into an insertable draft
    async fn draft<U: UnitOfWork>(
        &self,
        uow: &mut U,
        input: Self::Create,
    ) -> Result<<Self::Entity as Entity>::Draft, ServiceError>;

    /// Applies an update payload to a loaded entity
    async fn patch<U: UnitOfWork>(
        &self,
        uow: &mut U,
        entity: &mut Self::Entity,
        patch: Self::Patch,
    ) -> Result<(), ServiceError>;

    /// Rows returned by `list`, ordered by id
    async fn select<U: UnitOfWork>(
        &self,
        uow: &mut U,
        _filter: &Self::Filter,
    ) -> Result<Vec<Self::Entity>, ServiceError> {
        Ok(Self::repository(uow).find_all().await?)
    }
}

pub struct UserResource {
    patcher: EntityPatcher,
}

impl UserResource {
    pub fn new(patcher: EntityPatcher) -> Self {
        Self { patcher }
    }
}

#[async_trait]
impl Resource for UserResource {
    type Entity = User;
    type Dto = UserDto;
    type Create = CreateUser;
    type Patch = UpdateUser;
    type Filter = ();

    fn repository<U: UnitOfWork>(uow: &mut U) -> &mut dyn Repository<User> {
        uow.users()
    }

    fn to_dto(user: &User) -> UserDto {
        UserDto::from(user)
    }

    /// The email is normalized before it is validated
    async fn draft<U: UnitOfWork>(&self, _uow: &mut U, input: CreateUser) -> Result<NewUser, ServiceError> {
        let input = CreateUser {
            email: normalize_email(&input.email)?,
            ..input
        };
        input.validate()?;
        let password_hash = self.patcher.encode_password(&input.password)?;

        Ok(NewUser {
            first_name: normalize_name(input.first_name),
            last_name: normalize_name(input.last_name),
            email: input.email,
            password_hash,
        })
    }

    async fn patch<U: UnitOfWork>(
        &self,
        _uow: &mut U,
        user: &mut User,
        patch: UpdateUser,
    ) -> Result<(), ServiceError> {
        self.patcher.apply_user(user, patch)
    }
}

pub struct TaskStatusResource {
    patcher: EntityPatcher,
}

impl TaskStatusResource {
    pub fn new(patcher: EntityPatcher) -> Self {
        Self { patcher }
    }
}

#[async_trait]
impl Resource for TaskStatusResource {
    type Entity = TaskStatus;
    type Dto = TaskStatusDto;
    type Create = CreateTaskStatus;
    type Patch = UpdateTaskStatus;
    type Filter = ();

    fn repository<U: UnitOfWork>(uow: &mut U) -> &mut dyn Repository<TaskStatus> {
        uow.task_statuses()
    }

    fn to_dto(status: &TaskStatus) -> TaskStatusDto {
        TaskStatusDto::from(status)
    }

    async fn draft<U: UnitOfWork>(
        &self,
        _uow: &mut U,
        input: CreateTaskStatus,
    ) -> Result<NewTaskStatus, ServiceError> {
        input.validate()?;
        Ok(NewTaskStatus {
            slug: normalize_slug(&input.slug)?,
            name: input.name,
        })
    }

    async fn patch<U: UnitOfWork>(
        &self,
        _uow: &mut U,
        status: &mut TaskStatus,
        patch: UpdateTaskStatus,
    ) -> Result<(), ServiceError> {
        self.patcher.apply_task_status(status, patch)
    }
}

pub struct LabelResource {
    patcher: EntityPatcher,
}

impl LabelResource {
    pub fn new(patcher: EntityPatcher) -> Self {
        Self { patcher }
    }
}

#[async_trait]
impl Resource for LabelResource {
    type Entity = Label;
    type Dto = LabelDto;
    type Create = CreateLabel;
    type Patch = UpdateLabel;
    type Filter = ();

    fn repository<U: UnitOfWork>(uow: &mut U) -> &mut dyn Repository<Label> {
        uow.labels()
    }

    fn to_dto(label: &Label) -> LabelDto {
        LabelDto::from(label)
    }

    async fn draft<U: UnitOfWork>(&self, _uow: &mut U, input: CreateLabel) -> Result<NewLabel, ServiceError> {
        input.validate()?;
        Ok(NewLabel { name: input.name })
    }

    async fn patch<U: UnitOfWork>(
        &self,
        _uow: &mut U,
        label: &mut Label,
        patch: UpdateLabel,
    ) -> Result<(), ServiceError> {
        self.patcher.apply_label(label, patch)
    }
}

pub struct TaskResource {
    patcher: EntityPatcher,
}

impl TaskResource {
    pub fn new(patcher: EntityPatcher) -> Self {
        Self { patcher }
    }
}

#[async_trait]
impl Resource for TaskResource {
    type Entity = Task;
    type Dto = TaskDto;
    type Create = CreateTask;
    type Patch = UpdateTask;
    type Filter = TaskFilter;

    fn repository<U: UnitOfWork>(uow: &mut U) -> &mut dyn Repository<Task> {
        uow.tasks()
    }

    fn to_dto(task: &Task) -> TaskDto {
        TaskDto::from(task)
    }

    /// Resolves status (strict), assignee (strict) and labels (lenient)
    async fn draft<U: UnitOfWork>(&self, uow: &mut U, input: CreateTask) -> Result<NewTask, ServiceError> {
        input.validate()?;
        if input.title.trim().is_empty() {
            return Err(ServiceError::invalid("title", "must not be blank"));
        }

        let status = resolve_status(uow, &input.status).await?;
        let assignee_id = resolve_assignee(uow, input.assignee_id).await?;
        let labels = resolve_labels(uow, input.task_label_ids).await?;

        Ok(NewTask {
            title: input.title,
            description: input.content,
            index: input.index,
            assignee_id,
            status,
            labels,
        })
    }

    async fn patch<U: UnitOfWork>(
        &self,
        uow: &mut U,
        task: &mut Task,
        patch: UpdateTask,
    ) -> Result<(), ServiceError> {
        self.patcher.apply_task(uow, task, patch).await
    }

    async fn select<U: UnitOfWork>(&self, uow: &mut U, filter: &TaskFilter) -> Result<Vec<Task>, ServiceError> {
        let predicate = TaskSpecification::build(filter);
        Ok(uow.tasks().find_all_matching(&predicate).await?)
    }
}

/// CRUD flow for one entity kind
pub struct CrudService<S: Store, R: Resource> {
    store: Arc<S>,
    resource: Arc<R>,
    guard: ReferentialGuard,
}

impl<S: Store, R: Resource> Clone for CrudService<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resource: Arc::clone(&self.resource),
            guard: self.guard,
        }
    }
}

impl<S: Store, R: Resource> CrudService<S, R> {
    pub fn new(store: Arc<S>, resource: R) -> Self {
        Self {
            store,
            resource: Arc::new(resource),
            guard: ReferentialGuard,
        }
    }

    pub async fn list(&self, filter: &R::Filter) -> Result<Vec<R::Dto>, ServiceError> {
        debug!(kind = %R::Entity::KIND, "Listing entities");
        let mut uow = self.store.begin().await?;
        let rows = self.resource.select(&mut uow, filter).await?;
        Ok(rows.iter().map(R::to_dto).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<R::Dto, ServiceError> {
        debug!(kind = %R::Entity::KIND, id, "Fetching entity");
        let mut uow = self.store.begin().await?;
        let entity = R::repository(&mut uow)
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(R::Entity::KIND, id))?;
        Ok(R::to_dto(&entity))
    }

    pub async fn create(&self, input: R::Create) -> Result<R::Dto, ServiceError> {
        debug!(kind = %R::Entity::KIND, "Creating entity");
        let mut uow = self.store.begin().await?;
        let draft = self.resource.draft(&mut uow, input).await?;
        let entity = R::repository(&mut uow).insert(draft).await?;
        uow.commit().await?;

        info!(kind = %R::Entity::KIND, id = entity.id(), "Entity created");
        Ok(R::to_dto(&entity))
    }

    /// Loads, patches and saves in one unit of work
    pub async fn update(&self, id: i64, patch: R::Patch) -> Result<R::Dto, ServiceError> {
        debug!(kind = %R::Entity::KIND, id, "Updating entity");
        let mut uow = self.store.begin().await?;
        let mut entity = R::repository(&mut uow)
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(R::Entity::KIND, id))?;

        self.resource.patch(&mut uow, &mut entity, patch).await?;
        let saved = R::repository(&mut uow).save(&entity).await?;
        uow.commit().await?;

        info!(kind = %R::Entity::KIND, id, "Entity updated");
        Ok(R::to_dto(&saved))
    }

    /// Deletes after the existence check and the guard
    ///
    /// The target row is locked first, so a task created concurrently cannot
    /// start referencing it between the guard query and the delete.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let kind = R::Entity::KIND;
        debug!(kind = %kind, id, "Deleting entity");
        let mut uow = self.store.begin().await?;

        if !R::repository(&mut uow).lock_by_id(id).await? {
            return Err(ServiceError::not_found(kind, id));
        }
        self.guard.ensure_can_delete(&mut uow, kind, id).await?;

        R::repository(&mut uow)
            .delete_by_id(id)
            .await
            .map_err(|err| match err {
                StoreError::ForeignKeyViolation(_) => ServiceError::referenced(kind, id),
                other => other.into(),
            })?;
        uow.commit().await?;

        info!(kind = %kind, id, "Entity deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        let mut uow = self.store.begin().await?;
        Ok(R::repository(&mut uow).count().await?)
    }
}

/// Every service the API needs, built once at startup
pub struct Services<S: Store> {
    store: Arc<S>,
    pub users: CrudService<S, UserResource>,
    pub task_statuses: CrudService<S, TaskStatusResource>,
    pub labels: CrudService<S, LabelResource>,
    pub tasks: CrudService<S, TaskResource>,
    pub auth: AuthService<S>,
}

impl<S: Store> Services<S> {
    pub fn new(store: Arc<S>, encoder: Arc<dyn PasswordEncoder>) -> Self {
        let patcher = EntityPatcher::new(Arc::clone(&encoder));

        Self {
            users: CrudService::new(Arc::clone(&store), UserResource::new(patcher.clone())),
            task_statuses: CrudService::new(
                Arc::clone(&store),
                TaskStatusResource::new(patcher.clone()),
            ),
            labels: CrudService::new(Arc::clone(&store), LabelResource::new(patcher.clone())),
            tasks: CrudService::new(Arc::clone(&store), TaskResource::new(patcher)),
            auth: AuthService::new(Arc::clone(&store), encoder),
            store,
        }
    }

    /// Store liveness, for health checks
    pub async fn ping(&self) -> Result<(), ServiceError> {
        Ok(self.store.ping().await?)
    }
}
