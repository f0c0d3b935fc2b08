use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::task::{self, TaskStatus};
use models::{audit, task_dependency, validate};

use super::critical_path::{self, CriticalPath, Edge, PlanError, TaskNode};
use crate::errors::ServiceError;
use crate::projects::get_project;

#[derive(Clone, Debug, Deserialize)]
pub struct NewTask {
    pub project_id: Uuid,
    pub name: String,
    pub duration_days: i32,
    pub assignee_id: Option<Uuid>,
}

impl From<PlanError> for ServiceError {
    fn from(e: PlanError) -> Self { ServiceError::Validation(e.to_string()) }
}

pub async fn create_task(db: &DatabaseConnection, input: NewTask, actor: &str) -> Result<task::Model, ServiceError> {
    let name = validate::required_text("task name", &input.name, 200)?;
    if input.duration_days < 0 {
        return Err(ServiceError::validation("duration cannot be negative"));
    }
    get_project(db, input.project_id).await?;
    let now = audit::now();
    let created = task::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(input.project_id),
        name: Set(name),
        duration_days: Set(input.duration_days),
        status: Set(TaskStatus::Todo),
        assignee_id: Set(input.assignee_id),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(task_id = %created.id, "task_created");
    Ok(created)
}

/// Tasks of a project in creation order, which is also the tie-break order
/// of the critical path.
pub async fn list_tasks(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<task::Model>, ServiceError> {
    Ok(task::Entity::find()
        .filter(task::Column::ProjectId.eq(project_id))
        .order_by_asc(task::Column::CreatedAt)
        .order_by_asc(task::Column::Id)
        .all(db)
        .await?)
}

pub async fn update_task_status(db: &DatabaseConnection, id: Uuid, to: TaskStatus) -> Result<task::Model, ServiceError> {
    let current = find(db, id).await?;
    if !current.status.can_transition_to(to) {
        return Err(ServiceError::transition("task", current.status, to));
    }
    let mut am: task::ActiveModel = current.into();
    am.status = Set(to);
    am.updated_at = Set(audit::now());
    Ok(am.update(db).await?)
}

/// Delete a task together with every dependency that mentions it.
pub async fn delete_task(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    find(db, id).await?;
    let txn = db.begin().await?;
    task_dependency::Entity::delete_many()
        .filter(
            Condition::any()
                .add(task_dependency::Column::TaskId.eq(id))
                .add(task_dependency::Column::DependsOnTaskId.eq(id)),
        )
        .exec(&txn)
        .await?;
    task::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!(task_id = %id, "task_deleted");
    Ok(())
}

/// Record that `task_id` waits for `depends_on`. Both must be in the same
/// project and the new edge may not close a loop.
pub async fn add_dependency(db: &DatabaseConnection, task_id: Uuid, depends_on: Uuid) -> Result<task_dependency::Model, ServiceError> {
    if task_id == depends_on {
        return Err(ServiceError::validation("a task cannot depend on itself"));
    }
    let task = find(db, task_id).await?;
    let other = find(db, depends_on).await?;
    if task.project_id != other.project_id {
        return Err(ServiceError::validation("dependencies must stay within one project"));
    }
    let existing = project_edges(db, task.project_id).await?;
    let edge = Edge { task_id, depends_on };
    if existing.contains(&edge) {
        return Err(ServiceError::conflict("dependency already exists"));
    }
    if critical_path::creates_cycle(&existing, edge) {
        return Err(ServiceError::validation("dependency would create a cycle"));
    }
    let created = task_dependency::ActiveModel {
        id: Set(Uuid::new_v4()),
        task_id: Set(task_id),
        depends_on_task_id: Set(depends_on),
    }
    .insert(db)
    .await?;
    info!(task_id = %task_id, depends_on = %depends_on, "dependency_added");
    Ok(created)
}

pub async fn remove_dependency(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = task_dependency::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("dependency"));
    }
    Ok(())
}

pub async fn list_dependencies(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<task_dependency::Model>, ServiceError> {
    let ids: Vec<Uuid> = list_tasks(db, project_id).await?.into_iter().map(|t| t.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(task_dependency::Entity::find().filter(task_dependency::Column::TaskId.is_in(ids)).all(db).await?)
}

/// Critical path over the project's current tasks.
pub async fn project_critical_path(db: &DatabaseConnection, project_id: Uuid) -> Result<CriticalPath, ServiceError> {
    get_project(db, project_id).await?;
    let nodes: Vec<TaskNode> = list_tasks(db, project_id)
        .await?
        .iter()
        .map(|t| TaskNode { id: t.id, duration_days: t.duration_days })
        .collect();
    let edges = project_edges(db, project_id).await?;
    Ok(critical_path::critical_path(&nodes, &edges)?)
}

async fn project_edges(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<Edge>, ServiceError> {
    Ok(list_dependencies(db, project_id)
        .await?
        .into_iter()
        .map(|d| Edge { task_id: d.task_id, depends_on: d.depends_on_task_id })
        .collect())
}

async fn find(db: &DatabaseConnection, id: Uuid) -> Result<task::Model, ServiceError> {
    task::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("task"))
}
