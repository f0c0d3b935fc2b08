use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::Pagination;
use models::project::{self, ProjectStatus};
use models::{audit, validate};

use crate::audit::{check_version, update_versioned};
use crate::clients::get_client;
use crate::errors::ServiceError;

#[derive(Clone, Debug, Deserialize)]
pub struct NewProject {
    pub client_id: Uuid,
    pub code: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub budget_amount: Decimal,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectPatch {
    pub expected_version: i32,
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_amount: Option<Decimal>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub client_id: Option<Uuid>,
    pub status: Option<ProjectStatus>,
}

/// Create a project in `Draft` for an existing client.
pub async fn create_project(db: &DatabaseConnection, input: NewProject, actor: &str) -> Result<project::Model, ServiceError> {
    let code = project::validate_code(&input.code)?;
    let name = project::validate_name(&input.name)?;
    validate::date_range(input.start_date, input.end_date)?;
    validate::non_negative("budget_amount", input.budget_amount)?;
    get_client(db, input.client_id).await?;

    let now = audit::now();
    let am = project::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(input.client_id),
        code: Set(code),
        name: Set(name),
        status: Set(ProjectStatus::Draft),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        budget_amount: Set(input.budget_amount),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        is_deleted: Set(false),
        row_version: Set(audit::INITIAL_VERSION),
    };
    let created = am.insert(db).await?;
    info!(project_id = %created.id, code = %created.code, "project_created");
    Ok(created)
}

pub async fn get_project(db: &DatabaseConnection, id: Uuid) -> Result<project::Model, ServiceError> {
    project::Entity::find_by_id(id)
        .filter(project::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("project"))
}

pub async fn list_projects(db: &DatabaseConnection, filter: ProjectFilter, paging: Pagination) -> Result<Vec<project::Model>, ServiceError> {
    let (page, per_page) = paging.normalize();
    let mut q = project::Entity::find().filter(project::Column::IsDeleted.eq(false));
    if let Some(client_id) = filter.client_id {
        q = q.filter(project::Column::ClientId.eq(client_id));
    }
    if let Some(status) = filter.status {
        q = q.filter(project::Column::Status.eq(status));
    }
    Ok(q.order_by_asc(project::Column::Code).paginate(db, per_page).fetch_page(page).await?)
}

pub async fn update_project(db: &DatabaseConnection, id: Uuid, patch: ProjectPatch) -> Result<project::Model, ServiceError> {
    let current = get_project(db, id).await?;
    check_version("project", patch.expected_version, current.row_version)?;
    let start = patch.start_date.unwrap_or(current.start_date);
    let end = patch.end_date.unwrap_or(current.end_date);
    validate::date_range(start, end)?;

    let version = current.row_version;
    let mut am: project::ActiveModel = current.into();
    if let Some(name) = patch.name {
        am.name = Set(project::validate_name(&name)?);
    }
    if let Some(budget) = patch.budget_amount {
        validate::non_negative("budget_amount", budget)?;
        am.budget_amount = Set(budget);
    }
    am.start_date = Set(start);
    am.end_date = Set(end);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, project::Column::RowVersion, version).await
}

/// Move a project through its lifecycle.
#[instrument(skip(db))]
pub async fn change_project_status(
    db: &DatabaseConnection,
    id: Uuid,
    expected_version: i32,
    to: ProjectStatus,
) -> Result<project::Model, ServiceError> {
    let current = get_project(db, id).await?;
    check_version("project", expected_version, current.row_version)?;
    if !current.status.can_transition_to(to) {
        return Err(ServiceError::transition("project", current.status, to));
    }
    let from = current.status;
    let version = current.row_version;
    let mut am: project::ActiveModel = current.into();
    am.status = Set(to);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let updated = update_versioned(db, am, project::Column::RowVersion, version).await?;
    info!(project_id = %id, ?from, ?to, "project_status_changed");
    Ok(updated)
}

/// Only projects that never ran (or were called off) can be removed.
pub async fn soft_delete_project(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let current = get_project(db, id).await?;
    if !matches!(current.status, ProjectStatus::Draft | ProjectStatus::Cancelled) {
        return Err(ServiceError::InvalidState(format!("a {:?} project cannot be deleted", current.status)));
    }
    let version = current.row_version;
    let mut am: project::ActiveModel = current.into();
    am.is_deleted = Set(true);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, project::Column::RowVersion, version).await?;
    info!(project_id = %id, "project_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{create_client, soft_delete_client};
    use crate::test_support::{get_db, unique};
    use models::client::NewClient;
    use rust_decimal_macros::dec;

    async fn count_projects(db: &DatabaseConnection, client_id: Uuid) -> Result<u64, ServiceError> {
        Ok(project::Entity::find()
            .filter(project::Column::ClientId.eq(client_id))
            .filter(project::Column::IsDeleted.eq(false))
            .count(db)
            .await?)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

    #[tokio::test]
    async fn project_lifecycle() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let c = create_client(&db, NewClient { name: "Lifecycle Ltd".into(), ..Default::default() }, "t").await?;
        let code = unique("prj");
        let p = create_project(
            &db,
            NewProject { client_id: c.id, code: code.to_lowercase(), name: "Portal".into(), start_date: d(2025, 1, 1), end_date: d(2025, 6, 30), budget_amount: dec!(50000) },
            "t",
        )
        .await?;
        assert_eq!(p.code, code);
        assert_eq!(p.status, ProjectStatus::Draft);

        let p = change_project_status(&db, p.id, p.row_version, ProjectStatus::Active).await?;
        let err = change_project_status(&db, p.id, p.row_version, ProjectStatus::Draft).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // running project blocks both deletes
        assert!(matches!(soft_delete_client(&db, c.id).await, Err(ServiceError::Conflict(_))));
        assert!(soft_delete_project(&db, p.id).await.is_err());

        let p = change_project_status(&db, p.id, p.row_version, ProjectStatus::Cancelled).await?;
        soft_delete_project(&db, p.id).await?;
        soft_delete_client(&db, c.id).await?;
        assert_eq!(count_projects(&db, c.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn inverted_dates_rejected() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let c = create_client(&db, NewClient { name: "Dates Inc".into(), ..Default::default() }, "t").await?;
        let input = NewProject { client_id: c.id, code: unique("bad"), name: "Backwards".into(), start_date: d(2025, 6, 1), end_date: d(2025, 1, 1), budget_amount: Decimal::ZERO };
        assert!(matches!(create_project(&db, input, "t").await, Err(ServiceError::Validation(_))));
        Ok(())
    }
}
