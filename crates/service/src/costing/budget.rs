use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::budget_line::{self, BudgetCategory};
use models::{audit, validate};

use crate::audit::{check_version, update_versioned};
use crate::errors::ServiceError;
use crate::projects::get_project;

#[derive(Clone, Debug, Deserialize)]
pub struct NewBudgetLine {
    pub project_id: Uuid,
    pub category: BudgetCategory,
    pub planned_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BudgetLinePatch {
    pub expected_version: i32,
    pub planned_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// One line per project and category.
pub async fn create_budget_line(db: &DatabaseConnection, input: NewBudgetLine, actor: &str) -> Result<budget_line::Model, ServiceError> {
    validate::non_negative("planned_amount", input.planned_amount)?;
    get_project(db, input.project_id).await?;
    let exists = budget_line::Entity::find()
        .filter(budget_line::Column::ProjectId.eq(input.project_id))
        .filter(budget_line::Column::Category.eq(input.category))
        .one(db)
        .await?;
    if exists.is_some() {
        return Err(ServiceError::conflict(format!("project already has a {:?} budget line", input.category)));
    }
    let now = audit::now();
    let am = budget_line::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(input.project_id),
        category: Set(input.category),
        planned_amount: Set(input.planned_amount),
        notes: Set(input.notes.filter(|n| !n.trim().is_empty())),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        row_version: Set(audit::INITIAL_VERSION),
    };
    let created = am.insert(db).await?;
    info!(budget_line_id = %created.id, category = ?created.category, "budget_line_created");
    Ok(created)
}

pub async fn list_budget_lines(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<budget_line::Model>, ServiceError> {
    let mut lines = budget_line::Entity::find()
        .filter(budget_line::Column::ProjectId.eq(project_id))
        .order_by_asc(budget_line::Column::CreatedAt)
        .all(db)
        .await?;
    lines.sort_by_key(|l| l.category);
    Ok(lines)
}

pub async fn update_budget_line(db: &DatabaseConnection, id: Uuid, patch: BudgetLinePatch) -> Result<budget_line::Model, ServiceError> {
    let current = budget_line::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("budget line"))?;
    check_version("budget line", patch.expected_version, current.row_version)?;
    let version = current.row_version;
    let mut am: budget_line::ActiveModel = current.into();
    if let Some(amount) = patch.planned_amount {
        validate::non_negative("planned_amount", amount)?;
        am.planned_amount = Set(amount);
    }
    if let Some(notes) = patch.notes {
        am.notes = Set(Some(notes).filter(|n| !n.trim().is_empty()));
    }
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, budget_line::Column::RowVersion, version).await
}

pub async fn delete_budget_line(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = budget_line::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("budget line"));
    }
    Ok(())
}
