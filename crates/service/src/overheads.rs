use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::{audit, overhead, validate};

use crate::errors::ServiceError;
use crate::projects::get_project;

#[derive(Clone, Debug, Deserialize)]
pub struct NewOverhead {
    /// `None` books a company-wide cost.
    pub project_id: Option<Uuid>,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    pub incurred_on: NaiveDate,
}

pub async fn record_overhead(db: &DatabaseConnection, input: NewOverhead, actor: &str) -> Result<overhead::Model, ServiceError> {
    let category = validate::required_text("category", &input.category, 64)?;
    validate::positive("amount", input.amount)?;
    if let Some(project_id) = input.project_id {
        get_project(db, project_id).await?;
    }
    let am = overhead::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(input.project_id),
        category: Set(category),
        description: Set(input.description.trim().to_string()),
        amount: Set(input.amount),
        incurred_on: Set(input.incurred_on),
        created_by: Set(actor.to_string()),
        created_at: Set(audit::now()),
    };
    let created = am.insert(db).await?;
    info!(overhead_id = %created.id, amount = %created.amount, "overhead_recorded");
    Ok(created)
}

/// Overheads of one project, or the company-wide ones when `project_id` is `None`.
pub async fn list_overheads(db: &DatabaseConnection, project_id: Option<Uuid>) -> Result<Vec<overhead::Model>, ServiceError> {
    let q = match project_id {
        Some(id) => overhead::Entity::find().filter(overhead::Column::ProjectId.eq(id)),
        None => overhead::Entity::find().filter(overhead::Column::ProjectId.is_null()),
    };
    Ok(q.order_by_asc(overhead::Column::IncurredOn).all(db).await?)
}

pub async fn delete_overhead(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = overhead::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("overhead"));
    }
    Ok(())
}

pub async fn total_for_project(db: &DatabaseConnection, project_id: Uuid) -> Result<Decimal, ServiceError> {
    Ok(list_overheads(db, Some(project_id)).await?.iter().map(|o| o.amount).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, staffed_project};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn overheads_total_per_project() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let f = staffed_project(&db).await?;
        let day = f.project.start_date;
        let travel = record_overhead(&db, NewOverhead { project_id: Some(f.project.id), category: "travel".into(), description: "flights".into(), amount: dec!(1200.50), incurred_on: day }, "t").await?;
        record_overhead(&db, NewOverhead { project_id: Some(f.project.id), category: "hosting".into(), description: String::new(), amount: dec!(300), incurred_on: day }, "t").await?;
        let zero = NewOverhead { project_id: Some(f.project.id), category: "misc".into(), description: String::new(), amount: Decimal::ZERO, incurred_on: day };
        assert!(matches!(record_overhead(&db, zero, "t").await, Err(ServiceError::Validation(_))));

        assert_eq!(total_for_project(&db, f.project.id).await?, dec!(1500.50));
        delete_overhead(&db, travel.id).await?;
        assert_eq!(total_for_project(&db, f.project.id).await?, dec!(300));
        Ok(())
    }
}
