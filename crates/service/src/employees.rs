use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use common::pagination::Pagination;
use models::actual_assignment::{self, AssignmentStatus};
use models::employee::{self, NewEmployee};
use models::{audit, validate};

use crate::audit::{check_version, update_versioned};
use crate::errors::ServiceError;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EmployeePatch {
    pub expected_version: i32,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub designation: Option<String>,
    pub monthly_salary: Option<Decimal>,
    pub monthly_incentive: Option<Decimal>,
    pub monthly_commission_share: Option<Decimal>,
    pub billing_rate: Option<Decimal>,
}

/// Cost of one working hour given the configured hours in a month.
pub fn hourly_cost(e: &employee::Model, standard_hours_per_month: Decimal) -> Decimal {
    if standard_hours_per_month.is_zero() {
        return Decimal::ZERO;
    }
    e.monthly_cost() / standard_hours_per_month
}

pub async fn create_employee(db: &DatabaseConnection, input: NewEmployee, actor: &str) -> Result<employee::Model, ServiceError> {
    let created = employee::create(db, input, actor).await?;
    info!(employee_id = %created.id, code = %created.code, "employee_created");
    Ok(created)
}

pub async fn get_employee(db: &DatabaseConnection, id: Uuid) -> Result<employee::Model, ServiceError> {
    employee::Entity::find_by_id(id)
        .filter(employee::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("employee"))
}

pub async fn list_employees(db: &DatabaseConnection, paging: Pagination) -> Result<Vec<employee::Model>, ServiceError> {
    let (page, per_page) = paging.normalize();
    Ok(employee::Entity::find()
        .filter(employee::Column::IsDeleted.eq(false))
        .order_by_asc(employee::Column::Code)
        .paginate(db, per_page)
        .fetch_page(page)
        .await?)
}

pub async fn update_employee(db: &DatabaseConnection, id: Uuid, patch: EmployeePatch) -> Result<employee::Model, ServiceError> {
    let current = get_employee(db, id).await?;
    check_version("employee", patch.expected_version, current.row_version)?;
    employee::validate_compensation(
        patch.monthly_salary.unwrap_or(current.monthly_salary),
        patch.monthly_incentive.unwrap_or(current.monthly_incentive),
        patch.monthly_commission_share.unwrap_or(current.monthly_commission_share),
        patch.billing_rate.unwrap_or(current.billing_rate),
    )?;

    let version = current.row_version;
    let mut am: employee::ActiveModel = current.into();
    if let Some(name) = patch.full_name {
        am.full_name = Set(validate::required_text("full name", &name, 200)?);
    }
    if let Some(email) = patch.email {
        am.email = Set(validate::email(&email)?);
    }
    if let Some(designation) = patch.designation {
        am.designation = Set(designation.trim().to_string());
    }
    if let Some(v) = patch.monthly_salary {
        am.monthly_salary = Set(v);
    }
    if let Some(v) = patch.monthly_incentive {
        am.monthly_incentive = Set(v);
    }
    if let Some(v) = patch.monthly_commission_share {
        am.monthly_commission_share = Set(v);
    }
    if let Some(v) = patch.billing_rate {
        am.billing_rate = Set(v);
    }
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, employee::Column::RowVersion, version).await
}

/// Soft delete; refused while the employee is on an active assignment.
pub async fn soft_delete_employee(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let current = get_employee(db, id).await?;
    let active = actual_assignment::Entity::find()
        .filter(actual_assignment::Column::EmployeeId.eq(id))
        .filter(actual_assignment::Column::Status.eq(AssignmentStatus::Active))
        .count(db)
        .await?;
    if active > 0 {
        return Err(ServiceError::conflict("employee has active assignments"));
    }
    let version = current.row_version;
    let mut am: employee::ActiveModel = current.into();
    am.is_deleted = Set(true);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, employee::Column::RowVersion, version).await?;
    info!(employee_id = %id, "employee_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, unique};
    use rust_decimal_macros::dec;

    fn sample(code: &str) -> NewEmployee {
        NewEmployee {
            code: code.into(),
            full_name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            designation: "Architect".into(),
            monthly_salary: dec!(12000),
            monthly_incentive: dec!(2000),
            monthly_commission_share: dec!(2000),
            billing_rate: dec!(150),
        }
    }

    #[test]
    fn hourly_cost_uses_standard_month() {
        let now = audit::now();
        let e = employee::Model {
            id: Uuid::new_v4(),
            code: "E1".into(),
            full_name: "x".into(),
            email: "x@y".into(),
            designation: String::new(),
            monthly_salary: dec!(12000),
            monthly_incentive: dec!(2000),
            monthly_commission_share: dec!(2000),
            billing_rate: dec!(150),
            created_by: "t".into(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            row_version: 1,
        };
        assert_eq!(hourly_cost(&e, dec!(160)), dec!(100));
        assert_eq!(hourly_cost(&e, Decimal::ZERO), Decimal::ZERO);
    }

    #[tokio::test]
    async fn employee_crud_service() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let code = unique("emp");
        let e = create_employee(&db, sample(&code), "t").await?;
        assert_eq!(e.monthly_cost(), dec!(16000));

        // code is unique
        assert!(matches!(create_employee(&db, sample(&code), "t").await, Err(ServiceError::Conflict(_))));

        let bad = EmployeePatch { expected_version: e.row_version, monthly_salary: Some(dec!(-1)), ..Default::default() };
        assert!(matches!(update_employee(&db, e.id, bad).await, Err(ServiceError::Validation(_))));

        let patch = EmployeePatch { expected_version: e.row_version, billing_rate: Some(dec!(175)), ..Default::default() };
        let updated = update_employee(&db, e.id, patch).await?;
        assert_eq!(updated.billing_rate, dec!(175));

        soft_delete_employee(&db, e.id).await?;
        assert!(get_employee(&db, e.id).await.is_err());
        Ok(())
    }
}
