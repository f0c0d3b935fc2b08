use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use models::budget_line::BudgetCategory;
use models::time_entry::TimeEntryStatus;
use models::vendor_invoice::VendorInvoiceStatus;
use models::{employee, planned_team_slot, purchase_order, time_entry, vendor_invoice};

use super::budget::list_budget_lines;
use super::variance::{labor_cost, Variance};
use crate::employees::hourly_cost;
use crate::overheads::total_for_project;
use crate::errors::ServiceError;
use crate::projects::get_project;
use crate::staffing::allocation::slot_budget_cost;

#[derive(Clone, Debug, Serialize)]
pub struct LaborVariance {
    pub project_id: Uuid,
    pub approved_hours: Decimal,
    #[serde(flatten)]
    pub amounts: Variance,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoryCost {
    pub category: BudgetCategory,
    #[serde(flatten)]
    pub amounts: Variance,
}

#[derive(Clone, Debug, Serialize)]
pub struct CostReport {
    pub project_id: Uuid,
    pub project_budget: Decimal,
    pub categories: Vec<CategoryCost>,
    pub total: Variance,
}

/// Planned labor (Σ slot budget costs) against the cost of approved hours.
pub async fn labor_variance(db: &DatabaseConnection, project_id: Uuid, standard_hours_per_month: Decimal) -> Result<LaborVariance, ServiceError> {
    get_project(db, project_id).await?;
    let planned = planned_labor(db, project_id).await?;
    let (hours, actual) = actual_labor(db, project_id, standard_hours_per_month).await?;
    Ok(LaborVariance { project_id, approved_hours: hours, amounts: Variance::new(planned, actual) })
}

/// Planned against actual for every budget category.
///
/// Labor falls back to the slot plan when the project has no labor line.
pub async fn project_cost_report(db: &DatabaseConnection, project_id: Uuid, standard_hours_per_month: Decimal) -> Result<CostReport, ServiceError> {
    let project = get_project(db, project_id).await?;
    let lines: HashMap<BudgetCategory, Decimal> =
        list_budget_lines(db, project_id).await?.into_iter().map(|l| (l.category, l.planned_amount)).collect();

    let planned_labor = match lines.get(&BudgetCategory::Labor) {
        Some(amount) => *amount,
        None => planned_labor(db, project_id).await?,
    };
    let (_, actual_labor) = actual_labor(db, project_id, standard_hours_per_month).await?;
    let actual_overhead = total_for_project(db, project_id).await?;
    let actual_procurement = accepted_vendor_spend(db, project_id).await?;

    let planned = |c: BudgetCategory| lines.get(&c).copied().unwrap_or_default();
    let categories = vec![
        CategoryCost { category: BudgetCategory::Labor, amounts: Variance::new(planned_labor, actual_labor) },
        CategoryCost { category: BudgetCategory::Overhead, amounts: Variance::new(planned(BudgetCategory::Overhead), actual_overhead) },
        CategoryCost { category: BudgetCategory::Procurement, amounts: Variance::new(planned(BudgetCategory::Procurement), actual_procurement) },
        CategoryCost { category: BudgetCategory::Other, amounts: Variance::new(planned(BudgetCategory::Other), Decimal::ZERO) },
    ];
    let total = Variance::new(
        categories.iter().map(|c| c.amounts.planned).sum(),
        categories.iter().map(|c| c.amounts.actual).sum(),
    );
    Ok(CostReport { project_id, project_budget: project.budget_amount, categories, total })
}

async fn planned_labor(db: &DatabaseConnection, project_id: Uuid) -> Result<Decimal, ServiceError> {
    let slots = planned_team_slot::Entity::find()
        .filter(planned_team_slot::Column::ProjectId.eq(project_id))
        .all(db)
        .await?;
    Ok(slots.iter().map(slot_budget_cost).sum())
}

/// Approved (or invoiced) hours and their cost at each employee's hourly cost.
async fn actual_labor(db: &DatabaseConnection, project_id: Uuid, standard_hours_per_month: Decimal) -> Result<(Decimal, Decimal), ServiceError> {
    let entries = time_entry::Entity::find()
        .filter(time_entry::Column::ProjectId.eq(project_id))
        .filter(time_entry::Column::Status.is_in([TimeEntryStatus::Approved, TimeEntryStatus::Invoiced]))
        .all(db)
        .await?;
    let mut hours_by_employee: HashMap<Uuid, Decimal> = HashMap::new();
    for e in &entries {
        *hours_by_employee.entry(e.employee_id).or_default() += e.hours;
    }
    if hours_by_employee.is_empty() {
        return Ok((Decimal::ZERO, Decimal::ZERO));
    }
    let employees = employee::Entity::find()
        .filter(employee::Column::Id.is_in(hours_by_employee.keys().copied()))
        .all(db)
        .await?;
    let rates: HashMap<Uuid, Decimal> = employees.iter().map(|e| (e.id, hourly_cost(e, standard_hours_per_month))).collect();

    let total_hours = hours_by_employee.values().copied().sum();
    let cost = labor_cost(
        hours_by_employee
            .iter()
            .map(|(id, hours)| (*hours, rates.get(id).copied().unwrap_or_default())),
    );
    Ok((total_hours, cost))
}

async fn accepted_vendor_spend(db: &DatabaseConnection, project_id: Uuid) -> Result<Decimal, ServiceError> {
    let orders: Vec<Uuid> = purchase_order::Entity::find()
        .filter(purchase_order::Column::ProjectId.eq(project_id))
        .all(db)
        .await?
        .into_iter()
        .map(|po| po.id)
        .collect();
    if orders.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let invoices = vendor_invoice::Entity::find()
        .filter(vendor_invoice::Column::PurchaseOrderId.is_in(orders))
        .filter(vendor_invoice::Column::Status.is_in([VendorInvoiceStatus::Matched, VendorInvoiceStatus::Approved]))
        .all(db)
        .await?;
    Ok(invoices.iter().map(|i| i.total).sum())
}
