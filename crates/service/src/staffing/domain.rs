use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{actual_assignment, planned_team_slot};

/// Input for a planned team slot.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSlot {
    pub project_id: Uuid,
    pub role: String,
    pub planned_allocation_pct: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_salary: Decimal,
    #[serde(default)]
    pub monthly_incentive: Decimal,
    #[serde(default)]
    pub monthly_commission_share: Decimal,
}

/// A slot with its derived budget figures.
#[derive(Debug, Clone, Serialize)]
pub struct SlotSummary {
    #[serde(flatten)]
    pub slot: planned_team_slot::Model,
    pub budget_cost: Decimal,
    pub remaining_allocation_pct: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub slot_id: Uuid,
    pub employee_id: Uuid,
    pub allocation_pct: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentPatch {
    pub expected_version: i32,
    pub allocation_pct: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AssignmentFilter {
    pub project_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Utilization {
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub allocated_pct: i32,
    pub available_pct: i32,
    pub assignments: Vec<actual_assignment::Model>,
}
