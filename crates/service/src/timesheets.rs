//! Time entries booked against assignments, and their approval workflow.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::actual_assignment;
use models::audit;
use models::time_entry::{self, TimeEntryStatus};

use crate::audit::{check_version, update_versioned};
use crate::errors::ServiceError;

pub const MAX_HOURS_PER_DAY: Decimal = Decimal::from_parts(24, 0, 0, false, 0);

#[derive(Clone, Debug, Deserialize)]
pub struct NewTimeEntry {
    pub assignment_id: Uuid,
    pub work_date: NaiveDate,
    pub hours: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_billable")]
    pub billable: bool,
}

fn default_billable() -> bool { true }

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TimeEntryPatch {
    pub expected_version: i32,
    pub hours: Option<Decimal>,
    pub description: Option<String>,
    pub billable: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct TimeEntryFilter {
    pub project_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub status: Option<TimeEntryStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Review step applied to a submitted entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Review {
    Submit,
    Approve,
    Reject,
}

impl Review {
    fn target(self) -> TimeEntryStatus {
        match self {
            Review::Submit => TimeEntryStatus::Submitted,
            Review::Approve => TimeEntryStatus::Approved,
            Review::Reject => TimeEntryStatus::Rejected,
        }
    }
}

pub fn validate_hours(hours: Decimal) -> Result<(), ServiceError> {
    if hours <= Decimal::ZERO || hours > MAX_HOURS_PER_DAY {
        return Err(ServiceError::validation("hours must be greater than 0 and at most 24"));
    }
    Ok(())
}

/// Hours already booked on the day plus `hours` must fit in one day.
pub fn check_daily_total(already_booked: Decimal, hours: Decimal) -> Result<(), ServiceError> {
    if already_booked + hours > MAX_HOURS_PER_DAY {
        return Err(ServiceError::validation(format!(
            "{already_booked} hours already booked that day; {hours} more would exceed 24"
        )));
    }
    Ok(())
}

async fn booked_on(db: &DatabaseConnection, employee_id: Uuid, day: NaiveDate, exclude: Option<Uuid>) -> Result<Decimal, ServiceError> {
    let mut q = time_entry::Entity::find()
        .filter(time_entry::Column::EmployeeId.eq(employee_id))
        .filter(time_entry::Column::WorkDate.eq(day))
        .filter(time_entry::Column::Status.ne(TimeEntryStatus::Rejected));
    if let Some(id) = exclude {
        q = q.filter(time_entry::Column::Id.ne(id));
    }
    Ok(q.all(db).await?.iter().map(|e| e.hours).sum())
}

/// Book hours against an assignment. New entries start as `Draft`.
#[instrument(skip(db, input), fields(assignment_id = %input.assignment_id, work_date = %input.work_date))]
pub async fn log_time(db: &DatabaseConnection, input: NewTimeEntry, actor: &str) -> Result<time_entry::Model, ServiceError> {
    validate_hours(input.hours)?;
    let assignment = actual_assignment::Entity::find_by_id(input.assignment_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("assignment"))?;
    if !assignment.status.accepts_time() {
        return Err(ServiceError::InvalidState(format!("assignment is {:?}", assignment.status)));
    }
    if !assignment.covers(input.work_date) {
        return Err(ServiceError::validation(format!(
            "{} is outside the assignment ({}..{})",
            input.work_date, assignment.start_date, assignment.end_date
        )));
    }
    check_daily_total(booked_on(db, assignment.employee_id, input.work_date, None).await?, input.hours)?;

    let now = audit::now();
    let am = time_entry::ActiveModel {
        id: Set(Uuid::new_v4()),
        assignment_id: Set(assignment.id),
        project_id: Set(assignment.project_id),
        employee_id: Set(assignment.employee_id),
        work_date: Set(input.work_date),
        hours: Set(input.hours),
        description: Set(input.description.trim().to_string()),
        billable: Set(input.billable),
        status: Set(TimeEntryStatus::Draft),
        invoice_id: Set(None),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        row_version: Set(audit::INITIAL_VERSION),
    };
    let created = am.insert(db).await?;
    info!(time_entry_id = %created.id, hours = %created.hours, "time_logged");
    Ok(created)
}

pub async fn get_time_entry(db: &DatabaseConnection, id: Uuid) -> Result<time_entry::Model, ServiceError> {
    time_entry::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("time entry"))
}

/// Edit a draft or rejected entry; a rejected entry goes back to `Draft`.
pub async fn update_time_entry(db: &DatabaseConnection, id: Uuid, patch: TimeEntryPatch) -> Result<time_entry::Model, ServiceError> {
    let current = get_time_entry(db, id).await?;
    check_version("time entry", patch.expected_version, current.row_version)?;
    if !current.status.is_editable() {
        return Err(ServiceError::InvalidState(format!("a {:?} time entry cannot be edited", current.status)));
    }
    if let Some(hours) = patch.hours {
        validate_hours(hours)?;
        check_daily_total(booked_on(db, current.employee_id, current.work_date, Some(id)).await?, hours)?;
    }

    let version = current.row_version;
    let mut am: time_entry::ActiveModel = current.into();
    if let Some(hours) = patch.hours {
        am.hours = Set(hours);
    }
    if let Some(description) = patch.description {
        am.description = Set(description.trim().to_string());
    }
    if let Some(billable) = patch.billable {
        am.billable = Set(billable);
    }
    am.status = Set(TimeEntryStatus::Draft);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, time_entry::Column::RowVersion, version).await
}

/// Submit, approve or reject an entry.
#[instrument(skip(db))]
pub async fn review_time_entry(db: &DatabaseConnection, id: Uuid, expected_version: i32, step: Review) -> Result<time_entry::Model, ServiceError> {
    let current = get_time_entry(db, id).await?;
    check_version("time entry", expected_version, current.row_version)?;
    let to = step.target();
    if !current.status.can_transition_to(to) {
        return Err(ServiceError::transition("time entry", current.status, to));
    }
    let version = current.row_version;
    let mut am: time_entry::ActiveModel = current.into();
    am.status = Set(to);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let updated = update_versioned(db, am, time_entry::Column::RowVersion, version).await?;
    info!(time_entry_id = %id, status = ?to, "time_entry_reviewed");
    Ok(updated)
}

pub async fn delete_time_entry(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let current = get_time_entry(db, id).await?;
    if current.status != TimeEntryStatus::Draft {
        return Err(ServiceError::InvalidState("only draft time entries can be deleted".into()));
    }
    time_entry::Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}

pub async fn list_time_entries(db: &DatabaseConnection, filter: TimeEntryFilter) -> Result<Vec<time_entry::Model>, ServiceError> {
    let mut q = time_entry::Entity::find();
    if let Some(p) = filter.project_id {
        q = q.filter(time_entry::Column::ProjectId.eq(p));
    }
    if let Some(e) = filter.employee_id {
        q = q.filter(time_entry::Column::EmployeeId.eq(e));
    }
    if let Some(s) = filter.status {
        q = q.filter(time_entry::Column::Status.eq(s));
    }
    if let Some(from) = filter.from {
        q = q.filter(time_entry::Column::WorkDate.gte(from));
    }
    if let Some(to) = filter.to {
        q = q.filter(time_entry::Column::WorkDate.lte(to));
    }
    Ok(q.order_by_asc(time_entry::Column::WorkDate).order_by_asc(time_entry::Column::CreatedAt).all(db).await?)
}
