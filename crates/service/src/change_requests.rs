use chrono::Days;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::change_request::{self, ChangeRequestStatus};
use models::project::{self, ProjectStatus};
use models::{audit, validate};

use crate::audit::{check_version, update_versioned};
use crate::errors::ServiceError;
use crate::projects::get_project;

#[derive(Clone, Debug, Deserialize)]
pub struct NewChangeRequest {
    pub project_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub budget_impact: Decimal,
    #[serde(default)]
    pub schedule_impact_days: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Submit,
    Approve,
    Reject,
    Implement,
}

impl Decision {
    fn target(self) -> ChangeRequestStatus {
        match self {
            Decision::Submit => ChangeRequestStatus::Submitted,
            Decision::Approve => ChangeRequestStatus::Approved,
            Decision::Reject => ChangeRequestStatus::Rejected,
            Decision::Implement => ChangeRequestStatus::Implemented,
        }
    }
}

pub async fn create_change_request(db: &DatabaseConnection, input: NewChangeRequest, actor: &str) -> Result<change_request::Model, ServiceError> {
    let title = validate::required_text("title", &input.title, 200)?;
    if input.schedule_impact_days < 0 {
        return Err(ServiceError::validation("schedule impact cannot be negative"));
    }
    let project = get_project(db, input.project_id).await?;
    if matches!(project.status, ProjectStatus::Completed | ProjectStatus::Cancelled) {
        return Err(ServiceError::InvalidState(format!("a {:?} project takes no change requests", project.status)));
    }
    let now = audit::now();
    let am = change_request::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project.id),
        title: Set(title),
        description: Set(input.description.trim().to_string()),
        budget_impact: Set(input.budget_impact),
        schedule_impact_days: Set(input.schedule_impact_days),
        status: Set(ChangeRequestStatus::Draft),
        decided_by: Set(None),
        decided_at: Set(None),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        row_version: Set(audit::INITIAL_VERSION),
    };
    let created = am.insert(db).await?;
    info!(change_request_id = %created.id, "change_request_created");
    Ok(created)
}

pub async fn get_change_request(db: &DatabaseConnection, id: Uuid) -> Result<change_request::Model, ServiceError> {
    change_request::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("change request"))
}

pub async fn list_change_requests(db: &DatabaseConnection, project_id: Uuid) -> Result<Vec<change_request::Model>, ServiceError> {
    Ok(change_request::Entity::find()
        .filter(change_request::Column::ProjectId.eq(project_id))
        .order_by_asc(change_request::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Move a change request forward. Approval applies its budget and schedule
/// impact to the project in the same transaction.
#[instrument(skip(db))]
pub async fn decide_change_request(
    db: &DatabaseConnection,
    id: Uuid,
    expected_version: i32,
    decision: Decision,
    actor: &str,
) -> Result<change_request::Model, ServiceError> {
    let txn = db.begin().await?;
    let current = change_request::Entity::find_by_id(id).one(&txn).await?.ok_or_else(|| ServiceError::not_found("change request"))?;
    check_version("change request", expected_version, current.row_version)?;
    let to = decision.target();
    if !current.status.can_transition_to(to) {
        return Err(ServiceError::transition("change request", current.status, to));
    }

    if decision == Decision::Approve {
        let project = project::Entity::find_by_id(current.project_id).one(&txn).await?.ok_or_else(|| ServiceError::not_found("project"))?;
        if project.is_deleted || matches!(project.status, ProjectStatus::Completed | ProjectStatus::Cancelled) {
            return Err(ServiceError::InvalidState(format!("a {:?} project takes no change requests", project.status)));
        }
        let budget = project.budget_amount + current.budget_impact;
        if budget < Decimal::ZERO {
            return Err(ServiceError::validation(format!("approval would leave the project budget at {budget}")));
        }
        let end = u64::try_from(current.schedule_impact_days)
            .ok()
            .and_then(|days| project.end_date.checked_add_days(Days::new(days)))
            .ok_or_else(|| ServiceError::validation("schedule impact out of range"))?;
        let version = project.row_version;
        let mut pam: project::ActiveModel = project.into();
        pam.budget_amount = Set(budget);
        pam.end_date = Set(end);
        pam.updated_at = Set(audit::now());
        pam.row_version = Set(version + 1);
        update_versioned(&txn, pam, project::Column::RowVersion, version).await?;
        info!(project_id = %current.project_id, budget = %budget, end_date = %end, "change_request_applied");
    }

    let version = current.row_version;
    let mut am: change_request::ActiveModel = current.into();
    am.status = Set(to);
    if matches!(decision, Decision::Approve | Decision::Reject) {
        am.decided_by = Set(Some(actor.to_string()));
        am.decided_at = Set(Some(audit::now()));
    }
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let updated = update_versioned(&txn, am, change_request::Column::RowVersion, version).await?;
    txn.commit().await?;
    info!(change_request_id = %id, status = ?to, "change_request_decided");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::change_project_status;
    use crate::test_support::{get_db, staffed_project};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn approval_extends_project() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let f = staffed_project(&db).await?;
        let cr = create_change_request(
            &db,
            NewChangeRequest { project_id: f.project.id, title: "Extra reports".into(), description: String::new(), budget_impact: dec!(15000), schedule_impact_days: 10 },
            "pm",
        )
        .await?;
        assert!(matches!(decide_change_request(&db, cr.id, cr.row_version, Decision::Approve, "pm").await, Err(ServiceError::InvalidState(_))));

        let cr = decide_change_request(&db, cr.id, cr.row_version, Decision::Submit, "pm").await?;
        let cr = decide_change_request(&db, cr.id, cr.row_version, Decision::Approve, "sponsor").await?;
        assert_eq!(cr.decided_by.as_deref(), Some("sponsor"));

        let p = get_project(&db, f.project.id).await?;
        assert_eq!(p.budget_amount, f.project.budget_amount + dec!(15000));
        assert_eq!(p.end_date, f.project.end_date + chrono::Duration::days(10));

        let cr = decide_change_request(&db, cr.id, cr.row_version, Decision::Implement, "pm").await?;
        assert_eq!(cr.status, ChangeRequestStatus::Implemented);
        Ok(())
    }

    #[tokio::test]
    async fn approval_cannot_drive_budget_negative() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let f = staffed_project(&db).await?;
        let cr = create_change_request(
            &db,
            NewChangeRequest { project_id: f.project.id, title: "Descope".into(), description: String::new(), budget_impact: dec!(-500000), schedule_impact_days: 0 },
            "pm",
        )
        .await?;
        let cr = decide_change_request(&db, cr.id, cr.row_version, Decision::Submit, "pm").await?;
        assert!(matches!(decide_change_request(&db, cr.id, cr.row_version, Decision::Approve, "pm").await, Err(ServiceError::Validation(_))));
        // unchanged after the rollback
        assert_eq!(get_change_request(&db, cr.id).await?.status, ChangeRequestStatus::Submitted);
        Ok(())
    }

    #[tokio::test]
    async fn closed_project_cannot_take_an_approval() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let f = staffed_project(&db).await?;
        let cr = create_change_request(
            &db,
            NewChangeRequest { project_id: f.project.id, title: "Late extension".into(), description: String::new(), budget_impact: dec!(5000), schedule_impact_days: 30 },
            "pm",
        )
        .await?;
        let cr = decide_change_request(&db, cr.id, cr.row_version, Decision::Submit, "pm").await?;
        change_project_status(&db, f.project.id, f.project.row_version, ProjectStatus::Completed).await?;

        assert!(matches!(decide_change_request(&db, cr.id, cr.row_version, Decision::Approve, "sponsor").await, Err(ServiceError::InvalidState(_))));
        let p = get_project(&db, f.project.id).await?;
        assert_eq!((p.budget_amount, p.end_date), (f.project.budget_amount, f.project.end_date));
        assert_eq!(get_change_request(&db, cr.id).await?.status, ChangeRequestStatus::Submitted);
        Ok(())
    }
}
