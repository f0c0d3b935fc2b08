use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{actual_assignment, employee, invoice, project};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TimeEntryStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "invoiced")]
    Invoiced,
}

impl TimeEntryStatus {
    /// Transitions a timesheet user may request. `Approved <-> Invoiced` is driven
    /// by invoicing and is not part of this table.
    pub fn can_transition_to(self, to: TimeEntryStatus) -> bool {
        use TimeEntryStatus::*;
        matches!(
            (self, to),
            (Draft, Submitted) | (Rejected, Submitted) | (Submitted, Approved) | (Submitted, Rejected)
        )
    }

    pub fn is_editable(self) -> bool { matches!(self, TimeEntryStatus::Draft | TimeEntryStatus::Rejected) }

    /// Counts as incurred labor cost.
    pub fn is_costed(self) -> bool { matches!(self, TimeEntryStatus::Approved | TimeEntryStatus::Invoiced) }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "time_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub project_id: Uuid,
    pub employee_id: Uuid,
    pub work_date: Date,
    #[sea_orm(column_type = "Decimal(Some((6, 2)))")]
    pub hours: Decimal,
    pub description: String,
    pub billable: bool,
    pub status: TimeEntryStatus,
    pub invoice_id: Option<Uuid>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub row_version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Assignment, Project, Employee, Invoice }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Assignment => Entity::belongs_to(actual_assignment::Entity).from(Column::AssignmentId).to(actual_assignment::Column::Id).into(),
            Relation::Project => Entity::belongs_to(project::Entity).from(Column::ProjectId).to(project::Column::Id).into(),
            Relation::Employee => Entity::belongs_to(employee::Entity).from(Column::EmployeeId).to(employee::Column::Id).into(),
            Relation::Invoice => Entity::belongs_to(invoice::Entity).from(Column::InvoiceId).to(invoice::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::TimeEntryStatus::*;

    #[test]
    fn approval_workflow() {
        assert!(Draft.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(Approved));
        assert!(Submitted.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Submitted));
        assert!(!Draft.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Draft));
        assert!(!Approved.can_transition_to(Invoiced));
        assert!(!Invoiced.can_transition_to(Approved));
    }

    #[test]
    fn only_approved_and_invoiced_cost() {
        assert!(Approved.is_costed());
        assert!(Invoiced.is_costed());
        assert!(!Submitted.is_costed());
        assert!(Rejected.is_editable());
        assert!(!Submitted.is_editable());
    }
}
