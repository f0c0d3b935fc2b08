use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{employee, planned_team_slot, project};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "ended")]
    Ended,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl AssignmentStatus {
    /// Counts against allocation ceilings over its date range. An ended
    /// assignment still occupied the days up to its end date.
    pub fn holds_allocation(self) -> bool { matches!(self, AssignmentStatus::Active | AssignmentStatus::Ended) }

    /// Time may be booked against the assignment.
    pub fn accepts_time(self) -> bool { matches!(self, AssignmentStatus::Active | AssignmentStatus::Ended) }
}

/// A concrete employee-to-slot binding.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actual_assignment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub slot_id: Uuid,
    pub project_id: Uuid,
    pub employee_id: Uuid,
    pub allocation_pct: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub status: AssignmentStatus,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub row_version: i32,
}

impl Model {
    pub fn covers(&self, day: Date) -> bool { self.start_date <= day && day <= self.end_date }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Slot, Project, Employee }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Slot => Entity::belongs_to(planned_team_slot::Entity).from(Column::SlotId).to(planned_team_slot::Column::Id).into(),
            Relation::Project => Entity::belongs_to(project::Entity).from(Column::ProjectId).to(project::Column::Id).into(),
            Relation::Employee => Entity::belongs_to(employee::Entity).from(Column::EmployeeId).to(employee::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
