use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::project;

/// A budgeted role on a project, later filled by actual assignments.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "planned_team_slot")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub role: String,
    pub planned_allocation_pct: i32,
    pub start_date: Date,
    pub end_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub monthly_salary: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub monthly_incentive: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub monthly_commission_share: Decimal,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub row_version: i32,
}

impl Model {
    pub fn bounds(&self) -> (Date, Date) { (self.start_date, self.end_date) }

    pub fn monthly_cost(&self) -> Decimal {
        self.monthly_salary + self.monthly_incentive + self.monthly_commission_share
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Project }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Project => Entity::belongs_to(project::Entity)
                .from(Column::ProjectId)
                .to(project::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
