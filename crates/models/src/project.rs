use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{client, errors, validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "on_hold")]
    OnHold,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ProjectStatus {
    pub fn can_transition_to(self, to: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, to),
            (Draft, Active) | (Draft, Cancelled)
                | (Active, OnHold) | (Active, Completed) | (Active, Cancelled)
                | (OnHold, Active) | (OnHold, Cancelled)
        )
    }

    /// Work can be staffed and time logged against the project.
    pub fn is_open(self) -> bool { matches!(self, ProjectStatus::Active | ProjectStatus::OnHold) }

    /// Approved time may still be invoiced.
    pub fn is_billable(self) -> bool {
        matches!(self, ProjectStatus::Active | ProjectStatus::OnHold | ProjectStatus::Completed)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub status: ProjectStatus,
    pub start_date: Date,
    pub end_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub budget_amount: Decimal,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub is_deleted: bool,
    pub row_version: i32,
}

impl Model {
    pub fn bounds(&self) -> (Date, Date) { (self.start_date, self.end_date) }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Client }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Client => Entity::belongs_to(client::Entity)
                .from(Column::ClientId)
                .to(client::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Project codes are short upper-case identifiers such as `ACME-ERP`.
pub fn validate_code(code: &str) -> Result<String, errors::ModelError> {
    let code = validate::required_text("project code", code, 32)?.to_ascii_uppercase();
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(errors::invalid("project code may only contain letters, digits, '-' and '_'"));
    }
    Ok(code)
}

pub fn validate_name(name: &str) -> Result<String, errors::ModelError> {
    validate::required_text("project name", name, 200)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProjectStatus::*;

    #[test]
    fn legal_transitions() {
        assert!(Draft.can_transition_to(Active));
        assert!(Active.can_transition_to(OnHold));
        assert!(OnHold.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
    }

    #[test]
    fn terminal_states_are_final() {
        for to in [Draft, Active, OnHold, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(to));
            assert!(!Cancelled.can_transition_to(to));
        }
        assert!(!Draft.can_transition_to(Completed));
        assert!(!OnHold.can_transition_to(Completed));
    }

    #[test]
    fn code_is_upper_cased_and_checked() {
        assert_eq!(validate_code(" acme-erp ").unwrap(), "ACME-ERP");
        assert!(validate_code("acme erp").is_err());
    }
}
