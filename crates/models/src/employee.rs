use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{audit, errors, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub full_name: String,
    pub email: String,
    pub designation: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub monthly_salary: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub monthly_incentive: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub monthly_commission_share: Decimal,
    /// Hourly rate charged to clients.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub billing_rate: Decimal,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub is_deleted: bool,
    pub row_version: i32,
}

impl Model {
    /// Fully loaded monthly cost of the employee to the company.
    pub fn monthly_cost(&self) -> Decimal {
        self.monthly_salary + self.monthly_incentive + self.monthly_commission_share
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, Deserialize)]
pub struct NewEmployee {
    pub code: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub designation: String,
    pub monthly_salary: Decimal,
    #[serde(default)]
    pub monthly_incentive: Decimal,
    #[serde(default)]
    pub monthly_commission_share: Decimal,
    #[serde(default)]
    pub billing_rate: Decimal,
}

pub fn validate_compensation(salary: Decimal, incentive: Decimal, commission: Decimal, billing_rate: Decimal) -> Result<(), errors::ModelError> {
    validate::non_negative("monthly_salary", salary)?;
    validate::non_negative("monthly_incentive", incentive)?;
    validate::non_negative("monthly_commission_share", commission)?;
    validate::non_negative("billing_rate", billing_rate)?;
    Ok(())
}

pub async fn create(db: &DatabaseConnection, input: NewEmployee, actor: &str) -> Result<Model, errors::ModelError> {
    let code = validate::required_text("employee code", &input.code, 32)?.to_ascii_uppercase();
    let full_name = validate::required_text("full name", &input.full_name, 200)?;
    let email = validate::email(&input.email)?;
    validate_compensation(input.monthly_salary, input.monthly_incentive, input.monthly_commission_share, input.billing_rate)?;
    let now = audit::now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        full_name: Set(full_name),
        email: Set(email),
        designation: Set(input.designation.trim().to_string()),
        monthly_salary: Set(input.monthly_salary),
        monthly_incentive: Set(input.monthly_incentive),
        monthly_commission_share: Set(input.monthly_commission_share),
        billing_rate: Set(input.billing_rate),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        is_deleted: Set(false),
        row_version: Set(audit::INITIAL_VERSION),
    };
    Ok(am.insert(db).await?)
}
