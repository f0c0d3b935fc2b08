use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{audit, errors, validate};

pub const DEFAULT_PAYMENT_TERMS_DAYS: i32 = 30;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub contact_email: Option<String>,
    pub billing_address: Option<String>,
    pub payment_terms_days: i32,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub is_deleted: bool,
    pub row_version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

/// Input for a new client.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub contact_email: Option<String>,
    pub billing_address: Option<String>,
    pub payment_terms_days: Option<i32>,
}

pub fn validate_name(name: &str) -> Result<String, errors::ModelError> {
    validate::required_text("client name", name, 200)
}

pub fn validate_payment_terms(days: i32) -> Result<(), errors::ModelError> {
    if !(0..=120).contains(&days) {
        return Err(errors::invalid("payment terms must be between 0 and 120 days"));
    }
    Ok(())
}

/// Insert a client on any connection, a transaction included.
pub async fn create<C: ConnectionTrait>(db: &C, input: NewClient, actor: &str) -> Result<Model, errors::ModelError> {
    let name = validate_name(&input.name)?;
    let contact_email = validate::optional_email(input.contact_email.as_deref())?;
    let terms = input.payment_terms_days.unwrap_or(DEFAULT_PAYMENT_TERMS_DAYS);
    validate_payment_terms(terms)?;
    let now = audit::now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        contact_email: Set(contact_email),
        billing_address: Set(input.billing_address.filter(|a| !a.trim().is_empty())),
        payment_terms_days: Set(terms),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        is_deleted: Set(false),
        row_version: Set(audit::INITIAL_VERSION),
    };
    Ok(am.insert(db).await?)
}
