use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{audit, errors, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub tax_id: Option<String>,
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

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewVendor {
    pub name: String,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

pub async fn create(db: &DatabaseConnection, input: NewVendor, actor: &str) -> Result<Model, errors::ModelError> {
    let name = validate::required_text("vendor name", &input.name, 200)?;
    let email = validate::optional_email(input.email.as_deref())?;
    let now = audit::now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        tax_id: Set(input.tax_id.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        is_deleted: Set(false),
        row_version: Set(audit::INITIAL_VERSION),
    };
    Ok(am.insert(db).await?)
}
