use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::purchase_order_line;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goods_receipt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub purchase_order_line_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub received_on: Date,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Line }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Line => Entity::belongs_to(purchase_order_line::Entity)
                .from(Column::PurchaseOrderLineId)
                .to(purchase_order_line::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
