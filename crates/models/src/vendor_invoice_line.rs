use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vendor_invoice;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor_invoice_line")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vendor_invoice_id: Uuid,
    /// Not a foreign key: vendors may bill lines that are not on the order,
    /// which the three-way match reports as a discrepancy.
    pub purchase_order_line_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { VendorInvoice }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::VendorInvoice => Entity::belongs_to(vendor_invoice::Entity)
                .from(Column::VendorInvoiceId)
                .to(vendor_invoice::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
