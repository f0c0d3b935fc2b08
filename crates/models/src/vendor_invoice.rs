use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{purchase_order, vendor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum VendorInvoiceStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "matched")]
    Matched,
    #[sea_orm(string_value = "exception")]
    Exception,
    #[sea_orm(string_value = "approved")]
    Approved,
}

impl VendorInvoiceStatus {
    /// Counts as procurement spend in cost reports.
    pub fn is_accepted(self) -> bool { matches!(self, VendorInvoiceStatus::Matched | VendorInvoiceStatus::Approved) }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor_invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub purchase_order_id: Uuid,
    /// Invoice number as printed by the vendor.
    pub vendor_reference: String,
    pub invoice_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total: Decimal,
    pub status: VendorInvoiceStatus,
    /// JSON list of discrepancies from the last three-way match.
    pub match_notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub row_version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Vendor, PurchaseOrder }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Vendor => Entity::belongs_to(vendor::Entity).from(Column::VendorId).to(vendor::Column::Id).into(),
            Relation::PurchaseOrder => Entity::belongs_to(purchase_order::Entity).from(Column::PurchaseOrderId).to(purchase_order::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
