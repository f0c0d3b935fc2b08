use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use common::pagination::Pagination;
use models::purchase_order::{self, PurchaseOrderStatus};
use models::vendor::{self, NewVendor};
use models::{audit, validate};

use crate::audit::{check_version, update_versioned};
use crate::errors::ServiceError;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VendorPatch {
    pub expected_version: i32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

pub async fn create_vendor(db: &DatabaseConnection, input: NewVendor, actor: &str) -> Result<vendor::Model, ServiceError> {
    let created = vendor::create(db, input, actor).await?;
    info!(vendor_id = %created.id, "vendor_created");
    Ok(created)
}

pub async fn get_vendor(db: &DatabaseConnection, id: Uuid) -> Result<vendor::Model, ServiceError> {
    vendor::Entity::find_by_id(id)
        .filter(vendor::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("vendor"))
}

pub async fn list_vendors(db: &DatabaseConnection, paging: Pagination) -> Result<Vec<vendor::Model>, ServiceError> {
    let (page, per_page) = paging.normalize();
    Ok(vendor::Entity::find()
        .filter(vendor::Column::IsDeleted.eq(false))
        .order_by_asc(vendor::Column::Name)
        .paginate(db, per_page)
        .fetch_page(page)
        .await?)
}

pub async fn update_vendor(db: &DatabaseConnection, id: Uuid, patch: VendorPatch) -> Result<vendor::Model, ServiceError> {
    let current = get_vendor(db, id).await?;
    check_version("vendor", patch.expected_version, current.row_version)?;
    let version = current.row_version;
    let mut am: vendor::ActiveModel = current.into();
    if let Some(name) = patch.name {
        am.name = Set(validate::required_text("vendor name", &name, 200)?);
    }
    if let Some(email) = patch.email {
        am.email = Set(validate::optional_email(Some(&email))?);
    }
    if let Some(tax_id) = patch.tax_id {
        am.tax_id = Set(Some(tax_id.trim().to_string()).filter(|t| !t.is_empty()));
    }
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, vendor::Column::RowVersion, version).await
}

/// Soft delete; refused while purchase orders with the vendor are still open.
pub async fn soft_delete_vendor(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let current = get_vendor(db, id).await?;
    let open = purchase_order::Entity::find()
        .filter(purchase_order::Column::VendorId.eq(id))
        .filter(purchase_order::Column::Status.is_not_in([PurchaseOrderStatus::Closed, PurchaseOrderStatus::Cancelled]))
        .count(db)
        .await?;
    if open > 0 {
        return Err(ServiceError::conflict(format!("vendor has {open} open purchase order(s)")));
    }
    let version = current.row_version;
    let mut am: vendor::ActiveModel = current.into();
    am.is_deleted = Set(true);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    update_versioned(db, am, vendor::Column::RowVersion, version).await?;
    info!(vendor_id = %id, "vendor_deleted");
    Ok(())
}
