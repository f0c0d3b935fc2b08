//! Table creation straight from the entity definitions.
//!
//! Tables are created with `IF NOT EXISTS` in foreign-key order, so running
//! `sync` against an up-to-date database is a no-op.

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityName, EntityTrait, Schema};
use tracing::{debug, info};

use crate::errors::ModelError;
use crate::{
    actual_assignment, budget_line, change_request, client, employee, goods_receipt, invoice, invoice_line,
    overhead, payment, planned_team_slot, project, purchase_order, purchase_order_line, task, task_dependency,
    time_entry, vendor, vendor_invoice, vendor_invoice_line,
};

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), ModelError> {
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    debug!(table = %entity.table_name(), "table_synced");
    Ok(())
}

/// Create every missing table and index.
pub async fn sync(db: &DatabaseConnection) -> Result<(), ModelError> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, client::Entity).await?;
    create_table(db, &schema, employee::Entity).await?;
    create_table(db, &schema, vendor::Entity).await?;
    create_table(db, &schema, project::Entity).await?;
    create_table(db, &schema, planned_team_slot::Entity).await?;
    create_table(db, &schema, actual_assignment::Entity).await?;
    create_table(db, &schema, invoice::Entity).await?;
    create_table(db, &schema, time_entry::Entity).await?;
    create_table(db, &schema, invoice_line::Entity).await?;
    create_table(db, &schema, payment::Entity).await?;
    create_table(db, &schema, overhead::Entity).await?;
    create_table(db, &schema, change_request::Entity).await?;
    create_table(db, &schema, budget_line::Entity).await?;
    create_table(db, &schema, purchase_order::Entity).await?;
    create_table(db, &schema, purchase_order_line::Entity).await?;
    create_table(db, &schema, goods_receipt::Entity).await?;
    create_table(db, &schema, vendor_invoice::Entity).await?;
    create_table(db, &schema, vendor_invoice_line::Entity).await?;
    create_table(db, &schema, task::Entity).await?;
    create_table(db, &schema, task_dependency::Entity).await?;

    let backend = db.get_database_backend();
    let budget_unique = Index::create()
        .name("idx_budget_line_project_category")
        .table(budget_line::Entity)
        .col(budget_line::Column::ProjectId)
        .col(budget_line::Column::Category)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&budget_unique)).await?;

    let assignment_by_employee = Index::create()
        .name("idx_assignment_employee")
        .table(actual_assignment::Entity)
        .col(actual_assignment::Column::EmployeeId)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&assignment_by_employee)).await?;

    let time_by_employee_day = Index::create()
        .name("idx_time_entry_employee_day")
        .table(time_entry::Entity)
        .col(time_entry::Column::EmployeeId)
        .col(time_entry::Column::WorkDate)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&time_by_employee_day)).await?;

    info!(tables = 20, "schema_synced");
    Ok(())
}
