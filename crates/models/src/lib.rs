//! Persistence layer: SeaORM entities for the consultancy domain, their
//! field-level validation, connection setup and schema creation.

pub mod errors;
pub mod audit;
pub mod validate;
pub mod db;
pub mod schema;

pub mod client;
pub mod project;
pub mod employee;
pub mod planned_team_slot;
pub mod actual_assignment;
pub mod time_entry;
pub mod invoice;
pub mod invoice_line;
pub mod payment;
pub mod overhead;
pub mod change_request;
pub mod budget_line;
pub mod vendor;
pub mod purchase_order;
pub mod purchase_order_line;
pub mod goods_receipt;
pub mod vendor_invoice;
pub mod vendor_invoice_line;
pub mod task;
pub mod task_dependency;

#[cfg(test)]
mod tests;
