//! Application services for the consultancy back end.
//! - Business rules live here, on top of the entities in `models`.
//! - Pure rules (allocation, numbering, matching, critical path) are plain
//!   functions so they can be checked without a database.
//! - Every operation returns [`errors::ServiceError`].

pub mod audit;
pub mod billing;
pub mod change_requests;
pub mod clients;
pub mod costing;
pub mod employees;
pub mod errors;
pub mod money;
pub mod overheads;
pub mod planning;
pub mod procurement;
pub mod projects;
pub mod staffing;
#[cfg(test)]
pub mod test_support;
pub mod timesheets;
