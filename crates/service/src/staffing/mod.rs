//! Planned team slots and actual assignments.

pub mod allocation;
pub mod domain;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::StaffingService;
