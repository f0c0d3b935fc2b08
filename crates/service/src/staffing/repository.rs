use async_trait::async_trait;
use uuid::Uuid;

use models::{actual_assignment, employee, planned_team_slot, project};

use crate::errors::ServiceError;

/// Persistence needed by the staffing rules.
#[async_trait]
pub trait StaffingRepository: Send + Sync {
    async fn project(&self, id: Uuid) -> Result<Option<project::Model>, ServiceError>;
    async fn employee(&self, id: Uuid) -> Result<Option<employee::Model>, ServiceError>;

    async fn slot(&self, id: Uuid) -> Result<Option<planned_team_slot::Model>, ServiceError>;
    async fn slots_for_project(&self, project_id: Uuid) -> Result<Vec<planned_team_slot::Model>, ServiceError>;
    async fn insert_slot(&self, slot: planned_team_slot::Model) -> Result<planned_team_slot::Model, ServiceError>;
    async fn delete_slot(&self, id: Uuid) -> Result<bool, ServiceError>;

    async fn assignment(&self, id: Uuid) -> Result<Option<actual_assignment::Model>, ServiceError>;
    async fn assignments_for_slot(&self, slot_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError>;
    async fn assignments_for_employee(&self, employee_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError>;
    async fn assignments_for_project(&self, project_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError>;
    async fn insert_assignment(&self, a: actual_assignment::Model) -> Result<actual_assignment::Model, ServiceError>;
    /// Overwrite every column of an existing assignment, provided the stored
    /// row is still at `expected_version`.
    async fn save_assignment(&self, a: actual_assignment::Model, expected_version: i32) -> Result<actual_assignment::Model, ServiceError>;
    async fn time_entry_count(&self, assignment_id: Uuid) -> Result<u64, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockStaffingRepository {
        pub projects: Mutex<HashMap<Uuid, project::Model>>,
        pub employees: Mutex<HashMap<Uuid, employee::Model>>,
        pub slots: Mutex<HashMap<Uuid, planned_team_slot::Model>>,
        pub assignments: Mutex<HashMap<Uuid, actual_assignment::Model>>,
        pub time_entries: Mutex<HashMap<Uuid, u64>>, // key: assignment_id
    }

    impl MockStaffingRepository {
        pub fn put_project(&self, p: project::Model) { self.projects.lock().unwrap().insert(p.id, p); }
        pub fn put_employee(&self, e: employee::Model) { self.employees.lock().unwrap().insert(e.id, e); }
        pub fn put_time_entries(&self, assignment_id: Uuid, n: u64) { self.time_entries.lock().unwrap().insert(assignment_id, n); }
    }

    #[async_trait]
    impl StaffingRepository for MockStaffingRepository {
        async fn project(&self, id: Uuid) -> Result<Option<project::Model>, ServiceError> {
            Ok(self.projects.lock().unwrap().get(&id).cloned())
        }

        async fn employee(&self, id: Uuid) -> Result<Option<employee::Model>, ServiceError> {
            Ok(self.employees.lock().unwrap().get(&id).cloned())
        }

        async fn slot(&self, id: Uuid) -> Result<Option<planned_team_slot::Model>, ServiceError> {
            Ok(self.slots.lock().unwrap().get(&id).cloned())
        }

        async fn slots_for_project(&self, project_id: Uuid) -> Result<Vec<planned_team_slot::Model>, ServiceError> {
            let mut v: Vec<_> = self.slots.lock().unwrap().values().filter(|s| s.project_id == project_id).cloned().collect();
            v.sort_by_key(|s| (s.start_date, s.created_at));
            Ok(v)
        }

        async fn insert_slot(&self, slot: planned_team_slot::Model) -> Result<planned_team_slot::Model, ServiceError> {
            self.slots.lock().unwrap().insert(slot.id, slot.clone());
            Ok(slot)
        }

        async fn delete_slot(&self, id: Uuid) -> Result<bool, ServiceError> {
            Ok(self.slots.lock().unwrap().remove(&id).is_some())
        }

        async fn assignment(&self, id: Uuid) -> Result<Option<actual_assignment::Model>, ServiceError> {
            Ok(self.assignments.lock().unwrap().get(&id).cloned())
        }

        async fn assignments_for_slot(&self, slot_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError> {
            Ok(self.assignments.lock().unwrap().values().filter(|a| a.slot_id == slot_id).cloned().collect())
        }

        async fn assignments_for_employee(&self, employee_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError> {
            Ok(self.assignments.lock().unwrap().values().filter(|a| a.employee_id == employee_id).cloned().collect())
        }

        async fn assignments_for_project(&self, project_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError> {
            Ok(self.assignments.lock().unwrap().values().filter(|a| a.project_id == project_id).cloned().collect())
        }

        async fn insert_assignment(&self, a: actual_assignment::Model) -> Result<actual_assignment::Model, ServiceError> {
            self.assignments.lock().unwrap().insert(a.id, a.clone());
            Ok(a)
        }

        async fn save_assignment(&self, a: actual_assignment::Model, expected_version: i32) -> Result<actual_assignment::Model, ServiceError> {
            let mut all = self.assignments.lock().unwrap();
            match all.get(&a.id) {
                None => return Err(ServiceError::not_found("assignment")),
                Some(stored) if stored.row_version != expected_version => {
                    return Err(ServiceError::conflict("assignment was modified concurrently"))
                }
                Some(_) => {}
            }
            all.insert(a.id, a.clone());
            Ok(a)
        }

        async fn time_entry_count(&self, assignment_id: Uuid) -> Result<u64, ServiceError> {
            Ok(self.time_entries.lock().unwrap().get(&assignment_id).copied().unwrap_or(0))
        }
    }
}
