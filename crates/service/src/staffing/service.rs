use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::actual_assignment::{self, AssignmentStatus};
use models::project::ProjectStatus;
use models::{audit, planned_team_slot, validate};

use super::allocation::{self, Span};
use super::domain::{AssignmentFilter, AssignmentPatch, NewAssignment, NewSlot, SlotSummary, Utilization};
use super::repository::StaffingRepository;
use crate::audit::check_version;
use crate::errors::ServiceError;

/// Staffing rules: planned slots, assignments and the allocation ceilings
/// that bind them.
pub struct StaffingService<R: StaffingRepository> {
    repo: Arc<R>,
    max_allocation_pct: i32,
}

impl<R: StaffingRepository> StaffingService<R> {
    pub fn new(repo: Arc<R>, max_allocation_pct: i32) -> Self { Self { repo, max_allocation_pct } }

    /// Add a budgeted role to a project.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::staffing::{StaffingService, repository::mock::MockStaffingRepository, domain::NewSlot};
    /// let repo = Arc::new(MockStaffingRepository::default());
    /// let svc = StaffingService::new(repo, 100);
    /// let d = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    /// let input = NewSlot { project_id: uuid::Uuid::new_v4(), role: "Dev".into(), planned_allocation_pct: 50,
    ///     start_date: d, end_date: d, monthly_salary: 1000.into(), monthly_incentive: 0.into(), monthly_commission_share: 0.into() };
    /// // unknown project
    /// assert!(tokio_test::block_on(svc.create_slot(input, "system")).is_err());
    /// ```
    #[instrument(skip(self, input), fields(project_id = %input.project_id, role = %input.role))]
    pub async fn create_slot(&self, input: NewSlot, actor: &str) -> Result<SlotSummary, ServiceError> {
        let role = validate::required_text("role", &input.role, 100)?;
        validate::allocation_pct(input.planned_allocation_pct)?;
        validate::date_range(input.start_date, input.end_date)?;
        models::employee::validate_compensation(
            input.monthly_salary,
            input.monthly_incentive,
            input.monthly_commission_share,
            rust_decimal::Decimal::ZERO,
        )?;

        let project = self.repo.project(input.project_id).await?.filter(|p| !p.is_deleted).ok_or_else(|| ServiceError::not_found("project"))?;
        if matches!(project.status, ProjectStatus::Completed | ProjectStatus::Cancelled) {
            return Err(ServiceError::InvalidState(format!("project is {:?}; slots cannot be added", project.status)));
        }
        validate::within("slot", (input.start_date, input.end_date), project.bounds())?;

        let now = audit::now();
        let slot = planned_team_slot::Model {
            id: Uuid::new_v4(),
            project_id: project.id,
            role,
            planned_allocation_pct: input.planned_allocation_pct,
            start_date: input.start_date,
            end_date: input.end_date,
            monthly_salary: input.monthly_salary,
            monthly_incentive: input.monthly_incentive,
            monthly_commission_share: input.monthly_commission_share,
            created_by: actor.to_string(),
            created_at: now,
            updated_at: now,
            row_version: audit::INITIAL_VERSION,
        };
        let slot = self.repo.insert_slot(slot).await?;
        info!(slot_id = %slot.id, "slot_created");
        Ok(summarize(slot, &[]))
    }

    pub async fn get_slot(&self, id: Uuid) -> Result<SlotSummary, ServiceError> {
        let slot = self.repo.slot(id).await?.ok_or_else(|| ServiceError::not_found("slot"))?;
        let assigned = self.repo.assignments_for_slot(id).await?;
        Ok(summarize(slot, &assigned))
    }

    pub async fn list_slots(&self, project_id: Uuid) -> Result<Vec<SlotSummary>, ServiceError> {
        let slots = self.repo.slots_for_project(project_id).await?;
        let assignments = self.repo.assignments_for_project(project_id).await?;
        Ok(slots
            .into_iter()
            .map(|s| {
                let mine: Vec<_> = assignments.iter().filter(|a| a.slot_id == s.id).cloned().collect();
                summarize(s, &mine)
            })
            .collect())
    }

    pub async fn delete_slot(&self, id: Uuid) -> Result<(), ServiceError> {
        let assigned = self.repo.assignments_for_slot(id).await?;
        if assigned.iter().any(|a| a.status != AssignmentStatus::Cancelled) {
            return Err(ServiceError::conflict("slot still has assignments"));
        }
        if !self.repo.delete_slot(id).await? {
            return Err(ServiceError::not_found("slot"));
        }
        info!(slot_id = %id, "slot_deleted");
        Ok(())
    }

    /// Bind an employee to a slot, enforcing the slot's planned allocation and
    /// the employee's overall allocation ceiling.
    #[instrument(skip(self, input), fields(slot_id = %input.slot_id, employee_id = %input.employee_id, allocation = input.allocation_pct))]
    pub async fn assign_employee(&self, input: NewAssignment, actor: &str) -> Result<actual_assignment::Model, ServiceError> {
        let slot = self.repo.slot(input.slot_id).await?.ok_or_else(|| ServiceError::not_found("slot"))?;
        let candidate = Span::new(input.start_date, input.end_date, input.allocation_pct);
        self.validate_candidate(&slot, input.employee_id, candidate, None).await?;

        let now = audit::now();
        let assignment = actual_assignment::Model {
            id: Uuid::new_v4(),
            slot_id: slot.id,
            project_id: slot.project_id,
            employee_id: input.employee_id,
            allocation_pct: input.allocation_pct,
            start_date: input.start_date,
            end_date: input.end_date,
            status: AssignmentStatus::Active,
            created_by: actor.to_string(),
            created_at: now,
            updated_at: now,
            row_version: audit::INITIAL_VERSION,
        };
        let created = self.repo.insert_assignment(assignment).await?;
        info!(assignment_id = %created.id, project_id = %created.project_id, "assignment_created");
        Ok(created)
    }

    pub async fn get_assignment(&self, id: Uuid) -> Result<actual_assignment::Model, ServiceError> {
        self.repo.assignment(id).await?.ok_or_else(|| ServiceError::not_found("assignment"))
    }

    /// Change allocation or dates; the assignment itself is left out of the
    /// capacity checks so it does not count against its own new values.
    #[instrument(skip(self, patch), fields(assignment_id = %id))]
    pub async fn update_assignment(&self, id: Uuid, patch: AssignmentPatch) -> Result<actual_assignment::Model, ServiceError> {
        let mut current = self.get_assignment(id).await?;
        check_version("assignment", patch.expected_version, current.row_version)?;
        if current.status != AssignmentStatus::Active {
            return Err(ServiceError::InvalidState(format!("assignment is {:?}", current.status)));
        }
        let slot = self.repo.slot(current.slot_id).await?.ok_or_else(|| ServiceError::not_found("slot"))?;
        let candidate = Span::new(
            patch.start_date.unwrap_or(current.start_date),
            patch.end_date.unwrap_or(current.end_date),
            patch.allocation_pct.unwrap_or(current.allocation_pct),
        );
        self.validate_candidate(&slot, current.employee_id, candidate, Some(id)).await?;

        current.start_date = candidate.start;
        current.end_date = candidate.end;
        current.allocation_pct = candidate.allocation_pct;
        current.updated_at = audit::now();
        let version = current.row_version;
        current.row_version += 1;
        let saved = self.repo.save_assignment(current, version).await?;
        info!(assignment_id = %saved.id, allocation = saved.allocation_pct, "assignment_updated");
        Ok(saved)
    }

    /// Finish an assignment early (or on its planned end date).
    pub async fn end_assignment(&self, id: Uuid, end_date: NaiveDate) -> Result<actual_assignment::Model, ServiceError> {
        let mut current = self.get_assignment(id).await?;
        if current.status != AssignmentStatus::Active {
            return Err(ServiceError::transition("assignment", current.status, AssignmentStatus::Ended));
        }
        if end_date < current.start_date || end_date > current.end_date {
            return Err(ServiceError::validation(format!(
                "end date must be within {}..{}",
                current.start_date, current.end_date
            )));
        }
        current.end_date = end_date;
        current.status = AssignmentStatus::Ended;
        current.updated_at = audit::now();
        let version = current.row_version;
        current.row_version += 1;
        let saved = self.repo.save_assignment(current, version).await?;
        info!(assignment_id = %saved.id, end_date = %end_date, "assignment_ended");
        Ok(saved)
    }

    pub async fn cancel_assignment(&self, id: Uuid) -> Result<actual_assignment::Model, ServiceError> {
        let mut current = self.get_assignment(id).await?;
        if current.status != AssignmentStatus::Active {
            return Err(ServiceError::transition("assignment", current.status, AssignmentStatus::Cancelled));
        }
        if self.repo.time_entry_count(id).await? > 0 {
            return Err(ServiceError::conflict("assignment has time entries; end it instead"));
        }
        current.status = AssignmentStatus::Cancelled;
        current.updated_at = audit::now();
        let version = current.row_version;
        current.row_version += 1;
        let saved = self.repo.save_assignment(current, version).await?;
        info!(assignment_id = %saved.id, "assignment_cancelled");
        Ok(saved)
    }

    pub async fn list_assignments(&self, filter: AssignmentFilter) -> Result<Vec<actual_assignment::Model>, ServiceError> {
        match (filter.project_id, filter.employee_id) {
            (Some(p), Some(e)) => Ok(self.repo.assignments_for_project(p).await?.into_iter().filter(|a| a.employee_id == e).collect()),
            (Some(p), None) => self.repo.assignments_for_project(p).await,
            (None, Some(e)) => self.repo.assignments_for_employee(e).await,
            (None, None) => Err(ServiceError::validation("filter by project_id or employee_id")),
        }
    }

    /// Allocation held by an employee on one day.
    pub async fn employee_utilization(&self, employee_id: Uuid, on: NaiveDate) -> Result<Utilization, ServiceError> {
        self.repo.employee(employee_id).await?.ok_or_else(|| ServiceError::not_found("employee"))?;
        let active: Vec<_> = self
            .repo
            .assignments_for_employee(employee_id)
            .await?
            .into_iter()
            .filter(|a| a.status.holds_allocation() && a.covers(on))
            .collect();
        let spans: Vec<Span> = active.iter().map(Span::from).collect();
        let allocated = allocation::allocation_on(&spans, on);
        Ok(Utilization {
            employee_id,
            date: on,
            allocated_pct: allocated,
            available_pct: (self.max_allocation_pct - allocated).max(0),
            assignments: active,
        })
    }

    async fn validate_candidate(
        &self,
        slot: &planned_team_slot::Model,
        employee_id: Uuid,
        candidate: Span,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        validate::allocation_pct(candidate.allocation_pct)?;
        validate::date_range(candidate.start, candidate.end)?;

        let project = self.repo.project(slot.project_id).await?.ok_or_else(|| ServiceError::not_found("project"))?;
        if project.is_deleted || matches!(project.status, ProjectStatus::Completed | ProjectStatus::Cancelled) {
            return Err(ServiceError::InvalidState(format!("project is {:?}; it cannot be staffed", project.status)));
        }
        validate::within("assignment", (candidate.start, candidate.end), project.bounds())?;
        validate::within("assignment", (candidate.start, candidate.end), slot.bounds())?;

        let employee = self.repo.employee(employee_id).await?.ok_or_else(|| ServiceError::not_found("employee"))?;
        if employee.is_deleted {
            return Err(ServiceError::validation("employee is no longer active"));
        }

        let held = |a: &actual_assignment::Model| a.status.holds_allocation() && Some(a.id) != exclude;

        let on_slot: Vec<Span> = self.repo.assignments_for_slot(slot.id).await?.iter().filter(|a| held(a)).map(Span::from).collect();
        if let Err(e) = allocation::check_capacity(&on_slot, candidate, slot.planned_allocation_pct) {
            warn!(slot_id = %slot.id, %e, "slot_allocation_rejected");
            return Err(ServiceError::OverAllocated(format!("slot {}: {e}", slot.role)));
        }

        let for_employee: Vec<Span> = self.repo.assignments_for_employee(employee_id).await?.iter().filter(|a| held(a)).map(Span::from).collect();
        if let Err(e) = allocation::check_capacity(&for_employee, candidate, self.max_allocation_pct) {
            warn!(employee_id = %employee_id, %e, "employee_allocation_rejected");
            return Err(ServiceError::OverAllocated(format!("employee {}: {e}", employee.code)));
        }
        Ok(())
    }
}

fn summarize(slot: planned_team_slot::Model, assignments: &[actual_assignment::Model]) -> SlotSummary {
    let spans: Vec<Span> = assignments.iter().filter(|a| a.status.holds_allocation()).map(Span::from).collect();
    SlotSummary {
        budget_cost: allocation::slot_budget_cost(&slot),
        remaining_allocation_pct: allocation::remaining_slot_allocation(slot.planned_allocation_pct, slot.bounds(), &spans),
        slot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staffing::repository::mock::MockStaffingRepository;
    use crate::staffing::repository::StaffingRepository;
    use models::{employee, project};
    use rust_decimal_macros::dec;

    fn d(m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, m, day).unwrap() }

    fn seed() -> (Arc<MockStaffingRepository>, Uuid, Uuid, Uuid) {
        let repo = Arc::new(MockStaffingRepository::default());
        let now = audit::now();
        let project_id = Uuid::new_v4();
        repo.put_project(project::Model {
            id: project_id,
            client_id: Uuid::new_v4(),
            code: "ACME-ERP".into(),
            name: "ERP rollout".into(),
            status: ProjectStatus::Active,
            start_date: d(1, 1),
            end_date: d(12, 31),
            budget_amount: dec!(100000),
            created_by: "t".into(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            row_version: 1,
        });
        let mut ids = Vec::new();
        for code in ["E1", "E2"] {
            let id = Uuid::new_v4();
            repo.put_employee(employee::Model {
                id,
                code: code.into(),
                full_name: format!("Employee {code}"),
                email: format!("{code}@example.com"),
                designation: "Engineer".into(),
                monthly_salary: dec!(8000),
                monthly_incentive: dec!(1000),
                monthly_commission_share: dec!(1000),
                billing_rate: dec!(120),
                created_by: "t".into(),
                created_at: now,
                updated_at: now,
                is_deleted: false,
                row_version: 1,
            });
            ids.push(id);
        }
        (repo, project_id, ids[0], ids[1])
    }

    fn slot_input(project_id: Uuid, pct: i32) -> NewSlot {
        NewSlot {
            project_id,
            role: "Developer".into(),
            planned_allocation_pct: pct,
            start_date: d(1, 1),
            end_date: d(6, 30),
            monthly_salary: dec!(8000),
            monthly_incentive: dec!(1000),
            monthly_commission_share: dec!(1000),
        }
    }

    fn assign(slot_id: Uuid, employee_id: Uuid, pct: i32, start: NaiveDate, end: NaiveDate) -> NewAssignment {
        NewAssignment { slot_id, employee_id, allocation_pct: pct, start_date: start, end_date: end }
    }

    #[tokio::test]
    async fn slot_reports_budget_and_remaining() {
        let (repo, project_id, _, _) = seed();
        let svc = StaffingService::new(repo, 100);
        let slot = svc.create_slot(slot_input(project_id, 50), "alice").await.unwrap();
        // 10_000 a month for six months at half time
        assert_eq!(slot.budget_cost, dec!(30000.00));
        assert_eq!(slot.remaining_allocation_pct, 50);
        assert_eq!(slot.slot.created_by, "alice");
    }

    #[tokio::test]
    async fn slot_outside_project_is_rejected() {
        let (repo, project_id, _, _) = seed();
        let svc = StaffingService::new(repo, 100);
        let mut input = slot_input(project_id, 50);
        input.end_date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(matches!(svc.create_slot(input, "t").await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn employee_cannot_exceed_full_allocation() {
        let (repo, project_id, e1, _) = seed();
        let svc = StaffingService::new(repo, 100);
        let a = svc.create_slot(slot_input(project_id, 100), "t").await.unwrap();
        let b = svc.create_slot(slot_input(project_id, 100), "t").await.unwrap();

        svc.assign_employee(assign(a.slot.id, e1, 60, d(1, 1), d(3, 31)), "t").await.unwrap();
        let err = svc.assign_employee(assign(b.slot.id, e1, 50, d(3, 1), d(4, 30)), "t").await.unwrap_err();
        assert!(matches!(err, ServiceError::OverAllocated(_)), "{err}");

        // exactly fills March
        svc.assign_employee(assign(b.slot.id, e1, 40, d(3, 1), d(4, 30)), "t").await.unwrap();
        let u = svc.employee_utilization(e1, d(3, 15)).await.unwrap();
        assert_eq!(u.allocated_pct, 100);
        assert_eq!(u.assignments.len(), 2);
    }

    #[tokio::test]
    async fn slot_allocation_is_shared_between_employees() {
        let (repo, project_id, e1, e2) = seed();
        let svc = StaffingService::new(repo, 100);
        let slot = svc.create_slot(slot_input(project_id, 80), "t").await.unwrap();
        svc.assign_employee(assign(slot.slot.id, e1, 50, d(1, 1), d(6, 30)), "t").await.unwrap();
        let err = svc.assign_employee(assign(slot.slot.id, e2, 40, d(2, 1), d(2, 28)), "t").await.unwrap_err();
        assert!(matches!(err, ServiceError::OverAllocated(_)));
        svc.assign_employee(assign(slot.slot.id, e2, 30, d(2, 1), d(2, 28)), "t").await.unwrap();

        let summaries = svc.list_slots(project_id).await.unwrap();
        assert_eq!(summaries[0].remaining_allocation_pct, 0);
    }

    #[tokio::test]
    async fn update_excludes_itself_and_checks_version() {
        let (repo, project_id, e1, _) = seed();
        let svc = StaffingService::new(repo, 100);
        let slot = svc.create_slot(slot_input(project_id, 100), "t").await.unwrap();
        let a = svc.assign_employee(assign(slot.slot.id, e1, 60, d(1, 1), d(6, 30)), "t").await.unwrap();

        let stale = AssignmentPatch { expected_version: 7, allocation_pct: Some(80), ..Default::default() };
        assert!(matches!(svc.update_assignment(a.id, stale).await, Err(ServiceError::Conflict(_))));

        let patch = AssignmentPatch { expected_version: a.row_version, allocation_pct: Some(100), ..Default::default() };
        let updated = svc.update_assignment(a.id, patch).await.unwrap();
        assert_eq!(updated.allocation_pct, 100);
        assert_eq!(updated.row_version, a.row_version + 1);
    }

    #[tokio::test]
    async fn end_frees_allocation_after_the_end_date_and_cancel_requires_no_time() {
        let (repo, project_id, e1, _) = seed();
        let svc = StaffingService::new(repo.clone(), 100);
        let slot = svc.create_slot(slot_input(project_id, 100), "t").await.unwrap();
        let a = svc.assign_employee(assign(slot.slot.id, e1, 100, d(1, 1), d(6, 30)), "t").await.unwrap();

        let u = svc.employee_utilization(e1, d(2, 1)).await.unwrap();
        assert_eq!((u.allocated_pct, u.available_pct), (100, 0));

        repo.put_time_entries(a.id, 3);
        assert!(matches!(svc.cancel_assignment(a.id).await, Err(ServiceError::Conflict(_))));

        let ended = svc.end_assignment(a.id, d(1, 31)).await.unwrap();
        assert_eq!(ended.status, AssignmentStatus::Ended);
        // January was worked; February is free again
        let u = svc.employee_utilization(e1, d(1, 15)).await.unwrap();
        assert_eq!(u.allocated_pct, 100);
        let u = svc.employee_utilization(e1, d(2, 15)).await.unwrap();
        assert_eq!(u.allocated_pct, 0);
        assert!(svc.end_assignment(a.id, d(1, 31)).await.is_err());
    }

    #[tokio::test]
    async fn ended_assignment_still_blocks_its_worked_period() {
        let (repo, project_id, e1, e2) = seed();
        let svc = StaffingService::new(repo, 100);
        let a = svc.create_slot(slot_input(project_id, 100), "t").await.unwrap();
        let b = svc.create_slot(slot_input(project_id, 100), "t").await.unwrap();
        let first = svc.assign_employee(assign(a.slot.id, e1, 100, d(1, 1), d(6, 30)), "t").await.unwrap();
        svc.end_assignment(first.id, d(3, 31)).await.unwrap();

        let err = svc.assign_employee(assign(b.slot.id, e1, 100, d(2, 1), d(2, 28)), "t").await.unwrap_err();
        assert!(matches!(err, ServiceError::OverAllocated(_)), "{err}");
        // the slot's own capacity stays taken for January to March as well
        let err = svc.assign_employee(assign(a.slot.id, e2, 50, d(3, 1), d(3, 31)), "t").await.unwrap_err();
        assert!(matches!(err, ServiceError::OverAllocated(_)), "{err}");
        assert_eq!(svc.get_slot(a.slot.id).await.unwrap().remaining_allocation_pct, 0);

        svc.assign_employee(assign(b.slot.id, e1, 100, d(4, 1), d(4, 30)), "t").await.unwrap();
        svc.assign_employee(assign(a.slot.id, e2, 50, d(4, 1), d(6, 30)), "t").await.unwrap();
    }

    #[tokio::test]
    async fn save_from_stale_read_is_refused() {
        let (repo, project_id, e1, _) = seed();
        let svc = StaffingService::new(repo.clone(), 100);
        let slot = svc.create_slot(slot_input(project_id, 100), "t").await.unwrap();
        let read = svc.assign_employee(assign(slot.slot.id, e1, 40, d(1, 1), d(6, 30)), "t").await.unwrap();

        let patch = AssignmentPatch { expected_version: read.row_version, allocation_pct: Some(60), ..Default::default() };
        svc.update_assignment(read.id, patch).await.unwrap();

        let mut late = read.clone();
        late.allocation_pct = 20;
        late.row_version += 1;
        let err = repo.save_assignment(late, read.row_version).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err}");
        assert_eq!(svc.get_assignment(read.id).await.unwrap().allocation_pct, 60);
    }

    #[tokio::test]
    async fn slot_with_live_assignment_cannot_be_deleted() {
        let (repo, project_id, e1, _) = seed();
        let svc = StaffingService::new(repo, 100);
        let slot = svc.create_slot(slot_input(project_id, 100), "t").await.unwrap();
        let a = svc.assign_employee(assign(slot.slot.id, e1, 20, d(1, 1), d(1, 31)), "t").await.unwrap();
        assert!(svc.delete_slot(slot.slot.id).await.is_err());
        svc.cancel_assignment(a.id).await.unwrap();
        svc.delete_slot(slot.slot.id).await.unwrap();
        assert!(matches!(svc.get_slot(slot.slot.id).await, Err(ServiceError::NotFound(_))));
    }
}
