use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use models::{actual_assignment, employee, planned_team_slot, project, time_entry};

use crate::audit::update_versioned;
use crate::errors::ServiceError;
use crate::staffing::repository::StaffingRepository;

pub struct SeaOrmStaffingRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl StaffingRepository for SeaOrmStaffingRepository {
    async fn project(&self, id: Uuid) -> Result<Option<project::Model>, ServiceError> {
        Ok(project::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn employee(&self, id: Uuid) -> Result<Option<employee::Model>, ServiceError> {
        Ok(employee::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn slot(&self, id: Uuid) -> Result<Option<planned_team_slot::Model>, ServiceError> {
        Ok(planned_team_slot::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn slots_for_project(&self, project_id: Uuid) -> Result<Vec<planned_team_slot::Model>, ServiceError> {
        Ok(planned_team_slot::Entity::find()
            .filter(planned_team_slot::Column::ProjectId.eq(project_id))
            .order_by_asc(planned_team_slot::Column::StartDate)
            .order_by_asc(planned_team_slot::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn insert_slot(&self, slot: planned_team_slot::Model) -> Result<planned_team_slot::Model, ServiceError> {
        let am: planned_team_slot::ActiveModel = slot.into();
        Ok(am.reset_all().insert(&self.db).await?)
    }

    async fn delete_slot(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = planned_team_slot::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn assignment(&self, id: Uuid) -> Result<Option<actual_assignment::Model>, ServiceError> {
        Ok(actual_assignment::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn assignments_for_slot(&self, slot_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError> {
        Ok(actual_assignment::Entity::find()
            .filter(actual_assignment::Column::SlotId.eq(slot_id))
            .all(&self.db)
            .await?)
    }

    async fn assignments_for_employee(&self, employee_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError> {
        Ok(actual_assignment::Entity::find()
            .filter(actual_assignment::Column::EmployeeId.eq(employee_id))
            .order_by_asc(actual_assignment::Column::StartDate)
            .all(&self.db)
            .await?)
    }

    async fn assignments_for_project(&self, project_id: Uuid) -> Result<Vec<actual_assignment::Model>, ServiceError> {
        Ok(actual_assignment::Entity::find()
            .filter(actual_assignment::Column::ProjectId.eq(project_id))
            .order_by_asc(actual_assignment::Column::StartDate)
            .all(&self.db)
            .await?)
    }

    async fn insert_assignment(&self, a: actual_assignment::Model) -> Result<actual_assignment::Model, ServiceError> {
        let am: actual_assignment::ActiveModel = a.into();
        Ok(am.reset_all().insert(&self.db).await?)
    }

    async fn save_assignment(&self, a: actual_assignment::Model, expected_version: i32) -> Result<actual_assignment::Model, ServiceError> {
        let am: actual_assignment::ActiveModel = a.into();
        update_versioned(&self.db, am.reset_all(), actual_assignment::Column::RowVersion, expected_version).await
    }

    async fn time_entry_count(&self, assignment_id: Uuid) -> Result<u64, ServiceError> {
        Ok(time_entry::Entity::find()
            .filter(time_entry::Column::AssignmentId.eq(assignment_id))
            .count(&self.db)
            .await?)
    }
}
