//! Project tasks, their dependencies and the critical path.

pub mod critical_path;
pub mod tasks;

pub use critical_path::{critical_path, CriticalPath, Edge, PlanError, TaskNode, TaskSchedule};

#[cfg(test)]
mod tests {
    use super::tasks::*;
    use crate::errors::ServiceError;
    use crate::test_support::{get_db, staffed_project};
    use models::task::TaskStatus;

    #[tokio::test]
    async fn dependencies_drive_critical_path() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let f = staffed_project(&db).await?;
        let mut ids = Vec::new();
        for (name, days) in [("design", 5), ("build", 10), ("docs", 3), ("launch", 1)] {
            let t = create_task(&db, NewTask { project_id: f.project.id, name: name.into(), duration_days: days, assignee_id: None }, "t").await?;
            ids.push(t.id);
        }
        add_dependency(&db, ids[1], ids[0]).await?;
        add_dependency(&db, ids[2], ids[0]).await?;
        add_dependency(&db, ids[3], ids[1]).await?;
        let docs_to_launch = add_dependency(&db, ids[3], ids[2]).await?;

        assert!(matches!(add_dependency(&db, ids[0], ids[3]).await, Err(ServiceError::Validation(_))));
        assert!(matches!(add_dependency(&db, ids[3], ids[2]).await, Err(ServiceError::Conflict(_))));

        let cp = project_critical_path(&db, f.project.id).await?;
        assert_eq!(cp.task_ids, vec![ids[0], ids[1], ids[3]]);
        assert_eq!(cp.total_duration_days, 16);

        remove_dependency(&db, docs_to_launch.id).await?;
        delete_task(&db, ids[1]).await?;
        let cp = project_critical_path(&db, f.project.id).await?;
        assert_eq!(cp.task_ids, vec![ids[0], ids[2]]);
        assert_eq!(cp.total_duration_days, 8);

        let t = update_task_status(&db, ids[0], TaskStatus::InProgress).await?;
        assert_eq!(t.status, TaskStatus::InProgress);
        assert!(update_task_status(&db, ids[2], TaskStatus::Done).await.is_err());
        Ok(())
    }
}
