#![cfg(test)]
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use configs::{AppConfig, DatabaseConfig};
use models::db::connect_with_config;

// Schema sync runs once per test process; `false` means no database is reachable.
static SYNCED: OnceCell<bool> = OnceCell::const_new();

fn test_config() -> DatabaseConfig {
    let mut cfg = AppConfig::load_and_validate().map(|c| c.database).unwrap_or_default();
    cfg.normalize_from_env();
    if cfg.url.is_empty() {
        cfg.url = models::db::DATABASE_URL.clone();
    }
    cfg.max_connections = cfg.max_connections.max(5);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.connect_timeout_secs = 3;
    cfg.acquire_timeout_secs = 5;
    cfg.sqlx_logging = false;
    cfg
}

/// A connection for the current test's runtime, or `None` when
/// `SKIP_DB_TESTS` is set or no database answers.
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(None);
    }
    let ready = *SYNCED
        .get_or_init(|| async {
            match connect_with_config(&test_config()).await {
                Ok(db) => models::schema::sync(&db).await.is_ok(),
                Err(_) => false,
            }
        })
        .await;
    if !ready {
        return Ok(None);
    }
    Ok(Some(connect_with_config(&test_config()).await?))
}

/// Unique suffix for codes that carry a unique index.
pub fn unique(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..10]).to_ascii_uppercase()
}

/// A client with an active project, one employee and one assignment.
pub struct StaffedProject {
    pub client: models::client::Model,
    pub project: models::project::Model,
    pub employee: models::employee::Model,
    pub slot: models::planned_team_slot::Model,
    pub assignment: models::actual_assignment::Model,
}

/// Seed a project running through 2025 with one employee on a half-time
/// assignment for the first six months. Monthly cost 10 000, billing rate 100.
pub async fn staffed_project(db: &DatabaseConnection) -> Result<StaffedProject, anyhow::Error> {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::staffing::domain::{NewAssignment, NewSlot};
    use crate::staffing::repo::seaorm::SeaOrmStaffingRepository;
    use crate::staffing::StaffingService;
    use crate::{clients, employees, projects};

    let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).ok_or_else(|| anyhow::anyhow!("bad date"));
    let client = clients::create_client(db, models::client::NewClient { name: unique("client"), ..Default::default() }, "test").await?;
    let project = projects::create_project(
        db,
        projects::NewProject {
            client_id: client.id,
            code: unique("prj"),
            name: "Fixture project".into(),
            start_date: d(1, 1)?,
            end_date: d(12, 31)?,
            budget_amount: dec!(120000),
        },
        "test",
    )
    .await?;
    let project = projects::change_project_status(db, project.id, project.row_version, models::project::ProjectStatus::Active).await?;
    let employee = employees::create_employee(
        db,
        models::employee::NewEmployee {
            code: unique("emp"),
            full_name: "Fixture Employee".into(),
            email: "fixture@example.com".into(),
            designation: "Consultant".into(),
            monthly_salary: dec!(8000),
            monthly_incentive: dec!(1000),
            monthly_commission_share: dec!(1000),
            billing_rate: dec!(100),
        },
        "test",
    )
    .await?;

    let staffing = StaffingService::new(Arc::new(SeaOrmStaffingRepository { db: db.clone() }), 100);
    let slot = staffing
        .create_slot(
            NewSlot {
                project_id: project.id,
                role: "Consultant".into(),
                planned_allocation_pct: 50,
                start_date: d(1, 1)?,
                end_date: d(6, 30)?,
                monthly_salary: dec!(8000),
                monthly_incentive: dec!(1000),
                monthly_commission_share: dec!(1000),
            },
            "test",
        )
        .await?
        .slot;
    let assignment = staffing
        .assign_employee(
            NewAssignment { slot_id: slot.id, employee_id: employee.id, allocation_pct: 50, start_date: d(1, 1)?, end_date: d(6, 30)? },
            "test",
        )
        .await?;
    Ok(StaffedProject { client, project, employee, slot, assignment })
}
