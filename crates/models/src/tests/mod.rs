//! Database-backed entity tests. Each test returns early when
//! `SKIP_DB_TESTS` is set or no database answers on `DATABASE_URL`.

mod crud_tests;
mod transaction_tests;

use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use crate::db::{connect_with_config, DATABASE_URL};

static SYNCED: OnceCell<bool> = OnceCell::const_new();

fn test_config() -> configs::DatabaseConfig {
    configs::DatabaseConfig {
        url: DATABASE_URL.clone(),
        min_connections: 1,
        connect_timeout_secs: 3,
        acquire_timeout_secs: 5,
        sqlx_logging: false,
        ..Default::default()
    }
}

pub(crate) async fn test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let ready = *SYNCED
        .get_or_init(|| async {
            match connect_with_config(&test_config()).await {
                Ok(db) => crate::schema::sync(&db).await.is_ok(),
                Err(_) => false,
            }
        })
        .await;
    if !ready {
        return None;
    }
    connect_with_config(&test_config()).await.ok()
}

pub(crate) fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &uuid::Uuid::new_v4().simple().to_string()[..10]).to_ascii_uppercase()
}
