use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use configs::AppConfig;
use sea_orm::DatabaseConnection;
use service::staffing::repo::seaorm::SeaOrmStaffingRepository;
use service::staffing::StaffingService;

pub const ACTOR_HEADER: &str = "x-actor";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub settings: Arc<AppConfig>,
    pub staffing: Arc<StaffingService<SeaOrmStaffingRepository>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: AppConfig) -> Self {
        let staffing = StaffingService::new(
            Arc::new(SeaOrmStaffingRepository { db: db.clone() }),
            settings.business.max_allocation_pct,
        );
        Self { db, settings: Arc::new(settings), staffing: Arc::new(staffing) }
    }
}

/// Name of the caller, taken from `X-Actor` and recorded in `created_by`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn as_str(&self) -> &str { &self.0 }

    fn from_header(value: Option<&str>) -> Self {
        Actor(models::audit::actor_or_system(value))
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(ACTOR_HEADER).and_then(|v| v.to_str().ok());
        Ok(Actor::from_header(header))
    }
}
