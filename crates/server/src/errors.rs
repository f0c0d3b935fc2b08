use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// JSON error body returned by every handler.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(detail.into()))
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg)),
            ServiceError::NotFound(msg) => JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            ServiceError::Conflict(msg) => JsonApiError::new(StatusCode::CONFLICT, "Conflict", Some(msg)),
            ServiceError::OverAllocated(msg) => JsonApiError::new(StatusCode::CONFLICT, "Allocation Exceeded", Some(msg)),
            ServiceError::InvalidState(msg) => JsonApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Invalid State", Some(msg)),
            ServiceError::Db(msg) => {
                error!(err = %msg, "database failure");
                // driver messages stay in the log
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
            }
            ServiceError::Internal(msg) => {
                error!(err = %msg, "internal failure");
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            warn!(status = self.status.as_u16(), title = self.title, detail = ?self.detail, "request rejected");
        }
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::validation("x"), StatusCode::BAD_REQUEST),
            (ServiceError::not_found("client"), StatusCode::NOT_FOUND),
            (ServiceError::conflict("stale"), StatusCode::CONFLICT),
            (ServiceError::OverAllocated("employee E1: peak 60%".into()), StatusCode::CONFLICT),
            (ServiceError::InvalidState("paid".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Db("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Internal("json encoding failed".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn db_detail_is_not_exposed() {
        let e = JsonApiError::from(ServiceError::Db("password authentication failed".into()));
        let body = serde_json::to_value(&e).unwrap();
        assert_eq!(body["title"], "Internal Server Error");
        assert!(body.get("detail").is_none());
    }
}
