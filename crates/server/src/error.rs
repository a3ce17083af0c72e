use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shelf_core::{ApplicationError, InterfaceError, ValidationErrors};
use shelf_db::repositories::RepositoryError;
use tracing::error;
use uuid::Uuid;

/// Echoes the id that store failures are logged under.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Handler-boundary error. Store detail is logged here and never rendered.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    pub fn not_found(raw_id: &str) -> Self {
        ApplicationError::NotFound(raw_id.to_string()).into()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = Uuid::new_v4().simple().to_string();
        if let ApplicationError::Persistence(detail) = &value {
            error!(
                event_name = "catalog.store.error",
                correlation_id = %correlation_id,
                error = %detail,
                "product store operation failed"
            );
        }
        Self(value.into_interface(correlation_id))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string()).into()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(value: ValidationErrors) -> Self {
        ApplicationError::Validation(value).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.user_message();
        let correlation_id = HeaderValue::from_str(self.0.correlation_id()).ok();
        let mut response = match self.0 {
            InterfaceError::Unprocessable { errors, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND.into_response(),
            InterfaceError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        };
        if let Some(value) = correlation_id {
            response.headers_mut().insert(CORRELATION_HEADER, value);
        }
        response
    }
}
