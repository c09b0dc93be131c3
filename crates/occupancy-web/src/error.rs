//! HTTP 错误响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use occupancy_core::OccupancyError;
use serde_json::json;
use tracing::error;

/// 包装核心错误以实现 `IntoResponse`
#[derive(Debug)]
pub struct ApiError(pub OccupancyError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            OccupancyError::Network(_) | OccupancyError::Backend { .. } => StatusCode::BAD_GATEWAY,
            OccupancyError::Validation(_) => StatusCode::BAD_REQUEST,
            OccupancyError::Auth(_) => StatusCode::UNAUTHORIZED,
            OccupancyError::NotFound(_) => StatusCode::NOT_FOUND,
            OccupancyError::InvalidCapacity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OccupancyError::Workflow(_) | OccupancyError::InvalidStateTransition { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OccupancyError> for ApiError {
    fn from(err: OccupancyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = json!({
            "error": true,
            "kind": self.0.kind(),
            "message": self.0.user_message(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
