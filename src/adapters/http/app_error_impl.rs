use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-side failures are errors; rejected requests are expected traffic.
        match &self {
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::CorruptChain(_)
            | AppError::ProviderUnavailable(_) => tracing::error!(error = ?self, "Request failed"),
            _ => tracing::debug!(error = ?self, "Request rejected"),
        }

        let code = self.code();
        match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::CorruptChain(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
            AppError::InvalidInput(msg) | AppError::InvalidHost(msg) => {
                error_resp(StatusCode::BAD_REQUEST, code, Some(msg))
            }
            err @ AppError::InvalidStatusCode(_) => {
                error_resp(StatusCode::BAD_REQUEST, code, Some(err.to_string()))
            }
            AppError::DuplicateHost(host) => error_resp(
                StatusCode::CONFLICT,
                code,
                Some(format!("{host} is already registered")),
            ),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, code, None),
            AppError::InvalidOperation(msg) => {
                error_resp(StatusCode::UNPROCESSABLE_ENTITY, code, Some(msg))
            }
            AppError::RedirectCycle => error_resp(StatusCode::UNPROCESSABLE_ENTITY, code, None),
            AppError::ProviderUnavailable(_) => {
                error_resp(StatusCode::SERVICE_UNAVAILABLE, code, None)
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
