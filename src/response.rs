use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// A single field-scoped error, e.g. `{ field: "email", message: "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Envelope returned by every service-layer operation. `errors` is populated
/// only when `success` is false.
#[derive(Debug)]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub message: String,
    pub errors: Option<Vec<FieldError>>,
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
            data: Some(data),
        }
    }

    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
            data: None,
        }
    }

    pub fn fail(
        message: impl Into<String>,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::fail_with(message, vec![FieldError::new(field, detail)])
    }

    pub fn fail_with(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: Some(errors),
            data: None,
        }
    }

    /// Flatten into the boundary-facing envelope. Field errors are joined
    /// into the single `error` string clients display.
    pub fn into_api(self) -> ApiResponse<T> {
        let error = if self.success {
            None
        } else {
            Some(
                self.errors
                    .as_deref()
                    .filter(|e| !e.is_empty())
                    .map(|e| {
                        e.iter()
                            .map(|e| e.message.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )
        };
        ApiResponse {
            success: self.success,
            message: self.message,
            error,
            data: self.data,
        }
    }
}

/// Envelope every HTTP response is wrapped in.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            data: Some(data),
        }
    }

    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            data: None,
        }
    }

    pub fn fail(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
            data: None,
        }
    }
}

/// Faults that escape the service layer. Business rejections never take this
/// path; they travel as `ServiceResponse` values.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), msg),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Insufficient permissions".to_string(),
                "Insufficient permissions".to_string(),
            ),
            ApiError::Internal(err) => {
                error!(error = %err, "unhandled internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    err.to_string(),
                )
            }
        };
        let body = ApiResponse::<()> {
            success: false,
            message,
            error: Some(detail),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_has_no_errors() {
        let resp = ServiceResponse::ok("Login successful", 42);
        assert!(resp.success);
        assert!(resp.errors.is_none());

        let api = resp.into_api();
        assert!(api.error.is_none());
        assert_eq!(api.data, Some(42));
    }

    #[test]
    fn failure_envelope_joins_field_errors() {
        let resp: ServiceResponse<()> = ServiceResponse::fail_with(
            "Validation failed",
            vec![
                FieldError::new("email", "Email is required"),
                FieldError::new("phone_number", "Phone number is required"),
            ],
        );
        let api = resp.into_api();
        assert!(!api.success);
        assert_eq!(
            api.error.as_deref(),
            Some("Email is required, Phone number is required")
        );
        assert!(api.data.is_none());
    }

    #[test]
    fn failure_without_details_reports_unknown_error() {
        let resp: ServiceResponse<()> = ServiceResponse::fail_with("Something failed", vec![]);
        let api = resp.into_api();
        assert_eq!(api.error.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn api_envelope_serializes_null_fields() {
        let api = ApiResponse::<()>::ok_empty("Logged out successfully");
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["error"], serde_json::Value::Null);
        assert_eq!(json["data"], serde_json::Value::Null);
    }
}
