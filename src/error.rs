// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::StoreError;
use crate::filter::FilterError;
use crate::schema::error::ValidationError;

/// Every failure a handler can report, one variant per response tier
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request: input failed schema validation
    Validation(ValidationError),

    // 400 Bad Request: the store rejected the operation
    Store {
        code: String,
        message: String,
        meta: Value,
    },

    // 404 Not Found
    NotFound,

    // 500 Internal Server Error: a named failure with a message
    Runtime { name: String, message: String },

    // 500 Internal Server Error: anything else
    Unknown(Value),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Store { .. } => 400,
            ApiError::NotFound => 404,
            ApiError::Runtime { .. } => 500,
            ApiError::Unknown(_) => 500,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation(err) => json!({
                "error": "Validation error",
                "details": err.details(),
            }),
            ApiError::Store { code, message, meta } => json!({
                "error": "Database error",
                "code": code,
                "message": message,
                "meta": meta,
            }),
            ApiError::NotFound => json!({ "error": "Not found" }),
            ApiError::Runtime { name, message } => json!({
                "error": name,
                "message": message,
            }),
            ApiError::Unknown(details) => json!({
                "error": "Unknown error",
                "details": details,
            }),
        }
    }
}

impl ApiError {
    pub fn runtime(name: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Runtime { name: name.into(), message: message.into() }
    }

    pub fn unknown(details: impl Into<Value>) -> Self {
        ApiError::Unknown(details.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::runtime("QueryError", err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Known { code, message, meta } => ApiError::Store { code, message, meta },
            StoreError::InvalidQuery(e) => e.into(),
            StoreError::Sqlx(e) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", e);
                ApiError::runtime("DatabaseError", "Database error occurred")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(err) => write!(f, "Validation error: {}", err),
            ApiError::Store { code, message, .. } => write!(f, "Database error {}: {}", code, message),
            ApiError::NotFound => write!(f, "Not found"),
            ApiError::Runtime { name, message } => write!(f, "{}: {}", name, message),
            ApiError::Unknown(details) => write!(f, "Unknown error: {}", details),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
