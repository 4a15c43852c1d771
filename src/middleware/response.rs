use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use crate::error::ApiError;

/// Successful handler output: a JSON body and its status
#[derive(Debug)]
pub struct ApiResponse {
    pub body: Value,
    pub status_code: StatusCode,
}

impl ApiResponse {
    /// 200 OK
    pub fn ok(body: Value) -> Self {
        Self::with_status(body, StatusCode::OK)
    }

    /// 201 Created
    pub fn created(body: Value) -> Self {
        Self::with_status(body, StatusCode::CREATED)
    }

    pub fn with_status(body: Value, status_code: StatusCode) -> Self {
        Self { body, status_code }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.body)).into_response()
    }
}

pub type ApiResult = Result<ApiResponse, ApiError>;
