use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::schema::error::{IssueCode, ValidationError};

/// JSON request body. Malformed JSON is a validation error; the content type
/// is not checked.
#[derive(Debug)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::from(ValidationError::invalid_json(e.to_string())).into_response())
    }
}

/// JSON request body where anything unreadable counts as no body
#[derive(Debug)]
pub struct LenientBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for LenientBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(LenientBody(serde_json::from_slice(&bytes).unwrap_or(Value::Null)))
    }
}

/// Path id as a UUID, or a validation error against `id`
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ValidationError::single(
            IssueCode::InvalidString,
            "Invalid uuid",
            vec![Value::String("id".to_string())],
        )
        .into()
    })
}
