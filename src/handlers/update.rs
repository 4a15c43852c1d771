use std::sync::Arc;

use axum::extract::Path;
use axum::routing::{patch, MethodRouter};
use serde_json::Value;

use super::extract::{parse_id, JsonBody};
use super::{into_data, HandlerConfig};
use crate::database::UpdateArgs;
use crate::middleware::{ApiResponse, ApiResult};

/// PATCH by id with a body validated by the input schema
pub fn update_handler(config: HandlerConfig) -> MethodRouter {
    let config = Arc::new(config);
    patch(move |Path(id): Path<String>, JsonBody(body): JsonBody| {
        let config = config.clone();
        async move { update(&config, &id, body).await }
    })
}

async fn update(config: &HandlerConfig, id: &str, body: Value) -> ApiResult {
    let id = parse_id(id)?;
    let data = into_data(config.parse_input(&body)?)?;
    let updated = config.model.update(UpdateArgs { id, data }).await?;
    Ok(ApiResponse::ok(config.shape(updated, false)?))
}
