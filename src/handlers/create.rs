use std::sync::Arc;

use axum::routing::{post, MethodRouter};
use tracing::debug;

use super::extract::JsonBody;
use super::{into_data, HandlerConfig};
use crate::database::CreateArgs;
use crate::middleware::{ApiResponse, ApiResult};

/// POST: validate the body, create the record, answer 201 with it
pub fn create_handler(config: HandlerConfig) -> MethodRouter {
    let config = Arc::new(config);
    post(move |JsonBody(body): JsonBody| {
        let config = config.clone();
        async move { create(&config, body).await }
    })
}

async fn create(config: &HandlerConfig, body: serde_json::Value) -> ApiResult {
    let data = into_data(config.parse_input(&body)?)?;
    let created = config.model.create(CreateArgs { data }).await?;
    debug!("Created {} record", config.model.descriptor().name);
    Ok(ApiResponse::created(config.shape(created, false)?))
}
