use std::sync::Arc;

use axum::extract::Path;
use axum::routing::{delete, MethodRouter};
use serde_json::json;

use super::extract::parse_id;
use super::HandlerConfig;
use crate::database::DeleteArgs;
use crate::middleware::{ApiResponse, ApiResult};

/// DELETE by id, answering `{ "success": true }`
pub fn delete_handler(config: HandlerConfig) -> MethodRouter {
    let config = Arc::new(config);
    delete(move |Path(id): Path<String>| {
        let config = config.clone();
        async move { remove(&config, &id).await }
    })
}

async fn remove(config: &HandlerConfig, id: &str) -> ApiResult {
    let id = parse_id(id)?;
    config.model.delete(DeleteArgs { id }).await?;
    Ok(ApiResponse::ok(json!({ "success": true })))
}
