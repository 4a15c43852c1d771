use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::routing::{get, post, MethodRouter};
use serde_json::{json, Value};

use super::extract::{parse_id, LenientBody};
use super::HandlerConfig;
use crate::database::FindUniqueArgs;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::{parse_param, parse_query_params, QuerySource};

/// GET one by id. `select` and `include` may be passed in the query string.
pub fn read_one_handler(config: HandlerConfig) -> MethodRouter {
    let config = Arc::new(config);
    get(
        move |Path(id): Path<String>, Query(query): Query<HashMap<String, String>>| {
            let config = config.clone();
            async move { read_one(&config, &id, QuerySource::Query(query)).await }
        },
    )
}

/// GET list with where/select/include/orderBy and pagination from the query string
pub fn read_many_handler(config: HandlerConfig) -> MethodRouter {
    let config = Arc::new(config);
    get(move |Query(query): Query<HashMap<String, String>>| {
        let config = config.clone();
        async move { read_many(&config, QuerySource::Query(query)).await }
    })
}

/// POST list taking the same parameters as a JSON body
pub fn find_handler(config: HandlerConfig) -> MethodRouter {
    let config = Arc::new(config);
    post(move |LenientBody(body): LenientBody| {
        let config = config.clone();
        async move { read_many(&config, QuerySource::Body(body)).await }
    })
}

async fn read_one(config: &HandlerConfig, id: &str, source: QuerySource) -> ApiResult {
    let id = parse_id(id)?;
    let select = parse_param(&source, "select", config.select);
    let include = parse_param(&source, "include", config.include);
    let selected = select.is_some();

    let record = config
        .model
        .find_unique(FindUniqueArgs { id, select, include })
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(ApiResponse::ok(config.shape(record, selected)?))
}

async fn read_many(config: &HandlerConfig, source: QuerySource) -> ApiResult {
    let params = parse_query_params(&source, &config.query_schemas());
    let selected = params.select.is_some();

    let records = config.model.find_many(params.find_many_args()).await?;

    let mut pagination = params.pagination.clone();
    if params.include_total_count {
        let total = config.model.count(params.count_args()).await?;
        pagination = pagination.with_total(total);
    }

    let data = records
        .into_iter()
        .map(|r| config.shape(r, selected))
        .collect::<Result<Vec<Value>, ApiError>>()?;

    Ok(ApiResponse::ok(json!({
        "data": data,
        "pagination": pagination,
    })))
}
