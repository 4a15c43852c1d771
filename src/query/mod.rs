//! Translates list-request parameters into store arguments.
//!
//! Parameters come from the query string (GET) or a JSON body (find). Each of
//! `where`, `select`, `include` and `orderBy` is JSON-decoded when it arrives
//! as a string and then validated against the schema configured for it.
//! Anything malformed is dropped rather than rejected.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::CONFIG;
use crate::database::{CountArgs, FindManyArgs};
use crate::models::base::CONTROL_KEYS;
use crate::schema::Schema;

/// Where list parameters are read from
#[derive(Debug, Clone)]
pub enum QuerySource {
    Query(HashMap<String, String>),
    Body(Value),
}

impl QuerySource {
    fn get(&self, key: &str) -> Option<Value> {
        match self {
            QuerySource::Query(map) => map.get(key).map(|s| Value::String(s.clone())),
            QuerySource::Body(Value::Object(obj)) => obj.get(key).cloned(),
            QuerySource::Body(_) => None,
        }
    }
}

/// Schemas a list endpoint validates its parameters with
#[derive(Debug, Clone, Copy, Default)]
pub struct QuerySchemas {
    pub where_schema: Option<&'static Schema>,
    pub select: Option<&'static Schema>,
    pub include: Option<&'static Schema>,
    pub order_by: Option<&'static Schema>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub skip: i64,
    pub take: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page,
            limit,
            skip: (page - 1).saturating_mul(limit),
            take: limit,
            total_count: None,
            total_pages: None,
        }
    }

    pub fn with_total(mut self, total_count: i64) -> Self {
        self.total_count = Some(total_count);
        self.total_pages = Some(total_pages(total_count, self.limit));
        self
    }
}

/// Ceiling of `total / limit`
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Row filter with every control key removed
    pub where_clause: Option<Value>,
    pub select: Option<Value>,
    pub include: Option<Value>,
    pub order_by: Option<Value>,
    pub pagination: Pagination,
    pub include_total_count: bool,
}

impl QueryParams {
    pub fn find_many_args(&self) -> FindManyArgs {
        FindManyArgs {
            where_clause: self.where_clause.clone(),
            select: self.select.clone(),
            include: self.include.clone(),
            order_by: self.order_by.clone(),
            skip: Some(self.pagination.skip),
            take: Some(self.pagination.take),
        }
    }

    pub fn count_args(&self) -> CountArgs {
        CountArgs { where_clause: self.where_clause.clone() }
    }
}

pub fn parse_query_params(source: &QuerySource, schemas: &QuerySchemas) -> QueryParams {
    let where_value = parse_param(source, "where", schemas.where_schema);
    let select = parse_param(source, "select", schemas.select);
    let include = parse_param(source, "include", schemas.include);
    let order_by = parse_param(source, "orderBy", schemas.order_by);

    let page = positive(where_value.as_ref().and_then(|w| w.get("page"))).unwrap_or(1);
    let limit = positive(where_value.as_ref().and_then(|w| w.get("limit")))
        .unwrap_or(CONFIG.query.default_limit);

    let include_total_count = where_value
        .as_ref()
        .and_then(|w| w.get("includeTotalCount"))
        .map(truthy)
        .unwrap_or(false)
        || source.get("includeTotalCount").as_ref().map(truthy).unwrap_or(false);

    QueryParams {
        where_clause: where_value.and_then(strip_control_keys),
        select,
        include,
        order_by,
        pagination: Pagination::new(page, limit),
        include_total_count,
    }
}

/// Decode and validate one parameter; `None` when absent, unconfigured or bad
pub fn parse_param(source: &QuerySource, key: &str, schema: Option<&'static Schema>) -> Option<Value> {
    let schema = schema?;
    let raw = source.get(key)?;
    let decoded = match raw {
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(v) => v,
            Err(e) => {
                debug!("Ignoring malformed {} parameter: {}", key, e);
                return None;
            }
        },
        other => other,
    };
    match schema.parse(&decoded) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Ignoring invalid {} parameter: {}", key, e);
            None
        }
    }
}

fn strip_control_keys(where_value: Value) -> Option<Value> {
    match where_value {
        Value::Object(mut obj) => {
            for key in CONTROL_KEYS {
                obj.remove(*key);
            }
            if obj.is_empty() {
                None
            } else {
                Some(Value::Object(obj))
            }
        }
        _ => None,
    }
}

fn positive(value: Option<&Value>) -> Option<i64> {
    let n = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    (n > 0).then_some(n)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}
