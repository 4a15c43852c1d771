//! The persistence seam every handler talks to.
//!
//! Arguments mirror the JSON shapes the HTTP layer produces: where-objects,
//! select/include maps and orderBy values stay as `serde_json::Value` and are
//! compiled by the store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::filter::FilterError;
use crate::models::ModelDescriptor;

pub const RECORD_NOT_FOUND: &str = "RECORD_NOT_FOUND";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateArgs {
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyArgs {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindUniqueArgs {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateArgs {
    pub id: Uuid,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteArgs {
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountArgs {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Value>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A failure the client caused: constraint violations, bad input values,
    /// writes against a missing row.
    #[error("{code}: {message}")]
    Known {
        code: String,
        message: String,
        meta: Value,
    },

    #[error(transparent)]
    InvalidQuery(#[from] FilterError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl StoreError {
    pub fn record_not_found(model: &str) -> Self {
        StoreError::Known {
            code: RECORD_NOT_FOUND.to_string(),
            message: format!("No {} record found for the given id", model),
            meta: serde_json::json!({ "model": model }),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(code) = db.code() {
                return StoreError::Known {
                    code: code.to_string(),
                    message: db.message().to_string(),
                    meta: serde_json::json!({
                        "kind": format!("{:?}", db.kind()),
                        "constraint": db.constraint(),
                        "table": db
                            .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                            .and_then(|pg| pg.table()),
                    }),
                };
            }
        }
        StoreError::Sqlx(err)
    }
}

/// Per-model query interface
#[async_trait]
pub trait ModelStore: Send + Sync {
    fn descriptor(&self) -> &'static ModelDescriptor;

    async fn create(&self, args: CreateArgs) -> Result<Value, StoreError>;

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Value>, StoreError>;

    async fn find_unique(&self, args: FindUniqueArgs) -> Result<Option<Value>, StoreError>;

    /// Fails with `RECORD_NOT_FOUND` when the id does not exist
    async fn update(&self, args: UpdateArgs) -> Result<Value, StoreError>;

    /// Fails with `RECORD_NOT_FOUND` when the id does not exist
    async fn delete(&self, args: DeleteArgs) -> Result<Value, StoreError>;

    async fn count(&self, args: CountArgs) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait StoreClient: Send + Sync {
    fn user(&self) -> Arc<dyn ModelStore>;

    fn post(&self) -> Arc<dyn ModelStore>;

    async fn ping(&self) -> Result<(), StoreError>;
}
