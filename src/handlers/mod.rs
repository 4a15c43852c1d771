//! Handler factories.
//!
//! Each factory takes a [`HandlerConfig`] (the model's store plus whichever
//! schemas the endpoint validates with) and returns an axum `MethodRouter`
//! that can be mounted on a path or merged with the other factories.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::database::ModelStore;
use crate::error::ApiError;
use crate::query::QuerySchemas;
use crate::schema::error::{IssueCode, ValidationError};
use crate::schema::Schema;

pub mod create;
pub mod delete;
pub mod extract;
pub mod read;
pub mod update;

pub use create::create_handler;
pub use delete::delete_handler;
pub use read::{find_handler, read_many_handler, read_one_handler};
pub use update::update_handler;

#[derive(Clone)]
pub struct HandlerConfig {
    pub model: Arc<dyn ModelStore>,
    pub input: Option<&'static Schema>,
    pub output: Option<&'static Schema>,
    pub where_schema: Option<&'static Schema>,
    pub select: Option<&'static Schema>,
    pub include: Option<&'static Schema>,
    pub order_by: Option<&'static Schema>,
}

impl HandlerConfig {
    pub fn new(model: Arc<dyn ModelStore>) -> Self {
        Self {
            model,
            input: None,
            output: None,
            where_schema: None,
            select: None,
            include: None,
            order_by: None,
        }
    }

    pub fn input(mut self, schema: &'static Schema) -> Self {
        self.input = Some(schema);
        self
    }

    pub fn output(mut self, schema: &'static Schema) -> Self {
        self.output = Some(schema);
        self
    }

    pub fn where_schema(mut self, schema: &'static Schema) -> Self {
        self.where_schema = Some(schema);
        self
    }

    pub fn select(mut self, schema: &'static Schema) -> Self {
        self.select = Some(schema);
        self
    }

    pub fn include(mut self, schema: &'static Schema) -> Self {
        self.include = Some(schema);
        self
    }

    pub fn order_by(mut self, schema: &'static Schema) -> Self {
        self.order_by = Some(schema);
        self
    }

    pub fn query_schemas(&self) -> QuerySchemas {
        QuerySchemas {
            where_schema: self.where_schema,
            select: self.select,
            include: self.include,
            order_by: self.order_by,
        }
    }

    /// Validate a request body with the input schema; no schema passes it through
    pub fn parse_input(&self, body: &Value) -> Result<Value, ApiError> {
        match self.input {
            Some(schema) => Ok(schema.parse(body)?),
            None => Ok(body.clone()),
        }
    }

    /// Validate a record with the output schema. A record read under a
    /// `select` only carries the chosen fields, so every field is optional.
    pub fn shape(&self, record: Value, selected: bool) -> Result<Value, ApiError> {
        match self.output {
            Some(schema) if selected => Ok(schema.parse_partial(&record)?),
            Some(schema) => Ok(schema.parse(&record)?),
            None => Ok(record),
        }
    }
}

/// Object body as store data; anything else is a type error at the root
pub(crate) fn into_data(value: Value) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::single(IssueCode::InvalidType, "Expected object", vec![]).into()),
    }
}
