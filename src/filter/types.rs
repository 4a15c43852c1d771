use serde_json::Value;

use crate::models::{FieldDef, SqlType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub field: &'static FieldDef,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Positional parameters collected while rendering a statement.
/// Each placeholder is cast to the column type so that JSON-typed binds
/// (strings, numbers) compare correctly against uuid/timestamptz columns.
#[derive(Debug, Default)]
pub struct Params {
    values: Vec<Value>,
    aliases: usize,
}

impl Params {
    pub fn push(&mut self, value: Value, sql_type: SqlType) -> String {
        self.values.push(value);
        format!("${}::{}", self.values.len(), sql_type.cast())
    }

    /// Fresh table alias for a correlated sub-query
    pub fn next_alias(&mut self) -> String {
        self.aliases += 1;
        format!("r{}", self.aliases)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
