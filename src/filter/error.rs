use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Unknown field '{field}' on model {model}")]
    UnknownField { model: &'static str, field: String },

    #[error("Unknown relation '{relation}' on model {model}")]
    UnknownRelation { model: &'static str, relation: String },

    #[error("Field '{0}' cannot be written")]
    ReadOnlyField(String),

    #[error("Invalid WHERE clause: {0}")]
    InvalidWhereClause(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid selection: {0}")]
    InvalidSelect(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),
}
