use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::FilterError;
use super::filter::select_list;
use super::types::{Params, SqlResult};
use crate::models::{FieldDef, ModelDescriptor, SqlType};

/// INSERT/UPDATE/DELETE statements. Each one returns the affected row as
/// JSON through a `RETURNING` CTE so writes and reads share a row shape.
pub struct Mutation;

impl Mutation {
    /// Missing columns fall back to their table defaults. The primary key is
    /// always generated here.
    pub fn insert(
        model: &'static ModelDescriptor,
        data: &Map<String, Value>,
        returning: &[&'static FieldDef],
    ) -> Result<SqlResult, FilterError> {
        let mut params = Params::default();
        let mut columns = vec![format!("\"{}\"", model.id_field().column)];
        let mut values = vec![params.push(Value::String(Uuid::new_v4().to_string()), SqlType::Uuid)];

        for (field, value) in writable_fields(model, data)? {
            columns.push(format!("\"{}\"", field.column));
            values.push(params.push(value.clone(), field.sql_type));
        }

        let query = format!(
            "WITH w AS (INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING {}) SELECT row_to_json(w) AS row FROM w",
            model.table,
            columns.join(", "),
            values.join(", "),
            select_list(None, returning)
        );
        Ok(SqlResult { query, params: params.into_values() })
    }

    /// Updates by primary key and refreshes `updated_at`
    pub fn update(
        model: &'static ModelDescriptor,
        id: Uuid,
        data: &Map<String, Value>,
        returning: &[&'static FieldDef],
    ) -> Result<SqlResult, FilterError> {
        let mut params = Params::default();
        let mut assignments = Vec::new();

        for (field, value) in writable_fields(model, data)? {
            assignments.push(format!("\"{}\" = {}", field.column, params.push(value.clone(), field.sql_type)));
        }
        if let Some(updated) = model.field("updatedAt") {
            assignments.push(format!("\"{}\" = now()", updated.column));
        }

        let id_field = model.id_field();
        let id_param = params.push(Value::String(id.to_string()), id_field.sql_type);
        let query = format!(
            "WITH w AS (UPDATE \"{}\" SET {} WHERE \"{}\" = {} RETURNING {}) SELECT row_to_json(w) AS row FROM w",
            model.table,
            assignments.join(", "),
            id_field.column,
            id_param,
            select_list(None, returning)
        );
        Ok(SqlResult { query, params: params.into_values() })
    }

    pub fn delete(
        model: &'static ModelDescriptor,
        id: Uuid,
        returning: &[&'static FieldDef],
    ) -> SqlResult {
        let mut params = Params::default();
        let id_field = model.id_field();
        let id_param = params.push(Value::String(id.to_string()), id_field.sql_type);
        let query = format!(
            "WITH w AS (DELETE FROM \"{}\" WHERE \"{}\" = {} RETURNING {}) SELECT row_to_json(w) AS row FROM w",
            model.table,
            id_field.column,
            id_param,
            select_list(None, returning)
        );
        SqlResult { query, params: params.into_values() }
    }
}

fn writable_fields<'d>(
    model: &'static ModelDescriptor,
    data: &'d Map<String, Value>,
) -> Result<Vec<(&'static FieldDef, &'d Value)>, FilterError> {
    data.iter()
        .map(|(key, value)| {
            let field = model.field(key).ok_or_else(|| FilterError::UnknownField {
                model: model.name,
                field: key.clone(),
            })?;
            if !field.writable {
                return Err(FilterError::ReadOnlyField(key.clone()));
            }
            Ok((field, value))
        })
        .collect()
}
