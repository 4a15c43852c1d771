use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::Params;
use crate::models::{FieldDef, ModelDescriptor, RelationDef, RelationKind, SqlType};

const TO_ONE_OPERATORS: &[&str] = &["is", "isNot"];
const TO_MANY_OPERATORS: &[&str] = &["some", "every", "none"];

/// Renders a where-object into a parameterised SQL predicate.
///
/// Keys are scalar fields (implicit equality or an operator object),
/// relations (rendered as correlated `EXISTS` sub-queries) or the logical
/// combinators `AND`, `OR` and `NOT`.
pub struct FilterWhere<'p> {
    params: &'p mut Params,
}

impl<'p> FilterWhere<'p> {
    pub fn new(params: &'p mut Params) -> Self {
        Self { params }
    }

    pub fn generate(
        &mut self,
        model: &'static ModelDescriptor,
        alias: &str,
        where_data: &Value,
    ) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("TRUE".to_string()),
            Value::Object(obj) => obj,
            _ => {
                return Err(FilterError::InvalidWhereClause(
                    "WHERE must be an object".to_string(),
                ))
            }
        };

        let mut conditions = Vec::new();
        for (key, value) in obj {
            match key.as_str() {
                "AND" => conditions.push(self.combine(model, alias, value, " AND ", "TRUE")?),
                "OR" => conditions.push(self.combine(model, alias, value, " OR ", "FALSE")?),
                "NOT" => conditions.push(self.negate(model, alias, value)?),
                _ => {
                    if let Some(field) = model.field(key) {
                        conditions.extend(self.field_condition(field, alias, value)?);
                    } else if let Some(relation) = model.relation(key) {
                        conditions.push(self.relation_condition(model, relation, alias, value)?);
                    } else {
                        return Err(FilterError::UnknownField {
                            model: model.name,
                            field: key.clone(),
                        });
                    }
                }
            }
        }
        Ok(join_and(conditions))
    }

    fn combine(
        &mut self,
        model: &'static ModelDescriptor,
        alias: &str,
        value: &Value,
        joiner: &str,
        empty: &str,
    ) -> Result<String, FilterError> {
        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Ok(empty.to_string());
                }
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(format!("({})", self.generate(model, alias, item)?));
                }
                Ok(format!("({})", parts.join(joiner)))
            }
            Value::Object(_) => Ok(format!("({})", self.generate(model, alias, value)?)),
            _ => Err(FilterError::InvalidOperatorData(
                "logical operators require an object or array".to_string(),
            )),
        }
    }

    fn negate(
        &mut self,
        model: &'static ModelDescriptor,
        alias: &str,
        value: &Value,
    ) -> Result<String, FilterError> {
        match value {
            // Every listed condition must be false
            Value::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(format!("NOT ({})", self.generate(model, alias, item)?));
                }
                Ok(join_and(parts))
            }
            Value::Object(_) => Ok(format!("NOT ({})", self.generate(model, alias, value)?)),
            _ => Err(FilterError::InvalidOperatorData(
                "NOT requires an object or array".to_string(),
            )),
        }
    }

    fn field_condition(
        &mut self,
        field: &'static FieldDef,
        alias: &str,
        value: &Value,
    ) -> Result<Vec<String>, FilterError> {
        let column = format!("{}.\"{}\"", alias, field.column);
        let ops = match value {
            Value::Null => return Ok(vec![format!("{} IS NULL", column)]),
            Value::Object(ops) => ops,
            scalar => {
                let p = self.params.push(scalar.clone(), field.sql_type);
                return Ok(vec![format!("{} = {}", column, p)]);
            }
        };

        let insensitive = matches!(ops.get("mode").and_then(Value::as_str), Some("insensitive"));
        let mut out = Vec::new();
        for (op, data) in ops {
            let sql = match op.as_str() {
                "mode" => continue,
                "equals" => {
                    if data.is_null() {
                        format!("{} IS NULL", column)
                    } else if insensitive {
                        let p = self.params.push(data.clone(), SqlType::Text);
                        format!("LOWER({}::text) = LOWER({})", column, p)
                    } else {
                        format!("{} = {}", column, self.params.push(data.clone(), field.sql_type))
                    }
                }
                "not" => match data {
                    Value::Null => format!("{} IS NOT NULL", column),
                    Value::Object(_) => {
                        let inner = self.field_condition(field, alias, data)?;
                        format!("NOT ({})", join_and(inner))
                    }
                    scalar => format!("{} <> {}", column, self.params.push(scalar.clone(), field.sql_type)),
                },
                "in" | "notIn" => {
                    let values = data.as_array().ok_or_else(|| {
                        FilterError::InvalidOperatorData(format!("{} requires an array", op))
                    })?;
                    let negated = op == "notIn";
                    if values.is_empty() {
                        (if negated { "TRUE" } else { "FALSE" }).to_string()
                    } else {
                        let placeholders: Vec<String> = values
                            .iter()
                            .map(|v| self.params.push(v.clone(), field.sql_type))
                            .collect();
                        let keyword = if negated { "NOT IN" } else { "IN" };
                        format!("{} {} ({})", column, keyword, placeholders.join(", "))
                    }
                }
                "lt" | "lte" | "gt" | "gte" => {
                    let symbol = match op.as_str() {
                        "lt" => "<",
                        "lte" => "<=",
                        "gt" => ">",
                        _ => ">=",
                    };
                    format!("{} {} {}", column, symbol, self.params.push(data.clone(), field.sql_type))
                }
                "contains" | "startsWith" | "endsWith" => {
                    let needle = data.as_str().ok_or_else(|| {
                        FilterError::InvalidOperatorData(format!("{} requires a string", op))
                    })?;
                    let escaped = escape_like(needle);
                    let pattern = match op.as_str() {
                        "contains" => format!("%{}%", escaped),
                        "startsWith" => format!("{}%", escaped),
                        _ => format!("%{}", escaped),
                    };
                    let p = self.params.push(Value::String(pattern), SqlType::Text);
                    let keyword = if insensitive { "ILIKE" } else { "LIKE" };
                    let target = if field.sql_type == SqlType::Text {
                        column.clone()
                    } else {
                        format!("{}::text", column)
                    };
                    format!("{} {} {}", target, keyword, p)
                }
                other => return Err(FilterError::UnsupportedOperator(other.to_string())),
            };
            out.push(sql);
        }
        Ok(out)
    }

    fn relation_condition(
        &mut self,
        model: &'static ModelDescriptor,
        relation: &'static RelationDef,
        alias: &str,
        value: &Value,
    ) -> Result<String, FilterError> {
        let operators = match relation.kind {
            RelationKind::ToOne => TO_ONE_OPERATORS,
            RelationKind::ToMany => TO_MANY_OPERATORS,
        };

        let obj = match value {
            Value::Object(obj) => obj,
            Value::Null if relation.kind == RelationKind::ToOne => {
                return Ok(format!("NOT {}", self.exists(model, relation, alias, None)?));
            }
            _ => {
                return Err(FilterError::InvalidOperatorData(format!(
                    "relation filter '{}' requires an object",
                    relation.name
                )))
            }
        };

        if !is_operator_object(obj, operators) {
            // Implicit `is` / `some`
            return self.exists(model, relation, alias, Some(value));
        }

        let mut parts = Vec::new();
        for (op, filter) in obj {
            let filter = if filter.is_null() { None } else { Some(filter) };
            let sql = match op.as_str() {
                "is" | "some" => match filter {
                    Some(_) => self.exists(model, relation, alias, filter)?,
                    None => format!("NOT {}", self.exists(model, relation, alias, None)?),
                },
                "isNot" => match filter {
                    Some(_) => format!("NOT {}", self.exists(model, relation, alias, filter)?),
                    None => self.exists(model, relation, alias, None)?,
                },
                "none" => format!("NOT {}", self.exists(model, relation, alias, filter)?),
                "every" => {
                    let negated = filter.map(|f| serde_json::json!({ "NOT": f }));
                    format!("NOT {}", self.exists(model, relation, alias, negated.as_ref())?)
                }
                other => return Err(FilterError::UnsupportedOperator(other.to_string())),
            };
            parts.push(sql);
        }
        Ok(join_and(parts))
    }

    fn exists(
        &mut self,
        model: &'static ModelDescriptor,
        relation: &'static RelationDef,
        alias: &str,
        filter: Option<&Value>,
    ) -> Result<String, FilterError> {
        let target = relation.target();
        let local = model.field(relation.local_field).ok_or_else(|| FilterError::UnknownField {
            model: model.name,
            field: relation.local_field.to_string(),
        })?;
        let foreign = target.field(relation.foreign_field).ok_or_else(|| FilterError::UnknownField {
            model: target.name,
            field: relation.foreign_field.to_string(),
        })?;

        let sub = self.params.next_alias();
        let join = format!("{}.\"{}\" = {}.\"{}\"", sub, foreign.column, alias, local.column);
        let predicate = match filter {
            Some(f) => format!("{} AND ({})", join, self.generate(target, &sub, f)?),
            None => join,
        };
        Ok(format!(
            "EXISTS (SELECT 1 FROM \"{}\" {} WHERE {})",
            target.table, sub, predicate
        ))
    }
}

fn is_operator_object(obj: &Map<String, Value>, operators: &[&str]) -> bool {
    !obj.is_empty() && obj.keys().all(|k| operators.contains(&k.as_str()))
}

fn join_and(conditions: Vec<String>) -> String {
    if conditions.is_empty() {
        "TRUE".to_string()
    } else {
        conditions.join(" AND ")
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
