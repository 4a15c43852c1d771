use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};
use crate::models::ModelDescriptor;

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `{ "title": "asc", "createdAt": "desc" }` or an array of such
    /// objects; key order is sort priority.
    pub fn validate_and_parse(
        model: &'static ModelDescriptor,
        order: &Value,
    ) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::Null => Ok(vec![]),
            Value::Object(_) => Self::parse_entry(model, order),
            Value::Array(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(Self::parse_entry(model, item)?);
                }
                Ok(out)
            }
            _ => Err(FilterError::InvalidOrder(
                "orderBy must be an object or array".to_string(),
            )),
        }
    }

    fn parse_entry(
        model: &'static ModelDescriptor,
        entry: &Value,
    ) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let obj = entry.as_object().ok_or_else(|| {
            FilterError::InvalidOrder("orderBy entries must be objects".to_string())
        })?;
        let mut out = Vec::with_capacity(obj.len());
        for (key, direction) in obj {
            let field = match model.field(key) {
                Some(field) => field,
                None if model.relation(key).is_some() => {
                    return Err(FilterError::InvalidOrder(format!(
                        "ordering by relation '{}' is not supported",
                        key
                    )))
                }
                None => {
                    return Err(FilterError::UnknownField {
                        model: model.name,
                        field: key.clone(),
                    })
                }
            };
            let sort = direction
                .as_str()
                .and_then(SortDirection::parse)
                .ok_or_else(|| {
                    FilterError::InvalidOrder(format!("invalid direction for '{}': {}", key, direction))
                })?;
            out.push(FilterOrderInfo { field, sort });
        }
        Ok(out)
    }

    pub fn generate(alias: &str, infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{}.\"{}\" {}", alias, i.field.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
