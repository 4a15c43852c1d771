use serde_json::Value;

use super::error::FilterError;
use crate::models::{FieldDef, ModelDescriptor, RelationDef};

/// Which scalar fields and which relations a read returns.
///
/// `select` lists fields (and relations) explicitly; `include` adds relations
/// on top of the default all-fields projection. A relation given as `true`
/// loads the related record with all of its fields; given as an object it is
/// a nested select (under `select`) or a nested include (under `include`).
#[derive(Debug, Clone)]
pub struct Projection {
    pub model: &'static ModelDescriptor,
    pub fields: Vec<&'static FieldDef>,
    pub relations: Vec<RelationProjection>,
}

#[derive(Debug, Clone)]
pub struct RelationProjection {
    pub relation: &'static RelationDef,
    pub projection: Projection,
}

impl Projection {
    pub fn all(model: &'static ModelDescriptor) -> Self {
        Self {
            model,
            fields: model.fields.iter().collect(),
            relations: vec![],
        }
    }

    pub fn build(
        model: &'static ModelDescriptor,
        select: Option<&Value>,
        include: Option<&Value>,
    ) -> Result<Self, FilterError> {
        let mut projection = match select {
            None | Some(Value::Null) => Self::all(model),
            Some(Value::Object(keys)) => {
                let mut projection = Self { model, fields: vec![], relations: vec![] };
                for (key, value) in keys {
                    if let Some(field) = model.field(key) {
                        match value {
                            Value::Bool(true) => projection.fields.push(field),
                            Value::Bool(false) => {}
                            _ => {
                                return Err(FilterError::InvalidSelect(format!(
                                    "field '{}' must be selected with a boolean",
                                    key
                                )))
                            }
                        }
                    } else if let Some(relation) = model.relation(key) {
                        if let Some(nested) = Self::relation(relation, value, true)? {
                            projection.relations.push(nested);
                        }
                    } else {
                        return Err(FilterError::UnknownField { model: model.name, field: key.clone() });
                    }
                }
                // Keep descriptor order regardless of the order keys were given in
                projection
                    .fields
                    .sort_by_key(|f| model.fields.iter().position(|d| d.name == f.name));
                projection
            }
            Some(_) => return Err(FilterError::InvalidSelect("select must be an object".to_string())),
        };

        match include {
            None | Some(Value::Null) => {}
            Some(Value::Object(keys)) => {
                for (key, value) in keys {
                    let relation = model.relation(key).ok_or_else(|| FilterError::UnknownRelation {
                        model: model.name,
                        relation: key.clone(),
                    })?;
                    if projection.relations.iter().any(|r| r.relation.name == relation.name) {
                        continue;
                    }
                    if let Some(nested) = Self::relation(relation, value, false)? {
                        projection.relations.push(nested);
                    }
                }
            }
            Some(_) => return Err(FilterError::InvalidSelect("include must be an object".to_string())),
        }

        Ok(projection)
    }

    fn relation(
        relation: &'static RelationDef,
        value: &Value,
        nested_is_select: bool,
    ) -> Result<Option<RelationProjection>, FilterError> {
        let target = relation.target();
        let projection = match value {
            Value::Bool(false) => return Ok(None),
            Value::Bool(true) => Self::all(target),
            Value::Object(_) if nested_is_select => Self::build(target, Some(value), None)?,
            Value::Object(_) => Self::build(target, None, Some(value))?,
            _ => {
                return Err(FilterError::InvalidSelect(format!(
                    "relation '{}' must be a boolean or object",
                    relation.name
                )))
            }
        };
        Ok(Some(RelationProjection { relation, projection }))
    }

    /// Columns to fetch: the projected fields plus the join keys its
    /// relations need, plus `extra` (a parent join key), in descriptor order.
    pub fn columns(&self, extra: Option<&'static FieldDef>) -> Vec<&'static FieldDef> {
        self.model
            .fields
            .iter()
            .filter(|f| {
                self.fields.iter().any(|s| s.name == f.name)
                    || self.relations.iter().any(|r| r.relation.local_field == f.name)
                    || extra.map(|e| e.name == f.name).unwrap_or(false)
            })
            .collect()
    }

    /// Fetched columns that were not asked for and must be stripped
    pub fn hidden(&self, extra: Option<&'static FieldDef>) -> Vec<&'static str> {
        self.columns(extra)
            .into_iter()
            .filter(|f| !self.fields.iter().any(|s| s.name == f.name))
            .map(|f| f.name)
            .collect()
    }
}
