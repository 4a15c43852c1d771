use futures::future::BoxFuture;
use serde_json::Value;
use sqlx::PgPool;

use super::postgres::fetch_rows;
use super::store::StoreError;
use crate::filter::projection::Projection;
use crate::filter::{Filter, FilterError};
use crate::models::RelationKind;

/// Attach the relations named by `projection` to `rows`, one `IN` query per
/// relation per level. Child join keys that were not requested are removed
/// once the children are attached; the caller strips its own.
pub fn load<'a>(
    pool: &'a PgPool,
    rows: &'a mut [Value],
    projection: &'a Projection,
) -> BoxFuture<'a, Result<(), StoreError>> {
    Box::pin(async move {
        for rel in &projection.relations {
            let relation = rel.relation;
            let target = relation.target();
            let foreign = target.field(relation.foreign_field).ok_or_else(|| {
                FilterError::UnknownField {
                    model: target.name,
                    field: relation.foreign_field.to_string(),
                }
            })?;

            let mut keys: Vec<Value> = Vec::new();
            for row in rows.iter() {
                if let Some(key) = row.get(relation.local_field).filter(|k| !k.is_null()) {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                }
            }

            let children = if keys.is_empty() {
                vec![]
            } else {
                let mut filter = Filter::new(target);
                filter
                    .select(rel.projection.columns(Some(foreign)))
                    .where_in(foreign, &keys);
                let mut children = fetch_rows(pool, &filter.to_sql()).await?;
                load(pool, &mut children, &rel.projection).await?;
                children
            };

            let hidden = rel.projection.hidden(Some(foreign));
            for row in rows.iter_mut() {
                let key = row.get(relation.local_field).cloned().unwrap_or(Value::Null);
                let mut matched = children
                    .iter()
                    .filter(|c| !key.is_null() && c.get(foreign.name) == Some(&key))
                    .map(|c| strip(c.clone(), &hidden));
                let attached = match relation.kind {
                    RelationKind::ToOne => matched.next().unwrap_or(Value::Null),
                    RelationKind::ToMany => Value::Array(matched.collect()),
                };
                if let Value::Object(obj) = row {
                    obj.insert(relation.name.to_string(), attached);
                }
            }
        }
        Ok(())
    })
}

/// Remove `keys` from an object row
pub fn strip(mut row: Value, keys: &[&str]) -> Value {
    if let Value::Object(obj) = &mut row {
        for key in keys {
            obj.remove(*key);
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strip_removes_only_named_keys() {
        let row = json!({ "id": 1, "authorId": 2, "title": "t" });
        assert_eq!(strip(row, &["authorId"]), json!({ "id": 1, "title": "t" }));
        assert_eq!(strip(json!(null), &["id"]), json!(null));
    }
}
