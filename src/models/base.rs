use serde_json::json;

use crate::config::CONFIG;
use crate::schema::{Field, ObjectSchema, Schema};

pub const DIRECTIONS: &[&str] = &["asc", "desc"];

/// Keys of the shared where-schema that steer the list handler rather than
/// filter rows; they never reach the store.
pub const CONTROL_KEYS: &[&str] = &[
    "select",
    "include",
    "distinct",
    "page",
    "limit",
    "skip",
    "take",
    "cursor",
    "orderBy",
    "orderDir",
    "includeTotalCount",
    "and",
    "or",
];

pub fn direction() -> Schema {
    Schema::Enum(DIRECTIONS)
}

/// Pagination and list-control fields every where-schema extends
pub fn base_query_schema() -> ObjectSchema {
    let max_limit = CONFIG.query.max_limit;
    ObjectSchema::new(vec![
        Field::optional("select", Schema::String),
        Field::optional("include", Schema::String),
        Field::optional("distinct", Schema::String),
        Field::with_default("page", Schema::integer(Some(1), None), json!(1)),
        Field::with_default(
            "limit",
            Schema::integer(Some(1), Some(max_limit)),
            json!(CONFIG.query.default_limit),
        ),
        Field::optional("skip", Schema::integer(Some(0), None)),
        Field::optional("take", Schema::integer(Some(1), Some(max_limit))),
        Field::optional("cursor", Schema::String),
        Field::optional("orderBy", Schema::String),
        Field::optional("orderDir", direction()),
        Field::with_default("includeTotalCount", Schema::Flag, json!(false)),
        Field::optional("and", Schema::String),
        Field::optional("or", Schema::String),
    ])
}

/// `{ field: "asc" | "desc" }` or an array of such objects
pub fn order_by_schema(fields: &[&'static str]) -> Schema {
    let entry = || Schema::object(fields.iter().map(|f| Field::optional(*f, direction())).collect());
    Schema::Union(vec![entry(), Schema::array(entry())])
}

/// Per-field boolean flags
pub fn flags(fields: &[&'static str]) -> Vec<Field> {
    fields.iter().map(|f| Field::optional(*f, Schema::Boolean)).collect()
}

/// `true`/`false` or a nested object of flags
pub fn relation_flags(nested: &[&'static str]) -> Schema {
    Schema::Union(vec![Schema::Boolean, Schema::object(flags(nested))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_query_defaults_pagination() {
        let out = Schema::Object(base_query_schema()).parse(&json!({})).unwrap();
        assert_eq!(out["page"], json!(1));
        assert_eq!(out["limit"], json!(10));
        assert_eq!(out["includeTotalCount"], json!(false));
    }

    #[test]
    fn base_query_rejects_oversized_limit() {
        let schema = Schema::Object(base_query_schema());
        assert!(schema.parse(&json!({ "limit": 101 })).is_err());
        assert_eq!(schema.parse(&json!({ "limit": "100" })).unwrap()["limit"], json!(100));
    }

    #[test]
    fn every_base_field_is_a_control_key() {
        for name in base_query_schema().field_names() {
            assert!(CONTROL_KEYS.contains(&name), "{} missing from CONTROL_KEYS", name);
        }
    }

    #[test]
    fn order_by_accepts_object_or_array() {
        let schema = order_by_schema(&["title", "createdAt"]);
        assert!(schema.parse(&json!({ "title": "desc" })).is_ok());
        assert!(schema.parse(&json!([{ "title": "asc" }, { "createdAt": "desc" }])).is_ok());
        assert!(schema.parse(&json!({ "title": "sideways" })).is_err());
    }
}
