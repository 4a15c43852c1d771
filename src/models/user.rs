use once_cell::sync::Lazy;

use super::base::{base_query_schema, flags, order_by_schema, relation_flags};
use super::{post, post_descriptor, FieldDef, ModelDescriptor, RelationDef, RelationKind, SqlType};
use crate::schema::{Field, ObjectSchema, Schema};

pub static USER: ModelDescriptor = ModelDescriptor {
    name: "user",
    table: "users",
    fields: &[
        FieldDef { name: "id", column: "id", sql_type: SqlType::Uuid, writable: false },
        FieldDef { name: "createdAt", column: "created_at", sql_type: SqlType::Timestamptz, writable: false },
        FieldDef { name: "updatedAt", column: "updated_at", sql_type: SqlType::Timestamptz, writable: false },
        FieldDef { name: "email", column: "email", sql_type: SqlType::Text, writable: true },
        FieldDef { name: "name", column: "name", sql_type: SqlType::Text, writable: true },
    ],
    relations: &[RelationDef {
        name: "posts",
        kind: RelationKind::ToMany,
        target: post_descriptor,
        local_field: "id",
        foreign_field: "authorId",
    }],
};

fn input() -> ObjectSchema {
    ObjectSchema::new(vec![
        Field::required("email", Schema::Email),
        Field::optional("name", Schema::String),
    ])
}

pub static USER_INPUT: Lazy<Schema> = Lazy::new(|| Schema::Object(input()));

pub static USER_PATCH: Lazy<Schema> = Lazy::new(|| Schema::Object(input().partial()));

pub static USER_OUTPUT: Lazy<Schema> = Lazy::new(|| {
    Schema::object(vec![
        Field::required("id", Schema::Uuid),
        Field::required("createdAt", Schema::DateTime),
        Field::required("updatedAt", Schema::DateTime),
        Field::required("email", Schema::Email),
        Field::nullable("name", Schema::String),
        Field::optional("posts", Schema::array(Schema::Lazy(|| &*post::POST_OUTPUT))),
    ])
});

pub static USER_WHERE: Lazy<Schema> = Lazy::new(|| {
    Schema::Object(base_query_schema().extend(vec![
        Field::optional("id", Schema::Uuid),
        Field::optional("email", Schema::Email),
        Field::optional("name", Schema::String),
        Field::optional(
            "posts",
            Schema::object(vec![
                Field::optional("title", Schema::String),
                Field::optional("published", Schema::Boolean),
            ]),
        ),
    ]))
});

pub static USER_SELECT: Lazy<Schema> = Lazy::new(|| {
    let mut fields = flags(&["id", "email", "name", "createdAt", "updatedAt"]);
    fields.push(Field::optional("posts", relation_flags(&["id", "title"])));
    Schema::object(fields)
});

pub static USER_INCLUDE: Lazy<Schema> = Lazy::new(|| {
    Schema::object(vec![Field::optional("posts", relation_flags(&["author"]))])
});

pub static USER_ORDER_BY: Lazy<Schema> =
    Lazy::new(|| order_by_schema(&["createdAt", "updatedAt", "email", "name"]));
