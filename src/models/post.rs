use once_cell::sync::Lazy;

use super::base::{base_query_schema, flags, order_by_schema, relation_flags};
use super::{user, user_descriptor, FieldDef, ModelDescriptor, RelationDef, RelationKind, SqlType};
use crate::schema::{Field, ObjectSchema, Schema};

pub static POST: ModelDescriptor = ModelDescriptor {
    name: "post",
    table: "posts",
    fields: &[
        FieldDef { name: "id", column: "id", sql_type: SqlType::Uuid, writable: false },
        FieldDef { name: "createdAt", column: "created_at", sql_type: SqlType::Timestamptz, writable: false },
        FieldDef { name: "updatedAt", column: "updated_at", sql_type: SqlType::Timestamptz, writable: false },
        FieldDef { name: "title", column: "title", sql_type: SqlType::Text, writable: true },
        FieldDef { name: "content", column: "content", sql_type: SqlType::Text, writable: true },
        FieldDef { name: "published", column: "published", sql_type: SqlType::Boolean, writable: true },
        FieldDef { name: "authorId", column: "author_id", sql_type: SqlType::Uuid, writable: true },
    ],
    relations: &[RelationDef {
        name: "author",
        kind: RelationKind::ToOne,
        target: user_descriptor,
        local_field: "authorId",
        foreign_field: "id",
    }],
};

fn input() -> ObjectSchema {
    ObjectSchema::new(vec![
        Field::required("title", Schema::String),
        Field::required("content", Schema::String),
        Field::optional("published", Schema::Boolean),
        Field::required("authorId", Schema::Uuid),
    ])
}

/// Create body
pub static POST_INPUT: Lazy<Schema> = Lazy::new(|| Schema::Object(input()));

/// Update body: any subset of the create fields
pub static POST_PATCH: Lazy<Schema> = Lazy::new(|| Schema::Object(input().partial()));

pub static POST_OUTPUT: Lazy<Schema> = Lazy::new(|| {
    Schema::object(vec![
        Field::required("id", Schema::Uuid),
        Field::required("createdAt", Schema::DateTime),
        Field::required("updatedAt", Schema::DateTime),
        Field::required("title", Schema::String),
        Field::required("content", Schema::String),
        Field::required("published", Schema::Boolean),
        Field::required("authorId", Schema::Uuid),
        Field::optional("author", Schema::Lazy(|| &*user::USER_OUTPUT)),
    ])
});

pub static POST_WHERE: Lazy<Schema> = Lazy::new(|| {
    Schema::Object(
        base_query_schema()
            .extend(vec![
                Field::optional("id", Schema::Uuid),
                Field::optional("title", Schema::String),
                Field::optional("published", Schema::Boolean),
                Field::optional("authorId", Schema::Uuid),
                Field::optional(
                    "author",
                    Schema::object(vec![Field::optional("email", Schema::Email)]),
                ),
            ])
            .strict(),
    )
});

pub static POST_SELECT: Lazy<Schema> = Lazy::new(|| {
    let mut fields = flags(&[
        "id",
        "title",
        "content",
        "published",
        "authorId",
        "createdAt",
        "updatedAt",
    ]);
    fields.push(Field::optional("author", relation_flags(&["id", "email", "name"])));
    Schema::object(fields)
});

pub static POST_INCLUDE: Lazy<Schema> = Lazy::new(|| {
    Schema::object(vec![Field::optional("author", relation_flags(&["posts"]))])
});

pub static POST_ORDER_BY: Lazy<Schema> =
    Lazy::new(|| order_by_schema(&["createdAt", "updatedAt", "title", "published"]));
