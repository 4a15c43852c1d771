//! Model descriptors and the validation schemas declared for each model.

pub mod base;
pub mod post;
pub mod user;

/// SQL type a scalar field is stored as; bound parameters are cast to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Uuid,
    Text,
    Boolean,
    Timestamptz,
}

impl SqlType {
    pub fn cast(&self) -> &'static str {
        match self {
            SqlType::Uuid => "uuid",
            SqlType::Text => "text",
            SqlType::Boolean => "boolean",
            SqlType::Timestamptz => "timestamptz",
        }
    }
}

#[derive(Debug)]
pub struct FieldDef {
    /// Name on the wire (camelCase)
    pub name: &'static str,
    pub column: &'static str,
    pub sql_type: SqlType,
    /// Settable through create/update data
    pub writable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    ToOne,
    ToMany,
}

#[derive(Debug)]
pub struct RelationDef {
    pub name: &'static str,
    pub kind: RelationKind,
    pub target: fn() -> &'static ModelDescriptor,
    /// Field on this model holding the join key
    pub local_field: &'static str,
    /// Field on the target model matched against `local_field`
    pub foreign_field: &'static str,
}

impl RelationDef {
    pub fn target(&self) -> &'static ModelDescriptor {
        (self.target)()
    }
}

#[derive(Debug)]
pub struct ModelDescriptor {
    pub name: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldDef],
    pub relations: &'static [RelationDef],
}

impl ModelDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&'static RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// The primary key field, always `id`
    pub fn id_field(&self) -> &'static FieldDef {
        self.fields
            .iter()
            .find(|f| f.name == "id")
            .unwrap_or(&self.fields[0])
    }
}

pub fn user_descriptor() -> &'static ModelDescriptor {
    &user::USER
}

pub fn post_descriptor() -> &'static ModelDescriptor {
    &post::POST
}
