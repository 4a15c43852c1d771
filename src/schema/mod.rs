//! Declarative JSON value schemas.
//!
//! A [`Schema`] validates an inbound or outbound `serde_json::Value` and
//! returns a normalised copy: unknown object keys stripped (or rejected for
//! strict objects), defaults filled in, numbers coerced from numeric strings
//! and timestamps rewritten as RFC 3339 UTC. Every issue found in a pass is
//! reported, each with the path of the offending value.

pub mod error;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub use error::{Issue, IssueCode, ValidationError};

#[derive(Debug, Clone)]
pub enum Schema {
    String,
    Email,
    Uuid,
    Boolean,
    /// Coerced from RFC 3339 strings or epoch milliseconds
    DateTime,
    Integer(IntegerRule),
    Enum(&'static [&'static str]),
    /// `"true"`/`"false"` or a boolean, normalised to a boolean
    Flag,
    Object(ObjectSchema),
    Array(Box<Schema>),
    /// First branch that accepts the value wins
    Union(Vec<Schema>),
    /// Deferred reference, for relation shapes that refer to each other
    Lazy(fn() -> &'static Schema),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerRule {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

#[derive(Debug, Clone)]
pub enum Presence {
    Required,
    Optional,
    /// Must be present, may be null
    Nullable,
    /// Filled in when absent
    Default(Value),
}

#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    schema: Schema,
    presence: Presence,
}

impl Field {
    pub fn required(name: &'static str, schema: Schema) -> Self {
        Self { name, schema, presence: Presence::Required }
    }

    pub fn optional(name: &'static str, schema: Schema) -> Self {
        Self { name, schema, presence: Presence::Optional }
    }

    pub fn nullable(name: &'static str, schema: Schema) -> Self {
        Self { name, schema, presence: Presence::Nullable }
    }

    pub fn with_default(name: &'static str, schema: Schema, default: Value) -> Self {
        Self { name, schema, presence: Presence::Default(default) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<Field>,
    strict: bool,
}

impl ObjectSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields, strict: false }
    }

    /// Reject keys that no field declares instead of stripping them
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Add fields, replacing any existing field with the same name
    pub fn extend(mut self, fields: Vec<Field>) -> Self {
        for field in fields {
            match self.fields.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => *existing = field,
                None => self.fields.push(field),
            }
        }
        self
    }

    /// Every field optional; defaults are dropped as well
    pub fn partial(mut self) -> Self {
        for field in self.fields.iter_mut() {
            field.presence = Presence::Optional;
        }
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

impl Schema {
    pub fn object(fields: Vec<Field>) -> Self {
        Schema::Object(ObjectSchema::new(fields))
    }

    pub fn array(item: Schema) -> Self {
        Schema::Array(Box::new(item))
    }

    pub fn integer(min: Option<i64>, max: Option<i64>) -> Self {
        Schema::Integer(IntegerRule { min, max })
    }

    /// Validate `value`, returning its normalised form
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        self.run(value, false)
    }

    /// Like [`Schema::parse`] but every object field, at any depth, is optional.
    /// Used for records projected through a field selection.
    pub fn parse_partial(&self, value: &Value) -> Result<Value, ValidationError> {
        self.run(value, true)
    }

    fn run(&self, value: &Value, partial: bool) -> Result<Value, ValidationError> {
        let mut ctx = Context { partial, path: vec![], issues: vec![] };
        let out = self.check(value, &mut ctx);
        match out {
            Some(v) if ctx.issues.is_empty() => Ok(v),
            _ => Err(ValidationError::new(ctx.issues)),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Schema::String | Schema::Email | Schema::Uuid | Schema::Enum(_) => "string",
            Schema::Boolean | Schema::Flag => "boolean",
            Schema::DateTime => "date",
            Schema::Integer(_) => "number",
            Schema::Object(_) => "object",
            Schema::Array(_) => "array",
            Schema::Union(_) => "union",
            Schema::Lazy(f) => f().expected(),
        }
    }

    fn check(&self, value: &Value, ctx: &mut Context) -> Option<Value> {
        match self {
            Schema::String => match value {
                Value::String(_) => Some(value.clone()),
                other => ctx.type_mismatch(self, other),
            },
            Schema::Email => match value {
                Value::String(s) if is_email(s) => Some(value.clone()),
                Value::String(_) => ctx.issue(IssueCode::InvalidString, "Invalid email"),
                other => ctx.type_mismatch(self, other),
            },
            Schema::Uuid => match value {
                Value::String(s) => match Uuid::parse_str(s) {
                    Ok(id) => Some(Value::String(id.to_string())),
                    Err(_) => ctx.issue(IssueCode::InvalidString, "Invalid uuid"),
                },
                other => ctx.type_mismatch(self, other),
            },
            Schema::Boolean => match value {
                Value::Bool(_) => Some(value.clone()),
                other => ctx.type_mismatch(self, other),
            },
            Schema::DateTime => match coerce_datetime(value) {
                Some(ts) => Some(Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))),
                None => ctx.issue(IssueCode::InvalidDate, "Invalid date"),
            },
            Schema::Integer(rule) => {
                let n = match coerce_number(value) {
                    Some(n) => n,
                    None => return ctx.type_mismatch(self, value),
                };
                if n.fract() != 0.0 || !n.is_finite() {
                    return ctx.issue(IssueCode::InvalidType, "Expected integer, received float");
                }
                if n >= i64::MAX as f64 {
                    return ctx.issue(
                        IssueCode::TooBig,
                        format!("Number must be less than or equal to {}", rule.max.unwrap_or(i64::MAX)),
                    );
                }
                if n < i64::MIN as f64 {
                    return ctx.issue(
                        IssueCode::TooSmall,
                        format!("Number must be greater than or equal to {}", rule.min.unwrap_or(i64::MIN)),
                    );
                }
                let n = n as i64;
                if let Some(min) = rule.min {
                    if n < min {
                        return ctx.issue(
                            IssueCode::TooSmall,
                            format!("Number must be greater than or equal to {}", min),
                        );
                    }
                }
                if let Some(max) = rule.max {
                    if n > max {
                        return ctx.issue(
                            IssueCode::TooBig,
                            format!("Number must be less than or equal to {}", max),
                        );
                    }
                }
                Some(Value::from(n))
            }
            Schema::Enum(options) => match value {
                Value::String(s) if options.contains(&s.as_str()) => Some(value.clone()),
                other => ctx.issue(IssueCode::InvalidEnumValue, enum_message(options, other)),
            },
            Schema::Flag => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::String(s) if s == "true" => Some(Value::Bool(true)),
                Value::String(s) if s == "false" => Some(Value::Bool(false)),
                other => ctx.issue(IssueCode::InvalidEnumValue, enum_message(&["true", "false"], other)),
            },
            Schema::Object(object) => match value {
                Value::Object(map) => object.check(map, ctx),
                other => ctx.type_mismatch(self, other),
            },
            Schema::Array(item) => match value {
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    let mut ok = true;
                    for (index, v) in items.iter().enumerate() {
                        ctx.path.push(Value::from(index));
                        match item.check(v, ctx) {
                            Some(v) => out.push(v),
                            None => ok = false,
                        }
                        ctx.path.pop();
                    }
                    ok.then_some(Value::Array(out))
                }
                other => ctx.type_mismatch(self, other),
            },
            Schema::Union(branches) => {
                for branch in branches {
                    let mut attempt = Context {
                        partial: ctx.partial,
                        path: ctx.path.clone(),
                        issues: vec![],
                    };
                    if let Some(v) = branch.check(value, &mut attempt) {
                        if attempt.issues.is_empty() {
                            return Some(v);
                        }
                    }
                }
                ctx.issue(IssueCode::InvalidUnion, "Invalid input")
            }
            Schema::Lazy(resolve) => resolve().check(value, ctx),
        }
    }
}

impl ObjectSchema {
    fn check(&self, map: &Map<String, Value>, ctx: &mut Context) -> Option<Value> {
        let mut out = Map::new();
        let mut ok = true;

        for field in &self.fields {
            match map.get(field.name) {
                None => match &field.presence {
                    Presence::Default(default) if !ctx.partial => {
                        out.insert(field.name.to_string(), default.clone());
                    }
                    Presence::Required | Presence::Nullable if !ctx.partial => {
                        ctx.path.push(Value::from(field.name));
                        ctx.issue(IssueCode::InvalidType, "Required");
                        ctx.path.pop();
                        ok = false;
                    }
                    _ => {}
                },
                Some(Value::Null) if matches!(field.presence, Presence::Nullable) => {
                    out.insert(field.name.to_string(), Value::Null);
                }
                Some(v) => {
                    ctx.path.push(Value::from(field.name));
                    match field.schema.check(v, ctx) {
                        Some(v) => {
                            out.insert(field.name.to_string(), v);
                        }
                        None => ok = false,
                    }
                    ctx.path.pop();
                }
            }
        }

        if self.strict {
            let unknown: Vec<String> = map
                .keys()
                .filter(|k| !self.fields.iter().any(|f| f.name == k.as_str()))
                .map(|k| format!("'{}'", k))
                .collect();
            if !unknown.is_empty() {
                ctx.issue(
                    IssueCode::UnrecognizedKeys,
                    format!("Unrecognized key(s) in object: {}", unknown.join(", ")),
                );
                ok = false;
            }
        }

        ok.then_some(Value::Object(out))
    }
}

struct Context {
    partial: bool,
    path: Vec<Value>,
    issues: Vec<Issue>,
}

impl Context {
    fn issue(&mut self, code: IssueCode, message: impl Into<String>) -> Option<Value> {
        self.issues.push(Issue {
            code,
            message: message.into(),
            path: self.path.clone(),
        });
        None
    }

    fn type_mismatch(&mut self, schema: &Schema, received: &Value) -> Option<Value> {
        let message = format!("Expected {}, received {}", schema.expected(), type_name(received));
        self.issue(IssueCode::InvalidType, message)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn enum_message(options: &[&str], received: &Value) -> String {
    let expected: Vec<String> = options.iter().map(|o| format!("'{}'", o)).collect();
    let received = match received {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    };
    format!("Invalid enum value. Expected {}, received {}", expected.join(" | "), received)
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()
        }
        _ => None,
    }
}

fn coerce_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Pragmatic address check: one `@`, no whitespace, dotted domain with an
/// alphabetic top-level label of at least two characters.
fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false);
    labels_ok && tld_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Schema {
        Schema::object(vec![
            Field::required("title", Schema::String),
            Field::optional("published", Schema::Boolean),
            Field::nullable("name", Schema::String),
            Field::with_default("page", Schema::integer(Some(1), None), json!(1)),
        ])
    }

    #[test]
    fn strips_unknown_keys_and_applies_defaults() {
        let out = sample()
            .parse(&json!({ "title": "a", "name": null, "extra": 1 }))
            .unwrap();
        assert_eq!(out, json!({ "title": "a", "name": null, "page": 1 }));
    }

    #[test]
    fn strict_objects_reject_unknown_keys() {
        let schema = Schema::Object(ObjectSchema::new(vec![Field::optional("a", Schema::String)]).strict());
        let err = schema.parse(&json!({ "a": "x", "b": 1 })).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].code, IssueCode::UnrecognizedKeys);
        assert!(err.issues[0].message.contains("'b'"));
    }

    #[test]
    fn reports_every_issue_with_paths() {
        let err = sample().parse(&json!({ "published": "yes" })).unwrap_err();
        let paths: Vec<Vec<Value>> = err.issues.iter().map(|i| i.path.clone()).collect();
        assert!(paths.contains(&vec![json!("title")]));
        assert!(paths.contains(&vec![json!("published")]));
        assert!(paths.contains(&vec![json!("name")]));
        assert_eq!(err.issues.len(), 3);
    }

    #[test]
    fn partial_parse_skips_missing_fields_at_any_depth() {
        let schema = Schema::object(vec![
            Field::required("id", Schema::Uuid),
            Field::optional(
                "author",
                Schema::object(vec![Field::required("email", Schema::Email)]),
            ),
        ]);
        let out = schema.parse_partial(&json!({ "author": {} })).unwrap();
        assert_eq!(out, json!({ "author": {} }));
        assert!(schema.parse(&json!({ "author": {} })).is_err());
    }

    #[test]
    fn integers_coerce_numeric_strings_and_enforce_bounds() {
        let schema = Schema::integer(Some(1), Some(100));
        assert_eq!(schema.parse(&json!("7")).unwrap(), json!(7));
        assert_eq!(schema.parse(&json!(3)).unwrap(), json!(3));
        assert_eq!(schema.parse(&json!(0)).unwrap_err().issues[0].code, IssueCode::TooSmall);
        assert_eq!(schema.parse(&json!(101)).unwrap_err().issues[0].code, IssueCode::TooBig);
        assert_eq!(schema.parse(&json!(1.5)).unwrap_err().issues[0].code, IssueCode::InvalidType);
        assert_eq!(schema.parse(&json!("abc")).unwrap_err().issues[0].code, IssueCode::InvalidType);
    }

    #[test]
    fn integers_outside_i64_are_rejected() {
        let unbounded = Schema::integer(None, None);
        assert_eq!(unbounded.parse(&json!(1e30)).unwrap_err().issues[0].code, IssueCode::TooBig);
        assert_eq!(unbounded.parse(&json!(-1e30)).unwrap_err().issues[0].code, IssueCode::TooSmall);
        assert_eq!(
            unbounded.parse(&json!("9223372036854775807")).unwrap_err().issues[0].code,
            IssueCode::TooBig
        );
        assert_eq!(unbounded.parse(&json!(1_000_000_000_000i64)).unwrap(), json!(1_000_000_000_000i64));
    }

    #[test]
    fn datetimes_normalise_to_utc_millis() {
        let out = Schema::DateTime
            .parse(&json!("2024-03-01T12:30:00.123456+02:00"))
            .unwrap();
        assert_eq!(out, json!("2024-03-01T10:30:00.123Z"));
        let out = Schema::DateTime.parse(&json!(0)).unwrap();
        assert_eq!(out, json!("1970-01-01T00:00:00.000Z"));
        assert!(Schema::DateTime.parse(&json!("yesterday")).is_err());
    }

    #[test]
    fn flags_accept_strings_and_booleans() {
        assert_eq!(Schema::Flag.parse(&json!("true")).unwrap(), json!(true));
        assert_eq!(Schema::Flag.parse(&json!(false)).unwrap(), json!(false));
        assert!(Schema::Flag.parse(&json!("yes")).is_err());
    }

    #[test]
    fn unions_take_first_matching_branch() {
        let schema = Schema::Union(vec![
            Schema::Boolean,
            Schema::object(vec![Field::optional("posts", Schema::Boolean)]),
        ]);
        assert_eq!(schema.parse(&json!(true)).unwrap(), json!(true));
        assert_eq!(schema.parse(&json!({ "posts": true })).unwrap(), json!({ "posts": true }));
        let err = schema.parse(&json!("x")).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InvalidUnion);
    }

    #[test]
    fn uuids_and_emails_are_checked() {
        assert!(Schema::Uuid.parse(&json!("not-a-uuid")).is_err());
        let id = "6F9619FF-8B86-D011-B42D-00C04FC964FF";
        assert_eq!(
            Schema::Uuid.parse(&json!(id)).unwrap(),
            json!("6f9619ff-8b86-d011-b42d-00c04fc964ff")
        );
        assert!(Schema::Email.parse(&json!("ada@example.com")).is_ok());
        for bad in ["ada", "ada@", "@example.com", "ada@example", "a da@example.com", "ada@example.c0m"] {
            assert!(Schema::Email.parse(&json!(bad)).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn array_issue_paths_include_indices() {
        let schema = Schema::array(Schema::object(vec![Field::required("title", Schema::String)]));
        let err = schema.parse(&json!([{ "title": "a" }, { "title": 1 }])).unwrap_err();
        assert_eq!(err.issues[0].path, vec![json!(1), json!("title")]);
    }
}
