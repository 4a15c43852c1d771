//! In-memory store and request helpers for handler and router tests.

use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::database::{
    CountArgs, CreateArgs, DeleteArgs, FindManyArgs, FindUniqueArgs, ModelStore, StoreClient,
    StoreError, UpdateArgs,
};
use crate::models::{post_descriptor, user_descriptor, ModelDescriptor, RelationKind};

/// Rows held in insertion order. Where-objects are matched by top-level
/// scalar equality; select keeps the fields flagged `true`. Relations resolve
/// against the models registered with [`MemoryModel::link`].
pub struct MemoryModel {
    model: &'static ModelDescriptor,
    defaults: Map<String, Value>,
    rows: Mutex<Vec<Value>>,
    links: Mutex<Vec<(&'static str, Weak<MemoryModel>)>>,
    last_find: Mutex<Option<FindManyArgs>>,
    last_count: Mutex<Option<CountArgs>>,
}

impl MemoryModel {
    pub fn new(model: &'static ModelDescriptor) -> Self {
        Self {
            model,
            defaults: Map::new(),
            rows: Mutex::new(vec![]),
            links: Mutex::new(vec![]),
            last_find: Mutex::new(None),
            last_count: Mutex::new(None),
        }
    }

    pub fn with_default(mut self, field: &str, value: Value) -> Self {
        self.defaults.insert(field.to_string(), value);
        self
    }

    /// Serve `relation` from the rows of `target`
    pub fn link(&self, relation: &'static str, target: &Arc<MemoryModel>) {
        self.links.lock().unwrap().push((relation, Arc::downgrade(target)));
    }

    fn linked(&self, relation: &str) -> Option<Arc<MemoryModel>> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| *name == relation)
            .and_then(|(_, target)| target.upgrade())
    }

    /// Project a stored row and attach the relations named by select/include.
    /// Join keys are read from the full row, so unselected keys stay hidden.
    fn resolve(&self, row: Value, select: Option<&Value>, include: Option<&Value>) -> Value {
        let mut obj = match project(row.clone(), select) {
            Value::Object(obj) => obj,
            other => return other,
        };
        for relation in self.model.relations {
            let requested = (
                select.and_then(|s| s.get(relation.name)),
                include.and_then(|i| i.get(relation.name)),
            );
            let (nested_select, nested_include) = match requested {
                (Some(Value::Bool(true)), _) | (None, Some(Value::Bool(true))) => (None, None),
                (Some(spec @ Value::Object(_)), _) => (Some(spec), None),
                (None, Some(spec @ Value::Object(_))) => (None, Some(spec)),
                _ => continue,
            };
            let target = match self.linked(relation.name) {
                Some(target) => target,
                None => continue,
            };
            let key = row.get(relation.local_field).cloned().unwrap_or(Value::Null);
            let children: Vec<Value> = target
                .all()
                .into_iter()
                .filter(|child| !key.is_null() && child.get(relation.foreign_field) == Some(&key))
                .map(|child| target.resolve(child, nested_select, nested_include))
                .collect();
            let value = match relation.kind {
                RelationKind::ToOne => children.into_iter().next().unwrap_or(Value::Null),
                RelationKind::ToMany => Value::Array(children),
            };
            obj.insert(relation.name.to_string(), value);
        }
        Value::Object(obj)
    }

    /// Insert a row directly, filling id and timestamps
    pub fn seed(&self, data: Value) -> Value {
        let data = data.as_object().cloned().unwrap_or_default();
        let row = self.build_row(data);
        self.rows.lock().unwrap().push(row.clone());
        row
    }

    pub fn all(&self) -> Vec<Value> {
        self.rows.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn last_find(&self) -> Option<FindManyArgs> {
        self.last_find.lock().unwrap().clone()
    }

    pub fn last_count(&self) -> Option<CountArgs> {
        self.last_count.lock().unwrap().clone()
    }

    fn build_row(&self, data: Map<String, Value>) -> Value {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut row = Map::new();
        for field in self.model.fields {
            let value = match field.name {
                "id" => Value::String(Uuid::new_v4().to_string()),
                "createdAt" | "updatedAt" => Value::String(now.clone()),
                name => data
                    .get(name)
                    .or_else(|| self.defaults.get(name))
                    .cloned()
                    .unwrap_or(Value::Null),
            };
            row.insert(field.name.to_string(), value);
        }
        Value::Object(row)
    }

    fn id_of(row: &Value) -> Option<&str> {
        row.get("id").and_then(Value::as_str)
    }
}

fn matches(row: &Value, where_clause: Option<&Value>) -> bool {
    match where_clause.and_then(Value::as_object) {
        Some(conditions) => conditions
            .iter()
            .filter(|(_, v)| !v.is_object() && !v.is_array())
            .all(|(k, v)| row.get(k) == Some(v)),
        None => true,
    }
}

fn project(row: Value, select: Option<&Value>) -> Value {
    match (select.and_then(Value::as_object), row) {
        (Some(keys), Value::Object(obj)) => Value::Object(
            obj.into_iter()
                .filter(|(k, _)| keys.get(k) == Some(&Value::Bool(true)))
                .collect(),
        ),
        (_, row) => row,
    }
}

#[async_trait]
impl ModelStore for MemoryModel {
    fn descriptor(&self) -> &'static ModelDescriptor {
        self.model
    }

    async fn create(&self, args: CreateArgs) -> Result<Value, StoreError> {
        Ok(self.seed(Value::Object(args.data)))
    }

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Value>, StoreError> {
        *self.last_find.lock().unwrap() = Some(args.clone());
        let skip = args.skip.unwrap_or(0).max(0) as usize;
        let take = args.take.map(|t| t.max(0) as usize).unwrap_or(usize::MAX);
        Ok(self
            .all()
            .into_iter()
            .filter(|r| matches(r, args.where_clause.as_ref()))
            .skip(skip)
            .take(take)
            .map(|r| self.resolve(r, args.select.as_ref(), args.include.as_ref()))
            .collect())
    }

    async fn find_unique(&self, args: FindUniqueArgs) -> Result<Option<Value>, StoreError> {
        let id = args.id.to_string();
        Ok(self
            .all()
            .into_iter()
            .find(|r| Self::id_of(r) == Some(id.as_str()))
            .map(|r| self.resolve(r, args.select.as_ref(), args.include.as_ref())))
    }

    async fn update(&self, args: UpdateArgs) -> Result<Value, StoreError> {
        let id = args.id.to_string();
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| Self::id_of(r) == Some(id.as_str()))
            .ok_or_else(|| StoreError::record_not_found(self.model.name))?;
        if let Value::Object(obj) = &mut *row {
            for (k, v) in args.data {
                obj.insert(k, v);
            }
            obj.insert(
                "updatedAt".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        Ok(row.clone())
    }

    async fn delete(&self, args: DeleteArgs) -> Result<Value, StoreError> {
        let id = args.id.to_string();
        let mut rows = self.rows.lock().unwrap();
        let pos = rows
            .iter()
            .position(|r| Self::id_of(r) == Some(id.as_str()))
            .ok_or_else(|| StoreError::record_not_found(self.model.name))?;
        Ok(rows.remove(pos))
    }

    async fn count(&self, args: CountArgs) -> Result<i64, StoreError> {
        *self.last_count.lock().unwrap() = Some(args.clone());
        Ok(self
            .all()
            .iter()
            .filter(|r| matches(r, args.where_clause.as_ref()))
            .count() as i64)
    }
}

pub struct MemoryClient {
    pub users: Arc<MemoryModel>,
    pub posts: Arc<MemoryModel>,
    pub healthy: bool,
}

impl MemoryClient {
    pub fn new() -> Self {
        let users = Arc::new(MemoryModel::new(user_descriptor()));
        let posts = Arc::new(
            MemoryModel::new(post_descriptor()).with_default("published", Value::Bool(false)),
        );
        users.link("posts", &posts);
        posts.link("author", &users);
        Self {
            users,
            posts,
            healthy: true,
        }
    }
}

#[async_trait]
impl StoreClient for MemoryClient {
    fn user(&self) -> Arc<dyn ModelStore> {
        self.users.clone()
    }

    fn post(&self) -> Arc<dyn ModelStore> {
        self.posts.clone()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.healthy {
            Ok(())
        } else {
            Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
        }
    }
}

/// Drive one request through `app`
pub async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
