use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{PgPool, Row};
use tracing::{debug, warn};

use super::relations;
use super::store::{
    CountArgs, CreateArgs, DeleteArgs, FindManyArgs, FindUniqueArgs, ModelStore, StoreClient,
    StoreError, UpdateArgs,
};
use crate::config::CONFIG;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, Mutation, Projection};
use crate::models::{post_descriptor, user_descriptor, ModelDescriptor};

/// sqlx-backed store for one model
pub struct PgModel {
    pool: PgPool,
    model: &'static ModelDescriptor,
}

impl PgModel {
    pub fn new(pool: PgPool, model: &'static ModelDescriptor) -> Self {
        Self { pool, model }
    }

    async fn read(
        &self,
        where_clause: &Value,
        projection: &Projection,
        order_by: Option<&Value>,
        take: Option<i64>,
        skip: Option<i64>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut filter = Filter::new(self.model);
        filter.select(projection.columns(None)).where_clause(where_clause)?;
        if let Some(order) = order_by {
            filter.order(order)?;
        }
        filter.limit(take, skip)?;

        let mut rows = fetch_rows(&self.pool, &filter.to_sql()).await?;
        relations::load(&self.pool, &mut rows, projection).await?;

        let hidden = projection.hidden(None);
        Ok(rows.into_iter().map(|r| relations::strip(r, &hidden)).collect())
    }

    async fn write_one(&self, sql: SqlResult) -> Result<Value, StoreError> {
        fetch_rows(&self.pool, &sql)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::record_not_found(self.model.name))
    }
}

#[async_trait]
impl ModelStore for PgModel {
    fn descriptor(&self) -> &'static ModelDescriptor {
        self.model
    }

    async fn create(&self, args: CreateArgs) -> Result<Value, StoreError> {
        let returning: Vec<_> = self.model.fields.iter().collect();
        let sql = Mutation::insert(self.model, &args.data, &returning)?;
        self.write_one(sql).await
    }

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Value>, StoreError> {
        let projection = Projection::build(self.model, args.select.as_ref(), args.include.as_ref())?;
        let where_clause = args.where_clause.unwrap_or(Value::Null);
        self.read(&where_clause, &projection, args.order_by.as_ref(), args.take, args.skip)
            .await
    }

    async fn find_unique(&self, args: FindUniqueArgs) -> Result<Option<Value>, StoreError> {
        let projection = Projection::build(self.model, args.select.as_ref(), args.include.as_ref())?;
        let where_clause = json!({ (self.model.id_field().name): args.id.to_string() });
        let rows = self.read(&where_clause, &projection, None, Some(1), None).await?;
        Ok(rows.into_iter().next())
    }

    async fn update(&self, args: UpdateArgs) -> Result<Value, StoreError> {
        let returning: Vec<_> = self.model.fields.iter().collect();
        let sql = Mutation::update(self.model, args.id, &args.data, &returning)?;
        self.write_one(sql).await
    }

    async fn delete(&self, args: DeleteArgs) -> Result<Value, StoreError> {
        let returning: Vec<_> = self.model.fields.iter().collect();
        self.write_one(Mutation::delete(self.model, args.id, &returning)).await
    }

    async fn count(&self, args: CountArgs) -> Result<i64, StoreError> {
        let mut filter = Filter::new(self.model);
        filter.where_clause(&args.where_clause.unwrap_or(Value::Null))?;
        let sql = filter.to_count_sql();

        let started = Instant::now();
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        log_query(&sql.query, started.elapsed());
        Ok(row.try_get::<i64, _>("count")?)
    }
}

/// One `PgModel` per model over a shared pool
pub struct PgClient {
    pool: PgPool,
    user: Arc<dyn ModelStore>,
    post: Arc<dyn ModelStore>,
}

impl PgClient {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user: Arc::new(PgModel::new(pool.clone(), user_descriptor())),
            post: Arc::new(PgModel::new(pool.clone(), post_descriptor())),
            pool,
        }
    }
}

#[async_trait]
impl StoreClient for PgClient {
    fn user(&self) -> Arc<dyn ModelStore> {
        self.user.clone()
    }

    fn post(&self) -> Arc<dyn ModelStore> {
        self.post.clone()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Run a statement built with `row_to_json(..) AS row` and decode each row
pub(crate) async fn fetch_rows(pool: &PgPool, sql: &SqlResult) -> Result<Vec<Value>, StoreError> {
    let started = Instant::now();
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param(q, p);
    }
    let rows = q.fetch_all(pool).await?;
    log_query(&sql.query, started.elapsed());

    rows.iter()
        .map(|row| row.try_get::<Value, _>("row").map_err(StoreError::from))
        .collect()
}

fn log_query(query: &str, elapsed: Duration) {
    let db = &CONFIG.database;
    let ms = elapsed.as_millis() as u64;
    if ms >= db.slow_query_threshold_ms {
        warn!("Slow query ({} ms): {}", ms, query);
    } else if db.enable_query_logging {
        debug!("Query ({} ms): {}", ms, query);
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // Placeholders carry a cast, so composite values go over as JSON
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
