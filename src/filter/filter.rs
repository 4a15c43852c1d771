use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, Params, SqlResult};
use crate::models::{FieldDef, ModelDescriptor};

/// Alias of the outermost table in generated SELECTs
pub const ROOT_ALIAS: &str = "t0";

/// Builder for a single-table read. Rows come back as one JSON object per
/// row (`row_to_json`) keyed by API field names.
pub struct Filter {
    model: &'static ModelDescriptor,
    columns: Vec<&'static FieldDef>,
    conditions: Vec<String>,
    params: Params,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(model: &'static ModelDescriptor) -> Self {
        Self {
            model,
            columns: model.fields.iter().collect(),
            conditions: vec![],
            params: Params::default(),
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn select(&mut self, columns: Vec<&'static FieldDef>) -> &mut Self {
        self.columns = columns;
        self
    }

    pub fn where_clause(&mut self, conditions: &Value) -> Result<&mut Self, FilterError> {
        let sql = FilterWhere::new(&mut self.params).generate(self.model, ROOT_ALIAS, conditions)?;
        if sql != "TRUE" {
            self.conditions.push(sql);
        }
        Ok(self)
    }

    /// Restrict to rows whose `field` is one of `values`
    pub fn where_in(&mut self, field: &'static FieldDef, values: &[Value]) -> &mut Self {
        if values.is_empty() {
            self.conditions.push("FALSE".to_string());
            return self;
        }
        let placeholders: Vec<String> = values
            .iter()
            .map(|v| self.params.push(v.clone(), field.sql_type))
            .collect();
        self.conditions.push(format!(
            "{}.\"{}\" IN ({})",
            ROOT_ALIAS,
            field.column,
            placeholders.join(", ")
        ));
        self
    }

    pub fn order(&mut self, order_spec: &Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(self.model, order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i64>, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit {
            if l < 0 {
                return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
            }
        }
        if let Some(o) = offset {
            if o < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.limit = limit;
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> SqlResult {
        let inner = [
            format!("SELECT {}", select_list(Some(ROOT_ALIAS), &self.columns)),
            format!("FROM \"{}\" {}", self.model.table, ROOT_ALIAS),
            self.build_where_clause(),
            FilterOrder::generate(ROOT_ALIAS, &self.order_data),
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult {
            query: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner),
            params: self.params.values().to_vec(),
        }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let where_clause = self.build_where_clause();
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\" {}", self.model.table, ROOT_ALIAS)
        } else {
            format!(
                "SELECT COUNT(*) AS count FROM \"{}\" {} {}",
                self.model.table, ROOT_ALIAS, where_clause
            )
        };
        SqlResult { query, params: self.params.values().to_vec() }
    }

    fn build_where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

/// `t0."author_id" AS "authorId", ...`
pub fn select_list(alias: Option<&str>, columns: &[&'static FieldDef]) -> String {
    columns
        .iter()
        .map(|f| match alias {
            Some(a) => format!("{}.\"{}\" AS \"{}\"", a, f.column, f.name),
            None => format!("\"{}\" AS \"{}\"", f.column, f.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{post_descriptor, user_descriptor};
    use serde_json::json;

    #[test]
    fn renders_full_select() {
        let model = post_descriptor();
        let mut filter = Filter::new(model);
        filter
            .select(vec![model.field("id").unwrap(), model.field("authorId").unwrap()])
            .where_clause(&json!({ "published": true }))
            .unwrap()
            .order(&json!({ "createdAt": "desc" }))
            .unwrap()
            .limit(Some(10), Some(20))
            .unwrap();

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM (SELECT t0.\"id\" AS \"id\", t0.\"author_id\" AS \"authorId\" \
             FROM \"posts\" t0 WHERE t0.\"published\" = $1::boolean ORDER BY t0.\"created_at\" DESC LIMIT 10 OFFSET 20) t"
        );
        assert_eq!(sql.params, vec![json!(true)]);
    }

    #[test]
    fn count_shares_where_and_params() {
        let mut filter = Filter::new(user_descriptor());
        filter.where_clause(&json!({ "email": "ada@example.com" })).unwrap();
        let sql = filter.to_count_sql();
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) AS count FROM \"users\" t0 WHERE t0.\"email\" = $1::text"
        );
        assert_eq!(sql.params.len(), 1);

        let sql = Filter::new(user_descriptor()).to_count_sql();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"users\" t0");
    }

    #[test]
    fn where_in_batches_keys() {
        let model = post_descriptor();
        let mut filter = Filter::new(model);
        filter.where_in(model.field("authorId").unwrap(), &[json!("a"), json!("b")]);
        assert!(filter
            .to_sql()
            .query
            .contains("WHERE t0.\"author_id\" IN ($1::uuid, $2::uuid)"));
    }

    #[test]
    fn negative_limits_are_rejected() {
        let mut filter = Filter::new(post_descriptor());
        assert!(filter.limit(Some(-1), None).is_err());
        assert!(filter.limit(Some(1), Some(-1)).is_err());
    }
}
