use async_trait::async_trait;
use gridview_application::{
    GridRecord, GridRecordPage, GridRecordQuery, GridRecordRepository, NativeComparison,
    NativeCondition, NativeExpression,
};
use gridview_core::{AppError, AppResult};
use gridview_domain::SortDirection;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

/// PostgreSQL-backed grid rows stored as JSON documents per table name.
#[derive(Clone)]
pub struct PostgresGridRecordRepository {
    pool: PgPool,
}

impl PostgresGridRecordRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces one row.
    pub async fn upsert_record(&self, table: &str, record_id: &str, data: Value) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO grid_records (table_name, record_id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (table_name, record_id)
            DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(table)
        .bind(record_id)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to store record '{record_id}' in table '{table}': {error}"
            ))
        })?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct GridRecordRow {
    record_id: String,
    data: Value,
}

#[derive(Debug, FromRow)]
struct CountRow {
    total: i64,
}

#[async_trait]
impl GridRecordRepository for PostgresGridRecordRepository {
    async fn query_grid_records(
        &self,
        table: &str,
        query: GridRecordQuery,
    ) -> AppResult<GridRecordPage> {
        let limit = i64::try_from(query.limit).map_err(|error| {
            AppError::Validation(format!("invalid grid record query limit: {error}"))
        })?;
        let offset = i64::try_from(query.offset).map_err(|error| {
            AppError::Validation(format!("invalid grid record query offset: {error}"))
        })?;

        let mut count: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM grid_records");
        push_where(&mut count, table, &query.conditions);
        let total = count
            .build_query_as::<CountRow>()
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to count records in table '{table}': {error}"
                ))
            })?
            .total;

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT record_id, data FROM grid_records");
        push_where(&mut builder, table, &query.conditions);

        builder.push(" ORDER BY ");
        for order in &query.order {
            builder.push("data #> ");
            builder.push_bind(field_path(table, &order.field));
            builder.push(match order.direction {
                SortDirection::Asc => " ASC, ",
                SortDirection::Desc => " DESC, ",
            });
        }
        builder.push("record_id ASC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        debug!(table, sql = builder.sql(), "querying grid records");
        let rows = builder
            .build_query_as::<GridRecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to query records in table '{table}': {error}"
                ))
            })?;

        Ok(GridRecordPage {
            records: rows
                .into_iter()
                .map(|row| GridRecord {
                    id: row.record_id,
                    data: row.data,
                })
                .collect(),
            total: usize::try_from(total).unwrap_or_default(),
        })
    }
}

fn push_where(builder: &mut QueryBuilder<'_, Postgres>, table: &str, conditions: &[NativeExpression]) {
    builder.push(" WHERE table_name = ");
    builder.push_bind(table.to_owned());
    for expression in conditions {
        builder.push(" AND ");
        push_expression(builder, table, expression);
    }
}

fn push_expression(
    builder: &mut QueryBuilder<'_, Postgres>,
    table: &str,
    expression: &NativeExpression,
) {
    let (children, separator) = match expression {
        NativeExpression::Condition(condition) => {
            push_condition(builder, table, condition);
            return;
        }
        NativeExpression::And(children) => (children, " AND "),
        NativeExpression::Or(children) => (children, " OR "),
    };

    if children.is_empty() {
        builder.push("TRUE");
        return;
    }

    builder.push('(');
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_expression(builder, table, child);
    }
    builder.push(')');
}

/// Stored text that is safe to cast to `NUMERIC`.
const NUMERIC_TEXT: &str = r"^\s*[-+]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][-+]?[0-9]+)?\s*$";

fn ordering_operator(comparison: NativeComparison) -> Option<&'static str> {
    match comparison {
        NativeComparison::Gt => Some(" > "),
        NativeComparison::Gte => Some(" >= "),
        NativeComparison::Lt => Some(" < "),
        NativeComparison::Lte => Some(" <= "),
        _ => None,
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(text) => text.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

/// Numeric comparison for rows whose text parses as a number, text otherwise.
fn push_numeric_ordering(
    builder: &mut QueryBuilder<'_, Postgres>,
    path: Vec<String>,
    operator: &str,
    value: &Value,
) {
    builder.push("(CASE WHEN (data #>> ");
    builder.push_bind(path.clone());
    builder.push(") ~ ");
    builder.push_bind(NUMERIC_TEXT);
    builder.push(" THEN (data #>> ");
    builder.push_bind(path.clone());
    builder.push(")::NUMERIC");
    builder.push(operator);
    builder.push_bind(json_text(value));
    builder.push("::NUMERIC ELSE (data #>> ");
    builder.push_bind(path);
    builder.push(')');
    builder.push(operator);
    builder.push_bind(json_text(value));
    builder.push(" END)");
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, table: &str, condition: &NativeCondition) {
    let path = field_path(table, &condition.field);
    let value = &condition.value;

    if let Some(operator) = ordering_operator(condition.comparison)
        && is_numeric(value)
    {
        push_numeric_ordering(builder, path, operator, value);
        return;
    }

    builder.push("(data #>> ");
    builder.push_bind(path);
    builder.push(')');

    match condition.comparison {
        NativeComparison::Is => {
            builder.push(" IS NULL");
        }
        NativeComparison::IsNot => {
            builder.push(" IS NOT NULL");
        }
        NativeComparison::Eq => {
            builder.push(" = ");
            builder.push_bind(json_text(value));
        }
        NativeComparison::NotEq => {
            builder.push(" <> ");
            builder.push_bind(json_text(value));
        }
        NativeComparison::Like => {
            builder.push(" ILIKE ");
            builder.push_bind(json_text(value));
        }
        NativeComparison::In => {
            builder.push(" = ANY(");
            builder.push_bind(json_list(value));
            builder.push(')');
        }
        NativeComparison::NotIn => {
            builder.push(" <> ALL(");
            builder.push_bind(json_list(value));
            builder.push(')');
        }
        NativeComparison::Gt
        | NativeComparison::Gte
        | NativeComparison::Lt
        | NativeComparison::Lte => {
            if let Some(operator) = ordering_operator(condition.comparison) {
                builder.push(operator);
                builder.push_bind(json_text(value));
            }
        }
    }
}

/// Splits a possibly `table.`-qualified field into a JSON path.
fn field_path(table: &str, field: &str) -> Vec<String> {
    field
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(field)
        .split('.')
        .map(ToOwned::to_owned)
        .collect()
}

/// Text the `#>>` operator yields for a JSON scalar.
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn json_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().filter_map(json_text).collect(),
        other => json_text(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use gridview_application::{
        GridRecordQuery, GridRecordRepository, NativeComparison, NativeCondition,
        NativeExpression,
    };
    use serde_json::json;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::{PgPool, Postgres, QueryBuilder};

    use super::{PostgresGridRecordRepository, field_path, is_numeric, json_text, push_where};

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres grid record repository tests: {error}");
        }

        Some(pool)
    }

    #[test]
    fn numeric_values_include_numeric_strings() {
        assert!(is_numeric(&json!(5)));
        assert!(is_numeric(&json!(" 2.5 ")));
        assert!(!is_numeric(&json!("2024-01-01")));
        assert!(!is_numeric(&json!("n/a")));
        assert!(!is_numeric(&json!(true)));
    }

    #[tokio::test]
    async fn numeric_comparison_tolerates_text_in_the_same_field() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresGridRecordRepository::new(pool);
        let table = format!(
            "mixed-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        for (id, age) in [("1", json!(3)), ("2", json!(12)), ("3", json!("n/a")), ("4", json!(""))] {
            assert!(
                repository
                    .upsert_record(&table, id, json!({"age": age}))
                    .await
                    .is_ok()
            );
        }

        let page = repository
            .query_grid_records(
                &table,
                GridRecordQuery {
                    conditions: vec![NativeExpression::Condition(NativeCondition::new(
                        format!("{table}.age"),
                        NativeComparison::Gt,
                        json!(5),
                    ))],
                    order: Vec::new(),
                    limit: 25,
                    offset: 0,
                },
            )
            .await;

        assert!(page.is_ok());
        let ids: Vec<String> = page
            .map(|page| page.records.into_iter().map(|record| record.id).collect())
            .unwrap_or_default();
        // "n/a" sorts above "5" as text, like the in-memory adapter.
        assert_eq!(ids, vec!["2".to_owned(), "3".to_owned()]);
    }

    #[test]
    fn field_path_strips_table_and_splits_relations() {
        assert_eq!(field_path("members", "members.name"), vec!["name"]);
        assert_eq!(field_path("members", "branches.name"), vec!["branches", "name"]);
        assert_eq!(field_path("members", "membership"), vec!["membership"]);
    }

    #[test]
    fn json_text_matches_postgres_scalar_text() {
        assert_eq!(json_text(&json!(true)).as_deref(), Some("true"));
        assert_eq!(json_text(&json!(36)).as_deref(), Some("36"));
        assert_eq!(json_text(&json!("x")).as_deref(), Some("x"));
        assert!(json_text(&json!(null)).is_none());
    }

    #[test]
    fn renders_nested_expression_with_bound_values() {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT 1 FROM grid_records");
        push_where(
            &mut builder,
            "members",
            &[NativeExpression::Or(vec![
                NativeExpression::Condition(NativeCondition::new(
                    "members.name",
                    NativeComparison::Like,
                    json!("%ada%"),
                )),
                NativeExpression::And(vec![
                    NativeExpression::Condition(NativeCondition::new(
                        "members.age",
                        NativeComparison::Gte,
                        json!(40),
                    )),
                    NativeExpression::Condition(NativeCondition::new(
                        "members.retired",
                        NativeComparison::Is,
                        json!(null),
                    )),
                ]),
            ])],
        );

        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM grid_records WHERE table_name = $1 AND ((data #>> $2) ILIKE $3 OR ((CASE WHEN (data #>> $4) ~ $5 THEN (data #>> $6)::NUMERIC >= $7::NUMERIC ELSE (data #>> $8) >= $9 END) AND (data #>> $10) IS NULL))"
        );
    }
}
