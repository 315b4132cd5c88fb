use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use gridview_application::{
    GridRecord, GridRecordPage, GridRecordQuery, GridRecordRepository, NativeComparison,
    NativeCondition, NativeExpression, NativeOrder,
};
use gridview_core::AppResult;
use gridview_domain::{SortDirection, scalar_text};
use serde_json::Value;
use tokio::sync::RwLock;

/// In-memory grid row store evaluating compiled conditions against JSON rows.
#[derive(Debug, Default)]
pub struct InMemoryGridRecordRepository {
    tables: RwLock<HashMap<String, Vec<GridRecord>>>,
}

impl InMemoryGridRecordRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces one row.
    pub async fn upsert_record(&self, table: &str, id: impl Into<String>, data: Value) {
        let id = id.into();
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_owned()).or_default();
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => row.data = data,
            None => rows.push(GridRecord { id, data }),
        }
    }
}

#[async_trait]
impl GridRecordRepository for InMemoryGridRecordRepository {
    async fn query_grid_records(
        &self,
        table: &str,
        query: GridRecordQuery,
    ) -> AppResult<GridRecordPage> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&GridRecord> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .conditions
                            .iter()
                            .all(|expression| matches_expression(table, &row.data, expression))
                    })
                    .collect()
            })
            .unwrap_or_default();

        matching.sort_by(|left, right| {
            compare_rows(table, &query.order, left, right).then_with(|| left.id.cmp(&right.id))
        });

        Ok(GridRecordPage {
            total: matching.len(),
            records: matching
                .into_iter()
                .skip(query.offset)
                .take(query.limit)
                .cloned()
                .collect(),
        })
    }
}

/// Resolves `table.field` or a dotted relation path inside a row.
fn field_value<'a>(table: &str, data: &'a Value, field: &str) -> Option<&'a Value> {
    let path = field
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(field);

    path.split('.')
        .try_fold(data, |current, segment| current.get(segment))
        .filter(|value| !value.is_null())
}

fn matches_expression(table: &str, data: &Value, expression: &NativeExpression) -> bool {
    match expression {
        NativeExpression::Condition(condition) => matches_condition(table, data, condition),
        NativeExpression::And(children) => children
            .iter()
            .all(|child| matches_expression(table, data, child)),
        NativeExpression::Or(children) => children
            .iter()
            .any(|child| matches_expression(table, data, child)),
    }
}

fn matches_condition(table: &str, data: &Value, condition: &NativeCondition) -> bool {
    let actual = field_value(table, data, &condition.field);
    let expected = &condition.value;

    match condition.comparison {
        NativeComparison::Is => actual.is_none(),
        NativeComparison::IsNot => actual.is_some(),
        NativeComparison::Eq => actual.is_some_and(|actual| loosely_equal(actual, expected)),
        NativeComparison::NotEq => actual.is_some_and(|actual| !loosely_equal(actual, expected)),
        NativeComparison::In => actual.is_some_and(|actual| {
            list(expected)
                .iter()
                .any(|candidate| loosely_equal(actual, candidate))
        }),
        NativeComparison::NotIn => actual.is_some_and(|actual| {
            !list(expected)
                .iter()
                .any(|candidate| loosely_equal(actual, candidate))
        }),
        NativeComparison::Like => actual.is_some_and(|actual| {
            like(
                &scalar_text(actual).to_lowercase(),
                &scalar_text(expected).to_lowercase(),
            )
        }),
        NativeComparison::Gt => compare_present(actual, expected).is_some_and(Ordering::is_gt),
        NativeComparison::Gte => compare_present(actual, expected).is_some_and(Ordering::is_ge),
        NativeComparison::Lt => compare_present(actual, expected).is_some_and(Ordering::is_lt),
        NativeComparison::Lte => compare_present(actual, expected).is_some_and(Ordering::is_le),
    }
}

fn list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(f64::from(u8::from(*flag))),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if expected.is_null() {
        return false;
    }
    match (as_number(actual), as_number(expected)) {
        (Some(left), Some(right)) => left == right,
        _ => scalar_text(actual) == scalar_text(expected),
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (as_number(left), as_number(right)) {
        (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        _ => scalar_text(left).cmp(&scalar_text(right)),
    }
}

fn compare_present(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    let actual = actual?;
    (!expected.is_null()).then(|| compare_values(actual, expected))
}

/// Orders rows like PostgreSQL: nulls last ascending, first descending.
fn compare_rows(table: &str, order: &[NativeOrder], left: &GridRecord, right: &GridRecord) -> Ordering {
    for entry in order {
        let ordering = match (
            field_value(table, &left.data, &entry.field),
            field_value(table, &right.data, &entry.field),
        ) {
            (Some(left), Some(right)) => compare_values(left, right),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        let ordering = match entry.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering.is_ne() {
            return ordering;
        }
    }

    Ordering::Equal
}

/// SQL `LIKE` with `%` and `_` wildcards.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // matched[j]: pattern[..j] matches the text prefix consumed so far.
    let mut matched = vec![false; pattern.len() + 1];
    matched[0] = true;
    for index in 1..=pattern.len() {
        matched[index] = matched[index - 1] && pattern[index - 1] == '%';
    }

    for character in text {
        let mut next = vec![false; pattern.len() + 1];
        for index in 1..=pattern.len() {
            next[index] = match pattern[index - 1] {
                '%' => next[index - 1] || matched[index],
                '_' => matched[index - 1],
                literal => matched[index - 1] && literal == character,
            };
        }
        matched = next;
    }

    matched[pattern.len()]
}

#[cfg(test)]
mod tests {
    use gridview_application::{
        GridRecordQuery, GridRecordRepository, NativeComparison, NativeCondition,
        NativeExpression, NativeOrder,
    };
    use gridview_domain::SortDirection;
    use serde_json::{Value, json};

    use super::{InMemoryGridRecordRepository, like};

    async fn repository() -> InMemoryGridRecordRepository {
        let repository = InMemoryGridRecordRepository::new();
        let rows = [
            ("1", json!({"name": "Ada Lovelace", "age": 36, "status": "active", "branches": {"name": "North"}})),
            ("2", json!({"name": "Grace Hopper", "age": 85, "status": "inactive", "branches": {"name": "South"}})),
            ("3", json!({"name": "Alan Turing", "age": 41, "status": "active", "retired": null})),
        ];
        for (id, data) in rows {
            repository.upsert_record("members", id, data).await;
        }
        repository
    }

    fn condition(field: &str, comparison: NativeComparison, value: Value) -> NativeExpression {
        NativeExpression::Condition(NativeCondition::new(field, comparison, value))
    }

    async fn ids(query: GridRecordQuery) -> Vec<String> {
        repository()
            .await
            .query_grid_records("members", query)
            .await
            .unwrap_or_default()
            .records
            .into_iter()
            .map(|record| record.id)
            .collect()
    }

    #[tokio::test]
    async fn numeric_comparison_falls_back_to_text_for_mixed_rows() {
        let repository = InMemoryGridRecordRepository::new();
        for (id, age) in [("1", json!(3)), ("2", json!(12)), ("3", json!("n/a")), ("4", json!(""))] {
            repository.upsert_record("mixed", id, json!({"age": age})).await;
        }

        let page = repository
            .query_grid_records(
                "mixed",
                GridRecordQuery {
                    conditions: vec![condition("mixed.age", NativeComparison::Gt, json!(5))],
                    order: Vec::new(),
                    limit: 25,
                    offset: 0,
                },
            )
            .await
            .unwrap_or_default();

        let ids: Vec<String> = page.records.into_iter().map(|record| record.id).collect();
        assert_eq!(ids, vec!["2".to_owned(), "3".to_owned()]);
    }

    #[test]
    fn like_supports_both_wildcards() {
        assert!(like("ada lovelace", "%love%"));
        assert!(like("ada", "a_a"));
        assert!(like("ada", "ada%"));
        assert!(!like("ada", "%bob%"));
        assert!(like("", "%"));
    }

    #[tokio::test]
    async fn or_search_is_case_insensitive_and_follows_relation_paths() {
        let found = ids(GridRecordQuery {
            conditions: vec![NativeExpression::Or(vec![
                condition("members.name", NativeComparison::Like, json!("%ALAN%")),
                condition("branches.name", NativeComparison::Like, json!("%south%")),
            ])],
            limit: 10,
            ..GridRecordQuery::default()
        })
        .await;

        assert_eq!(found, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn numeric_bounds_and_in_lists_combine_with_and() {
        let found = ids(GridRecordQuery {
            conditions: vec![
                condition("members.age", NativeComparison::Gte, json!("40")),
                condition("members.status", NativeComparison::In, json!(["active"])),
            ],
            limit: 10,
            ..GridRecordQuery::default()
        })
        .await;

        assert_eq!(found, vec!["3"]);
    }

    #[tokio::test]
    async fn null_checks_treat_missing_fields_as_null() {
        let found = ids(GridRecordQuery {
            conditions: vec![condition("members.retired", NativeComparison::Is, Value::Null)],
            limit: 10,
            ..GridRecordQuery::default()
        })
        .await;

        assert_eq!(found, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn orders_and_pages_with_total() {
        let page = repository()
            .await
            .query_grid_records(
                "members",
                GridRecordQuery {
                    conditions: Vec::new(),
                    order: vec![NativeOrder {
                        field: "members.age".to_owned(),
                        direction: SortDirection::Desc,
                    }],
                    limit: 1,
                    offset: 1,
                },
            )
            .await
            .unwrap_or_default();

        assert_eq!(page.total, 3);
        assert_eq!(
            page.records.first().map(|record| record.id.as_str()),
            Some("3")
        );
    }
}
