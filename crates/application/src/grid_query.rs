//! Compilation of view configs into backend-native conditions.
//!
//! A native condition is a `(field, comparison, value)` triple whose key
//! renders as `field`, `field !=`, `field LIKE`, `field IS NOT`, and so on.
//! Both compilers degrade to no-ops: unknown operators, blank fields, the
//! `_search` pseudo-field and empty groups contribute nothing.

use gridview_domain::{
    ColumnCatalog, Conjunction, ExpressionNode, FilterCondition, FilterOperator, GridViewConfig,
    OrderedMap, SortDirection, scalar_text,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Comparison of a native condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeComparison {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// Pattern match with `%` wildcards.
    Like,
    /// Membership.
    In,
    /// Exclusion.
    NotIn,
    /// `IS NULL`
    Is,
    /// `IS NOT NULL`
    IsNot,
}

impl NativeComparison {
    /// Returns the suffix appended to the field in the condition key.
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Eq => "",
            Self::NotEq => " !=",
            Self::Gt => " >",
            Self::Gte => " >=",
            Self::Lt => " <",
            Self::Lte => " <=",
            Self::Like => " LIKE",
            Self::In => " IN",
            Self::NotIn => " NOT IN",
            Self::Is => " IS",
            Self::IsNot => " IS NOT",
        }
    }
}

/// One backend-native condition.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCondition {
    /// Possibly qualified field.
    pub field: String,
    /// Comparison.
    pub comparison: NativeComparison,
    /// Operand; a list for `IN`/`NOT IN`, null for `IS`/`IS NOT`.
    pub value: Value,
}

impl NativeCondition {
    /// Creates a condition.
    #[must_use]
    pub fn new(field: impl Into<String>, comparison: NativeComparison, value: Value) -> Self {
        Self {
            field: field.into(),
            comparison,
            value,
        }
    }

    /// Returns the condition key, e.g. `Members.status !=`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}{}", self.field, self.comparison.suffix())
    }

    /// Returns the condition with its field qualified.
    #[must_use]
    pub fn qualified(mut self, table: &str) -> Self {
        self.field = qualify_field(&self.field, table);
        self
    }
}

/// Boolean combination of native conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeExpression {
    /// Single condition.
    Condition(NativeCondition),
    /// Conjunction.
    And(Vec<NativeExpression>),
    /// Disjunction container.
    Or(Vec<NativeExpression>),
}

impl NativeExpression {
    /// Returns the JSON rendering: `{key: value}` for a condition, a list for
    /// a conjunction and `{"OR": [...]}` for a disjunction.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Condition(condition) => {
                let mut map = Map::new();
                map.insert(condition.key(), condition.value.clone());
                Value::Object(map)
            }
            Self::And(children) => Value::Array(children.iter().map(Self::to_value).collect()),
            Self::Or(children) => {
                let mut map = Map::new();
                map.insert(
                    "OR".to_owned(),
                    Value::Array(children.iter().map(Self::to_value).collect()),
                );
                Value::Object(map)
            }
        }
    }

    fn from_conditions(mut conditions: Vec<NativeCondition>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop().map(Self::Condition),
            _ => Some(Self::And(
                conditions.into_iter().map(Self::Condition).collect(),
            )),
        }
    }
}

/// Ordered native conditions keyed by [`NativeCondition::key`].
///
/// A later condition with the same key replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeConditionMap {
    entries: OrderedMap<NativeCondition>,
}

impl NativeConditionMap {
    /// Inserts a condition, replacing one with the same key.
    pub fn insert(&mut self, condition: NativeCondition) {
        self.entries.insert(condition.key(), condition);
    }

    /// Returns the value stored under a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|condition| &condition.value)
    }

    /// Returns the number of conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates conditions in insertion order.
    pub fn conditions(&self) -> impl Iterator<Item = &NativeCondition> {
        self.entries.values()
    }

    /// Returns the map with every field qualified.
    #[must_use]
    pub fn qualified(self, table: &str) -> Self {
        let mut qualified = Self::default();
        for (_, condition) in self.entries {
            qualified.insert(condition.qualified(table));
        }
        qualified
    }

    /// Returns the conjunction of all conditions, or `None` when empty.
    #[must_use]
    pub fn into_expression(self) -> Option<NativeExpression> {
        NativeExpression::from_conditions(self.entries.into_iter().map(|(_, c)| c).collect())
    }

    /// Returns the `{key: value}` JSON rendering.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for NativeConditionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, condition) in self.entries.iter() {
            map.serialize_entry(key, &condition.value)?;
        }
        map.end()
    }
}

/// Order clause entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeOrder {
    /// Possibly qualified field.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

/// Prefixes `table.` unless the field is already qualified or the table is empty.
#[must_use]
pub fn qualify_field(field: &str, table: &str) -> String {
    if table.is_empty() || field.contains('.') {
        field.to_owned()
    } else {
        format!("{table}.{field}")
    }
}

/// Translates one filter condition on `field` through the operator table.
///
/// `dateRange` yields one condition per present bound.
#[must_use]
pub fn compile_condition(condition: &FilterCondition, field: &str) -> Vec<NativeCondition> {
    let value = &condition.value;
    let single = |comparison, value| vec![NativeCondition::new(field, comparison, value)];
    let as_list = || match value {
        Value::Array(_) => value.clone(),
        other => Value::Array(vec![other.clone()]),
    };

    match condition.operator {
        FilterOperator::Eq => single(NativeComparison::Eq, value.clone()),
        FilterOperator::Neq => single(NativeComparison::NotEq, value.clone()),
        FilterOperator::Gt => single(NativeComparison::Gt, value.clone()),
        FilterOperator::Gte => single(NativeComparison::Gte, value.clone()),
        FilterOperator::Lt => single(NativeComparison::Lt, value.clone()),
        FilterOperator::Lte => single(NativeComparison::Lte, value.clone()),
        FilterOperator::Contains => single(
            NativeComparison::Like,
            Value::String(format!("%{}%", scalar_text(value))),
        ),
        FilterOperator::StartsWith => single(
            NativeComparison::Like,
            Value::String(format!("{}%", scalar_text(value))),
        ),
        FilterOperator::EndsWith => single(
            NativeComparison::Like,
            Value::String(format!("%{}", scalar_text(value))),
        ),
        FilterOperator::In => single(NativeComparison::In, as_list()),
        FilterOperator::NotIn => single(NativeComparison::NotIn, as_list()),
        FilterOperator::IsNull => single(NativeComparison::Is, Value::Null),
        FilterOperator::IsNotNull => single(NativeComparison::IsNot, Value::Null),
        FilterOperator::DateRange => date_range_conditions(field, value),
    }
}

fn date_range_conditions(field: &str, value: &Value) -> Vec<NativeCondition> {
    let Some(bounds) = value.as_array().filter(|bounds| bounds.len() == 2) else {
        return Vec::new();
    };
    let present = |bound: &Value| !bound.is_null() && bound.as_str() != Some("");

    let mut conditions = Vec::new();
    if present(&bounds[0]) {
        conditions.push(NativeCondition::new(field, NativeComparison::Gte, bounds[0].clone()));
    }
    if present(&bounds[1]) {
        conditions.push(NativeCondition::new(field, NativeComparison::Lte, bounds[1].clone()));
    }
    conditions
}

fn contributes(condition: &FilterCondition) -> bool {
    !condition.field.is_empty() && !condition.is_search()
}

/// Compiles the legacy flat AND list into a condition map with unqualified fields.
#[must_use]
pub fn compile_flat(config: &GridViewConfig) -> NativeConditionMap {
    let mut map = NativeConditionMap::default();
    for filter in config.filters.iter().filter(|filter| contributes(filter)) {
        for condition in compile_condition(filter, &filter.field) {
            map.insert(condition);
        }
    }
    map
}

/// Compiles an untrusted `filters` list, skipping entries that cannot be read.
#[must_use]
pub fn compile_flat_value(filters: &Value) -> NativeConditionMap {
    let config = GridViewConfig {
        filters: filters
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(FilterCondition::from_value)
                    .collect()
            })
            .unwrap_or_default(),
        ..GridViewConfig::default()
    };
    compile_flat(&config)
}

/// Compiles an expression tree, qualifying fields with `table`.
///
/// Returns `None` when nothing survives; an empty group never becomes an
/// always-true or always-false condition.
#[must_use]
pub fn compile_expression(node: &ExpressionNode, table: &str) -> Option<NativeExpression> {
    match node {
        ExpressionNode::Condition(condition) => {
            NativeExpression::from_conditions(compile_leaf(condition, table))
        }
        ExpressionNode::Group {
            conjunction,
            conditions,
        } => {
            let mut compiled = Vec::new();
            for child in conditions {
                match child {
                    ExpressionNode::Condition(condition) => compiled.extend(
                        compile_leaf(condition, table)
                            .into_iter()
                            .map(NativeExpression::Condition),
                    ),
                    ExpressionNode::Group { .. } => {
                        compiled.extend(compile_expression(child, table));
                    }
                }
            }

            if compiled.is_empty() {
                return None;
            }
            Some(match conjunction {
                Conjunction::Or => NativeExpression::Or(compiled),
                Conjunction::And => NativeExpression::And(compiled),
            })
        }
    }
}

/// Compiles an untrusted expression, dropping what cannot be read.
#[must_use]
pub fn compile_expression_value(raw: &Value, table: &str) -> Option<NativeExpression> {
    ExpressionNode::from_value(raw).and_then(|node| compile_expression(&node, table))
}

fn compile_leaf(condition: &FilterCondition, table: &str) -> Vec<NativeCondition> {
    if !contributes(condition) {
        return Vec::new();
    }
    compile_condition(condition, &qualify_field(&condition.field, table))
}

/// Builds the OR of `LIKE %term%` over searchable columns.
#[must_use]
pub fn compile_search(term: &str, columns: &ColumnCatalog, table: &str) -> Option<NativeExpression> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let pattern = Value::String(format!("%{term}%"));
    let conditions: Vec<NativeExpression> = columns
        .searchable()
        .map(|column| {
            let field = column
                .query_field
                .clone()
                .unwrap_or_else(|| qualify_field(&column.key, table));
            NativeExpression::Condition(NativeCondition::new(
                field,
                NativeComparison::Like,
                pattern.clone(),
            ))
        })
        .collect();

    (!conditions.is_empty()).then_some(NativeExpression::Or(conditions))
}
