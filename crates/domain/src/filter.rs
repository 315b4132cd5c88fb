use std::fmt::{Display, Formatter};
use std::str::FromStr;

use gridview_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved pseudo-field carrying the free-text search term inside saved filters.
pub const SEARCH_FIELD: &str = "_search";

/// Operator of a single filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// Equality.
    Eq,
    /// Inequality.
    Neq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Substring match.
    Contains,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// Membership in a list.
    In,
    /// Exclusion from a list.
    NotIn,
    /// Field is null.
    IsNull,
    /// Field is not null.
    IsNotNull,
    /// Inclusive `[start, end]` bounds, either side open.
    DateRange,
}

impl FilterOperator {
    /// Every supported operator in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Eq,
        Self::Neq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::In,
        Self::NotIn,
        Self::IsNull,
        Self::IsNotNull,
        Self::DateRange,
    ];

    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::IsNull => "isNull",
            Self::IsNotNull => "isNotNull",
            Self::DateRange => "dateRange",
        }
    }

    /// Returns true when the operator needs a non-null value.
    #[must_use]
    pub fn requires_value(&self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull | Self::DateRange)
    }
}

impl Display for FilterOperator {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|operator| operator.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown filter operator '{value}'")))
    }
}

/// Leaf condition `field operator value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Column key, optionally qualified as `Table.field`.
    pub field: String,
    /// Comparison operator.
    pub operator: FilterOperator,
    /// Scalar, list, or `[start, end]` pair.
    #[serde(default)]
    pub value: Value,
}

impl FilterCondition {
    /// Creates a condition.
    #[must_use]
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Reads a condition from untrusted JSON.
    ///
    /// Returns `None` when the entry is not an object, lacks a string `field`
    /// or carries an operator outside the supported set. Value requirements
    /// are not checked here; see [`FilterCondition::has_valid_value`].
    #[must_use]
    pub fn from_value(raw: &Value) -> Option<Self> {
        let object = raw.as_object()?;
        let field = object.get("field").and_then(Value::as_str)?;
        let operator = object
            .get("operator")
            .and_then(Value::as_str)
            .and_then(|operator| operator.parse().ok())?;

        Some(Self::new(
            field,
            operator,
            object.get("value").cloned().unwrap_or(Value::Null),
        ))
    }

    /// Returns true when the value satisfies the operator's requirements.
    #[must_use]
    pub fn has_valid_value(&self) -> bool {
        if self.operator.requires_value() && self.value.is_null() {
            return false;
        }

        if self.operator == FilterOperator::DateRange {
            return match self.value.as_array() {
                Some(bounds) if bounds.len() == 2 => !(is_blank(&bounds[0]) && is_blank(&bounds[1])),
                _ => false,
            };
        }

        true
    }

    /// Returns true for the reserved search pseudo-field.
    #[must_use]
    pub fn is_search(&self) -> bool {
        self.field == SEARCH_FIELD
    }
}

/// Conjunction joining the children of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conjunction {
    /// All children must match.
    #[serde(rename = "AND")]
    And,
    /// Any child may match.
    #[serde(rename = "OR")]
    Or,
}

impl Conjunction {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl FromStr for Conjunction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(AppError::Validation(format!(
                "unknown group conjunction '{value}'"
            ))),
        }
    }
}

/// Boolean expression tree over filter conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionNode {
    /// Interior node combining children.
    Group {
        /// How the children combine.
        #[serde(rename = "type")]
        conjunction: Conjunction,
        /// Child nodes in order.
        #[serde(default)]
        conditions: Vec<ExpressionNode>,
    },
    /// Leaf condition.
    Condition(FilterCondition),
}

impl ExpressionNode {
    /// Creates a group node.
    #[must_use]
    pub fn group(conjunction: Conjunction, conditions: Vec<ExpressionNode>) -> Self {
        Self::Group {
            conjunction,
            conditions,
        }
    }

    /// Creates a leaf node.
    #[must_use]
    pub fn condition(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self::Condition(FilterCondition::new(field, operator, value))
    }

    /// Reads an expression from untrusted JSON, dropping what cannot be understood.
    ///
    /// An object whose `type` is `AND`/`OR` (any case) is a group; every
    /// other object is read as a leaf. Leaves rejected by `accept_leaf`
    /// and non-object children are removed. Groups are kept even when all
    /// of their children were dropped.
    pub fn from_value_with(
        raw: &Value,
        accept_leaf: &impl Fn(&FilterCondition) -> bool,
    ) -> Option<Self> {
        let object = raw.as_object()?;
        let conjunction = object
            .get("type")
            .and_then(Value::as_str)
            .and_then(|kind| kind.parse::<Conjunction>().ok());

        match conjunction {
            Some(conjunction) => {
                let conditions = object
                    .get("conditions")
                    .and_then(Value::as_array)
                    .map(|children| {
                        children
                            .iter()
                            .filter_map(|child| Self::from_value_with(child, accept_leaf))
                            .collect()
                    })
                    .unwrap_or_default();

                Some(Self::group(conjunction, conditions))
            }
            None => FilterCondition::from_value(raw)
                .filter(|condition| accept_leaf(condition))
                .map(Self::Condition),
        }
    }

    /// Reads an expression accepting every parseable leaf.
    #[must_use]
    pub fn from_value(raw: &Value) -> Option<Self> {
        Self::from_value_with(raw, &|_| true)
    }

    /// Returns the group conjunction, or `None` for a leaf.
    #[must_use]
    pub fn conjunction(&self) -> Option<Conjunction> {
        match self {
            Self::Group { conjunction, .. } => Some(*conjunction),
            Self::Condition(_) => None,
        }
    }
}

/// Loose emptiness test used for date bounds.
///
/// Null, `""`, `"0"`, `0`, `false` and empty lists count as blank.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_none_or(|number| number == 0.0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

/// Renders a scalar the way it is spliced into a LIKE pattern or URL.
#[must_use]
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_owned(),
        Value::Bool(false) => String::new(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
