//! Lenient canonicalization and strict validation of raw view configs.
//!
//! [`normalize`] never fails: entries it cannot understand are dropped.
//! [`validate`] applies the same rules but reports every violation, and is
//! meant for the pre-save path only.

use serde_json::{Map, Value};

use crate::column::ColumnCatalog;
use crate::config::{
    ColumnSpec, DEFAULT_PAGE_SIZE, GridViewConfig, MAX_PAGE_SIZE, MIN_PAGE_SIZE, SortDirection,
    SortSpec,
};
use crate::filter::{ExpressionNode, FilterCondition};

/// Canonicalizes an untrusted config against the grid's columns.
#[must_use]
pub fn normalize(raw: &Value, columns: &ColumnCatalog) -> GridViewConfig {
    let filters = list_field(raw, "filters")
        .map(|entries| {
            entries
                .iter()
                .filter_map(FilterCondition::from_value)
                .filter(|filter| condition_is_valid(filter, columns))
                .collect()
        })
        .unwrap_or_default();

    let sort = list_field(raw, "sort")
        .map(|entries| {
            entries
                .iter()
                .filter(|entry| is_valid_sort(entry, columns))
                .filter_map(sort_from_value)
                .collect()
        })
        .unwrap_or_default();

    let columns_spec = list_field(raw, "columns")
        .map(|entries| {
            entries
                .iter()
                .enumerate()
                .filter_map(|(index, entry)| column_from_value(index, entry))
                .collect()
        })
        .unwrap_or_default();

    let expression = raw.get("expression").and_then(|expression| {
        ExpressionNode::from_value_with(expression, &|leaf| condition_is_valid(leaf, columns))
    });

    let search = raw
        .get("search")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    GridViewConfig {
        filters,
        expression,
        sort,
        columns: columns_spec,
        page_size: extract_page_size(raw),
        search,
    }
}

/// Reports every rule violation of an untrusted config as a readable message.
#[must_use]
pub fn validate(raw: &Value, columns: &ColumnCatalog) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(filters) = present(raw, "filters") {
        match filters.as_array() {
            Some(entries) => errors.extend(
                entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| !is_valid_filter(entry, columns))
                    .map(|(index, _)| format!("Invalid filter at index {index}")),
            ),
            None => errors.push("Filters must be an array".to_owned()),
        }
    }

    if let Some(sort) = present(raw, "sort") {
        match sort.as_array() {
            Some(entries) => errors.extend(
                entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| !is_valid_sort(entry, columns))
                    .map(|(index, _)| format!("Invalid sort at index {index}")),
            ),
            None => errors.push("Sort must be an array".to_owned()),
        }
    }

    if present(raw, "columns").is_some_and(|columns| !columns.is_array()) {
        errors.push("Columns must be an array".to_owned());
    }

    if let Some(page_size) = present(raw, "pageSize") {
        match numeric(page_size) {
            None => errors.push("Page size must be numeric".to_owned()),
            Some(size) if size < f64::from(MIN_PAGE_SIZE) || size > f64::from(MAX_PAGE_SIZE) => {
                errors.push(format!(
                    "Page size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"
                ));
            }
            Some(_) => {}
        }
    }

    errors
}

/// Returns the clamped page size, or the default when missing or non-numeric.
#[must_use]
pub fn extract_page_size(raw: &Value) -> u32 {
    present(raw, "pageSize")
        .and_then(numeric)
        .map(|size| {
            let size = size.trunc().clamp(f64::from(MIN_PAGE_SIZE), f64::from(MAX_PAGE_SIZE));
            // Clamped into [MIN_PAGE_SIZE, MAX_PAGE_SIZE], so the cast is exact.
            size as u32
        })
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Builds the config shown when no view applies: every column in declaration order.
#[must_use]
pub fn create_default(columns: &ColumnCatalog) -> GridViewConfig {
    GridViewConfig {
        columns: columns
            .iter()
            .zip(0_i64..)
            .map(|(column, order)| ColumnSpec::new(column.key.clone(), column.default_visible, Some(order)))
            .collect(),
        ..GridViewConfig::default()
    }
}

/// Returns true when a raw filter entry survives normalization.
#[must_use]
pub fn is_valid_filter(raw: &Value, columns: &ColumnCatalog) -> bool {
    FilterCondition::from_value(raw).is_some_and(|filter| condition_is_valid(&filter, columns))
}

/// Returns true when a raw sort entry survives normalization.
#[must_use]
pub fn is_valid_sort(raw: &Value, columns: &ColumnCatalog) -> bool {
    let Some(object) = raw.as_object() else {
        return false;
    };
    let Some(field) = object.get("field").and_then(Value::as_str) else {
        return false;
    };
    let direction_ok = object
        .get("direction")
        .and_then(Value::as_str)
        .is_some_and(|direction| direction.parse::<SortDirection>().is_ok());
    if !direction_ok {
        return false;
    }

    columns.is_empty() || (columns.contains(field) && columns.is_sortable(field))
}

fn condition_is_valid(filter: &FilterCondition, columns: &ColumnCatalog) -> bool {
    let field_known = columns.is_empty() || filter.is_search() || columns.contains(&filter.field);
    field_known && filter.has_valid_value()
}

fn sort_from_value(raw: &Value) -> Option<SortSpec> {
    let field = raw.get("field").and_then(Value::as_str)?;
    let direction = raw
        .get("direction")
        .and_then(Value::as_str)
        .and_then(|direction| direction.parse().ok())?;
    Some(SortSpec::new(field, direction))
}

fn column_from_value(index: usize, raw: &Value) -> Option<ColumnSpec> {
    let object = raw.as_object()?;
    let key = match object.get("key")? {
        Value::String(key) => key.clone(),
        Value::Number(key) => key.to_string(),
        _ => return None,
    };
    let visible = present_in(object, "visible").is_none_or(truthy);
    let order = present_in(object, "order")
        .map(integer)
        .unwrap_or_else(|| i64::try_from(index).unwrap_or(i64::MAX));

    Some(ColumnSpec::new(key, visible, Some(order)))
}

fn present<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.as_object().and_then(|object| present_in(object, key))
}

fn present_in<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn list_field<'a>(raw: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    present(raw, key).and_then(Value::as_array)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|number| number.is_finite()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    !crate::filter::is_blank(value)
}

fn integer(value: &Value) -> i64 {
    match value {
        Value::Bool(flag) => i64::from(*flag),
        // Saturating float-to-int conversion.
        Value::Number(number) => number
            .as_i64()
            .unwrap_or_else(|| number.as_f64().map_or(0, |number| number.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim_start();
            let sign_len = usize::from(text.starts_with(['-', '+']));
            let digits = text[sign_len..]
                .find(|character: char| !character.is_ascii_digit())
                .map_or(text.len(), |end| end + sign_len);
            text[..digits].parse().unwrap_or(0)
        }
        _ => 0,
    }
}
