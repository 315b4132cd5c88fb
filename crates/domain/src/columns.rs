use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::column::ColumnCatalog;
use crate::config::GridViewConfig;

/// Position given to column entries without an explicit order.
pub const UNORDERED_POSITION: i64 = 999;

/// Resolved visibility and position of a configured column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPlacement {
    /// Explicit visibility.
    pub visible: bool,
    /// Position, defaulted when absent.
    pub order: i64,
}

/// Returns visible column keys ordered by position.
///
/// Required columns are included even when hidden. Ties keep config order.
/// Keys missing from `columns` are still returned.
#[must_use]
pub fn extract_visible_columns(config: &GridViewConfig, columns: &ColumnCatalog) -> Vec<String> {
    let mut ordered: Vec<(i64, &str)> = config
        .columns
        .iter()
        .filter(|column| {
            column.visible || columns.get(&column.key).is_some_and(|meta| meta.required)
        })
        .map(|column| {
            (
                column.order.unwrap_or(UNORDERED_POSITION),
                column.key.as_str(),
            )
        })
        .collect();

    ordered.sort_by_key(|(order, _)| *order);
    ordered.into_iter().map(|(_, key)| key.to_owned()).collect()
}

/// Returns every configured column with defaults applied.
#[must_use]
pub fn extract_column_configuration(config: &GridViewConfig) -> BTreeMap<String, ColumnPlacement> {
    config
        .columns
        .iter()
        .map(|column| {
            (
                column.key.clone(),
                ColumnPlacement {
                    visible: column.visible,
                    order: column.order.unwrap_or(UNORDERED_POSITION),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{extract_column_configuration, extract_visible_columns};
    use crate::column::{ColumnCatalog, ColumnMetadata};
    use crate::config::{ColumnSpec, GridViewConfig};

    fn config(columns: Vec<ColumnSpec>) -> GridViewConfig {
        GridViewConfig {
            columns,
            ..GridViewConfig::default()
        }
    }

    #[test]
    fn required_column_stays_visible_when_hidden() {
        let catalog = ColumnCatalog::new(vec![ColumnMetadata::new("id", "Id").required()]);
        let config = config(vec![ColumnSpec::new("id", false, Some(0))]);

        assert_eq!(extract_visible_columns(&config, &catalog), vec!["id".to_owned()]);
    }

    #[test]
    fn visible_columns_sort_stably_by_order() {
        let config = config(vec![
            ColumnSpec::new("c", true, None),
            ColumnSpec::new("a", true, Some(2)),
            ColumnSpec::new("hidden", false, Some(0)),
            ColumnSpec::new("b", true, Some(2)),
            ColumnSpec::new("first", true, Some(1)),
        ]);

        assert_eq!(
            extract_visible_columns(&config, &ColumnCatalog::default()),
            vec!["first", "a", "b", "c"]
        );
    }

    #[test]
    fn column_configuration_defaults_missing_order() {
        let config = config(vec![ColumnSpec::new("name", false, None)]);
        let placements = extract_column_configuration(&config);

        assert_eq!(placements.get("name").map(|placement| placement.order), Some(999));
        assert_eq!(placements.get("name").map(|placement| placement.visible), Some(false));
    }
}
