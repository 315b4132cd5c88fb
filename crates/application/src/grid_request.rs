use gridview_domain::{ActiveFilterValue, OrderedMap, ViewId};
use url::form_urlencoded;

/// Aspects a user changed away from the loaded saved view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyFlags {
    /// `dirty[search]`
    pub search: bool,
    /// `dirty[filters]`
    pub filters: bool,
    /// `dirty[sort]`
    pub sort: bool,
    /// `dirty[columns]`
    pub columns: bool,
}

/// Grid query string parsed into its parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridRequest {
    /// `search`; `Some("")` clears a saved search and differs from absent.
    pub search: Option<String>,
    /// `filter[<col>]` and `filter[<col>][]` values.
    pub filters: OrderedMap<ActiveFilterValue>,
    /// `sort`
    pub sort: Option<String>,
    /// `direction`
    pub direction: Option<String>,
    /// `view_id`
    pub view_id: Option<ViewId>,
    /// `ignore_default=1`
    pub ignore_default: bool,
    /// `dirty[...]` markers.
    pub dirty: DirtyFlags,
    /// `columns`, split on commas.
    pub columns: Option<Vec<String>>,
    /// `page`, at least 1.
    pub page: u32,
    params: Vec<(String, String)>,
}

impl GridRequest {
    /// Parses a raw query string (without the leading `?`).
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(
            form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned())),
        )
    }

    /// Builds a request from decoded key/value pairs in document order.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut request = Self {
            page: 1,
            ..Self::default()
        };
        let mut lists: OrderedMap<Vec<String>> = OrderedMap::new();

        for (key, value) in pairs {
            if let Some(rest) = key.strip_prefix("filter[") {
                if let Some((column, tail)) = rest.split_once(']') {
                    if tail.is_empty() {
                        request
                            .filters
                            .insert(column, ActiveFilterValue::Single(value.clone()));
                    } else if tail.starts_with('[') {
                        match lists.get_mut(column) {
                            Some(values) => values.push(value.clone()),
                            None => {
                                lists.insert(column, vec![value.clone()]);
                            }
                        }
                    }
                }
            } else if let Some(aspect) = key
                .strip_prefix("dirty[")
                .and_then(|rest| rest.strip_suffix(']'))
            {
                match aspect {
                    "search" => request.dirty.search = true,
                    "filters" => request.dirty.filters = true,
                    "sort" => request.dirty.sort = true,
                    "columns" => request.dirty.columns = true,
                    _ => {}
                }
            } else {
                match key.as_str() {
                    "search" => request.search = Some(value.clone()),
                    "sort" => request.sort = Some(value.clone()).filter(|sort| !sort.is_empty()),
                    "direction" => request.direction = Some(value.clone()),
                    "view_id" => {
                        request.view_id =
                            Some(ViewId::parse(&value)).filter(|_| !value.trim().is_empty());
                    }
                    "ignore_default" => {
                        request.ignore_default = !matches!(value.as_str(), "" | "0");
                    }
                    "columns" => {
                        request.columns = Some(
                            value
                                .split(',')
                                .map(str::trim)
                                .filter(|column| !column.is_empty())
                                .map(ToOwned::to_owned)
                                .collect(),
                        );
                    }
                    "page" => {
                        request.page = value.trim().parse::<u32>().unwrap_or(1).max(1);
                    }
                    _ => {}
                }
            }
            request.params.push((key, value));
        }

        for (column, values) in lists {
            request
                .filters
                .insert(column, ActiveFilterValue::Multiple(values));
        }

        request
    }

    /// Returns the last raw value of a parameter, e.g. `start_on_start`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a non-empty parameter value.
    #[must_use]
    pub fn non_empty_param(&self, name: &str) -> Option<&str> {
        self.param(name).filter(|value| !value.is_empty())
    }
}
