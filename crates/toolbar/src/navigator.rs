use gridview_core::{AppError, AppResult};
use gridview_domain::{ActiveFilterValue, OrderedMap};
use url::Url;

/// Query parameters that scope an embedded grid to an owning record.
pub const CONTEXT_PARAMS: [&str; 3] = ["member_id", "branch_id", "gathering_id"];

/// Result of a toolbar navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Only the data frame reloads.
    Frame {
        /// New source of the data frame.
        frame_src: String,
        /// URL pushed into history.
        history_url: String,
    },
    /// No data frame is known; the whole page loads.
    FullPage(String),
}

impl Navigation {
    /// URL the browser ends up showing.
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::Frame { history_url, .. } => history_url,
            Self::FullPage(url) => url,
        }
    }
}

type Pairs = Vec<(String, String)>;

fn set_param(pairs: &mut Pairs, key: &str, value: &str) {
    let mut replaced = false;
    pairs.retain_mut(|(existing, current)| {
        if existing != key {
            return true;
        }
        if replaced {
            return false;
        }
        value.clone_into(current);
        replaced = true;
        true
    });
    if !replaced {
        pairs.push((key.to_owned(), value.to_owned()));
    }
}

fn delete_param(pairs: &mut Pairs, key: &str) {
    pairs.retain(|(existing, _)| existing != key);
}

fn encode(pairs: &Pairs) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish()
}

fn set_query(url: &mut Url, pairs: &Pairs) {
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&encode(pairs)));
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{query}", url.path()),
        _ => url.path().to_owned(),
    }
}

/// Builds toolbar URLs from the current location and drives frame navigation.
#[derive(Debug, Clone)]
pub struct GridNavigator {
    location: Url,
    frame_src: Option<Url>,
    history: Vec<String>,
}

impl GridNavigator {
    /// Creates a navigator for the page at `location`.
    pub fn new(location: &str) -> AppResult<Self> {
        let location = Url::parse(location).map_err(|error| {
            AppError::Validation(format!("invalid page location '{location}': {error}"))
        })?;
        Ok(Self {
            location,
            frame_src: None,
            history: Vec::new(),
        })
    }

    /// Records the source of the grid's data frame.
    pub fn set_frame_src(&mut self, frame_src: &str) -> AppResult<()> {
        self.frame_src = Some(self.resolve(frame_src)?);
        Ok(())
    }

    /// Current page location.
    #[must_use]
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Current data frame source.
    #[must_use]
    pub fn frame_src(&self) -> Option<&Url> {
        self.frame_src.as_ref()
    }

    /// URLs pushed into history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Returns the first value of a query parameter of the current location.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<String> {
        self.location
            .query_pairs()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.into_owned())
    }

    fn current_pairs(&self) -> Pairs {
        self.location
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn resolve(&self, url: &str) -> AppResult<Url> {
        self.location
            .join(url)
            .map_err(|error| AppError::Validation(format!("invalid URL '{url}': {error}")))
    }

    /// Applies a minimal diff to the current query string.
    ///
    /// `None` deletes the key; `Some("")` keeps it with an empty value.
    #[must_use]
    pub fn build_url(&self, updates: &[(&str, Option<&str>)]) -> String {
        let mut pairs = self.current_pairs();
        for (key, value) in updates {
            match value {
                Some(value) => set_param(&mut pairs, key, value),
                None => delete_param(&mut pairs, key),
            }
        }
        self.url_with_pairs(&pairs)
    }

    /// Rewrites every filter parameter from `active` and resets paging.
    ///
    /// `view_search` is the search of the loaded view; it is written back
    /// unless the location already marks search as dirty.
    #[must_use]
    pub fn build_url_with_filters(
        &self,
        active: &OrderedMap<ActiveFilterValue>,
        view_search: Option<&str>,
    ) -> String {
        let mut pairs = self.current_pairs();

        let search_dirty = pairs.iter().any(|(key, _)| key == "dirty[search]");
        if let Some(search) = view_search.filter(|search| !search.is_empty())
            && !search_dirty
        {
            set_param(&mut pairs, "search", search);
        }

        pairs.retain(|(key, _)| {
            !(key.starts_with("filter[") || key.ends_with("_start") || key.ends_with("_end"))
        });

        for (column, value) in active.iter() {
            let values = value.values();
            if column.ends_with("_start") || column.ends_with("_end") {
                if let Some(first) = values.first() {
                    set_param(&mut pairs, column, first);
                }
            } else if let [single] = values.as_slice() {
                set_param(&mut pairs, &format!("filter[{column}]"), single);
            } else {
                let key = format!("filter[{column}][]");
                pairs.extend(values.iter().map(|raw| (key.clone(), (*raw).to_owned())));
            }
        }

        delete_param(&mut pairs, "page");

        self.url_with_pairs(&pairs)
    }

    fn url_with_pairs(&self, pairs: &Pairs) -> String {
        let mut url = self.location.clone();
        set_query(&mut url, pairs);
        path_and_query(&url)
    }

    /// Adds or replaces one parameter on a path-and-query URL.
    pub fn with_param(&self, url: &str, key: &str, value: &str) -> AppResult<String> {
        let mut resolved = self.resolve(url)?;
        let mut pairs: Pairs = resolved
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        set_param(&mut pairs, key, value);
        set_query(&mut resolved, &pairs);
        Ok(path_and_query(&resolved))
    }

    /// Removes one parameter from a path-and-query URL.
    pub fn without_param(&self, url: &str, key: &str) -> AppResult<String> {
        let mut resolved = self.resolve(url)?;
        let mut pairs: Pairs = resolved
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        delete_param(&mut pairs, key);
        set_query(&mut resolved, &pairs);
        Ok(path_and_query(&resolved))
    }

    /// URL of the current path with exactly one parameter.
    #[must_use]
    pub fn fresh_url(&self, key: &str, value: &str) -> String {
        let pairs = vec![(key.to_owned(), value.to_owned())];
        self.url_with_pairs(&pairs)
    }

    /// Loads `url` into the data frame and records it in history.
    ///
    /// The frame keeps its own path; context parameters of its previous
    /// source survive unless `url` sets them. Each call supersedes the last.
    pub fn navigate(&mut self, url: &str) -> AppResult<Navigation> {
        let target = self.resolve(url)?;

        let Some(current_src) = self.frame_src.as_ref() else {
            tracing::debug!(url, "no data frame source known, loading full page");
            self.location = target;
            return Ok(Navigation::FullPage(url.to_owned()));
        };

        let mut frame_pairs: Pairs = target
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        for param in CONTEXT_PARAMS {
            if frame_pairs.iter().any(|(key, _)| key == param) {
                continue;
            }
            if let Some((_, value)) = current_src.query_pairs().find(|(key, _)| key == param) {
                frame_pairs.push((param.to_owned(), value.into_owned()));
            }
        }

        let mut frame_url = current_src.clone();
        set_query(&mut frame_url, &frame_pairs);
        let frame_src = path_and_query(&frame_url);

        self.history.push(url.to_owned());
        self.location = target;
        self.frame_src = Some(frame_url);

        Ok(Navigation::Frame {
            frame_src,
            history_url: url.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests;
