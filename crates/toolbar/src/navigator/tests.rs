use gridview_domain::{ActiveFilterValue, OrderedMap};
use url::Url;

use super::{GridNavigator, Navigation};

fn navigator(location: &str) -> GridNavigator {
    GridNavigator::new(location).unwrap_or_else(|_| unreachable!())
}

fn query_of(path_and_query: &str) -> Vec<(String, String)> {
    Url::parse("http://localhost")
        .and_then(|base| base.join(path_and_query))
        .map(|url| {
            url.query_pairs()
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

fn value_of(path_and_query: &str, key: &str) -> Option<String> {
    query_of(path_and_query)
        .into_iter()
        .find(|(existing, _)| existing == key)
        .map(|(_, value)| value)
}

#[test]
fn removing_the_last_parameter_leaves_a_bare_path() {
    let navigator = navigator("http://localhost/members?search=ann");

    assert_eq!(navigator.build_url(&[("search", None)]), "/members");
    assert_eq!(
        navigator.without_param("/members?page=2", "page").unwrap_or_default(),
        "/members"
    );
    assert_eq!(navigator.fresh_url("view_id", "7"), "/members?view_id=7");
}

#[test]
fn build_url_deletes_on_none_and_keeps_empty_strings() {
    let navigator = navigator("http://localhost/members?search=ann&sort=name&page=2");

    let url = navigator.build_url(&[("search", Some("")), ("sort", None), ("direction", Some("asc"))]);

    assert!(url.starts_with("/members?"));
    assert_eq!(value_of(&url, "search").as_deref(), Some(""));
    assert_eq!(value_of(&url, "sort"), None);
    assert_eq!(value_of(&url, "direction").as_deref(), Some("asc"));
    assert_eq!(value_of(&url, "page").as_deref(), Some("2"));
}

#[test]
fn build_url_with_filters_rewrites_every_filter_parameter() {
    let navigator = navigator(
        "http://localhost/members?filter%5Bold%5D=1&start_on_start=2020-01-01&page=4&view_id=7",
    );
    let mut active = OrderedMap::new();
    active.insert(
        "status",
        ActiveFilterValue::Multiple(vec!["active".to_owned(), "pending".to_owned()]),
    );
    active.insert("branch", ActiveFilterValue::Single("3".to_owned()));
    active.insert("start_on_end", ActiveFilterValue::Single("2025-12-31".to_owned()));

    let url = navigator.build_url_with_filters(&active, None);
    let query = query_of(&url);

    assert!(query.iter().all(|(key, _)| key != "filter[old]" && key != "start_on_start"));
    assert!(query.iter().all(|(key, _)| key != "page"));
    assert_eq!(value_of(&url, "view_id").as_deref(), Some("7"));
    assert_eq!(value_of(&url, "filter[branch]").as_deref(), Some("3"));
    assert_eq!(value_of(&url, "start_on_end").as_deref(), Some("2025-12-31"));
    let statuses: Vec<_> = query
        .iter()
        .filter(|(key, _)| key == "filter[status][]")
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(statuses, vec!["active", "pending"]);
}

#[test]
fn view_search_is_kept_unless_marked_dirty() {
    let clean = navigator("http://localhost/members?view_id=7");
    let url = clean.build_url_with_filters(&OrderedMap::new(), Some("ann"));
    assert_eq!(value_of(&url, "search").as_deref(), Some("ann"));

    let dirty = navigator("http://localhost/members?view_id=7&dirty%5Bsearch%5D=1&search=");
    let url = dirty.build_url_with_filters(&OrderedMap::new(), Some("ann"));
    assert_eq!(value_of(&url, "search").as_deref(), Some(""));
}

#[test]
fn navigate_keeps_frame_path_and_context_params() {
    let mut navigator = navigator("http://localhost/members/view/12");
    let frame_src = "/members/roles-grid-data/12?member_id=12&branch_id=4&page=3";
    assert!(navigator.set_frame_src(frame_src).is_ok());

    let navigation = navigator
        .navigate("/members/view/12?filter%5Brole%5D=admin&branch_id=9")
        .unwrap_or_else(|_| unreachable!());

    let Navigation::Frame {
        frame_src,
        history_url,
    } = navigation
    else {
        unreachable!()
    };
    assert!(frame_src.starts_with("/members/roles-grid-data/12?"));
    assert_eq!(value_of(&frame_src, "filter[role]").as_deref(), Some("admin"));
    assert_eq!(value_of(&frame_src, "member_id").as_deref(), Some("12"));
    assert_eq!(value_of(&frame_src, "branch_id").as_deref(), Some("9"));
    assert_eq!(value_of(&frame_src, "page"), None);
    assert_eq!(history_url, "/members/view/12?filter%5Brole%5D=admin&branch_id=9");
    assert_eq!(navigator.param("filter[role]").as_deref(), Some("admin"));
}

#[test]
fn last_navigation_wins() {
    let mut navigator = navigator("http://localhost/members");
    assert!(navigator.set_frame_src("/members/grid-data").is_ok());

    assert!(navigator.navigate("/members?search=a").is_ok());
    assert!(navigator.navigate("/members?search=ab").is_ok());

    assert_eq!(navigator.history().len(), 2);
    assert_eq!(navigator.param("search").as_deref(), Some("ab"));
    let frame_src = navigator
        .frame_src()
        .map(|url| url.as_str().to_owned())
        .unwrap_or_default();
    assert!(frame_src.ends_with("/members/grid-data?search=ab"));
}

#[test]
fn navigate_without_frame_loads_the_page() {
    let mut navigator = navigator("http://localhost/members");
    let navigation = navigator
        .navigate("/members?ignore_default=1")
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(navigation, Navigation::FullPage("/members?ignore_default=1".to_owned()));
    assert!(navigator.history().is_empty());
}
