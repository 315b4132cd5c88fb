use gridview_core::{AppError, AppResult};
use gridview_domain::StateSnapshot;

const SCRIPT_OPEN: &str = "<script type=\"application/json\"";
const SCRIPT_CLOSE: &str = "</script>";
const TABLE_FRAME_SUFFIX: &str = "-table";

/// A content frame finished loading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameLoadEvent {
    /// Id of the frame element.
    pub frame_id: String,
    /// Source the frame was loaded from.
    pub frame_src: Option<String>,
    /// Ids of the elements enclosing the frame, innermost first.
    pub ancestor_ids: Vec<String>,
    /// Markup of the frame body.
    pub html: String,
}

impl FrameLoadEvent {
    /// Returns true for grid data frames (`<gridKey>-table`).
    #[must_use]
    pub fn is_table_frame(&self) -> bool {
        self.frame_id.ends_with(TABLE_FRAME_SUFFIX)
    }

    /// Returns true when the frame sits inside the element with `container_id`.
    #[must_use]
    pub fn is_inside(&self, container_id: &str) -> bool {
        self.ancestor_ids.iter().any(|id| id == container_id)
    }
}

/// Returns the id of the data frame for a grid.
#[must_use]
pub fn table_frame_id(grid_key: &str) -> String {
    format!("{grid_key}{TABLE_FRAME_SUFFIX}")
}

/// Extracts the body of the first `<script type="application/json">` tag.
#[must_use]
pub fn find_state_script(html: &str) -> Option<&str> {
    let open = html.find(SCRIPT_OPEN)?;
    let after_open = &html[open + SCRIPT_OPEN.len()..];
    let body_start = after_open.find('>')? + 1;
    let body = &after_open[body_start..];
    let body_end = body.find(SCRIPT_CLOSE)?;
    Some(body[..body_end].trim())
}

/// Reads the embedded snapshot of a data frame.
///
/// Returns `Ok(None)` when the frame carries no state script.
pub fn parse_snapshot(html: &str) -> AppResult<Option<StateSnapshot>> {
    let Some(script) = find_state_script(html) else {
        return Ok(None);
    };

    serde_json::from_str(script).map(Some).map_err(|error| {
        AppError::Validation(format!("failed to parse grid state snapshot: {error}"))
    })
}

/// Serializes a snapshot so it can sit inside a `<script>` element.
pub fn embed_snapshot(snapshot: &StateSnapshot) -> AppResult<String> {
    let json = serde_json::to_string(snapshot).map_err(|error| {
        AppError::Internal(format!("failed to serialize grid state snapshot: {error}"))
    })?;
    let escaped = json.replace("</", "<\\/");
    Ok(format!("{SCRIPT_OPEN}>{escaped}{SCRIPT_CLOSE}"))
}

#[cfg(test)]
mod tests {
    use gridview_domain::{StateSnapshot, ViewId};

    use super::{FrameLoadEvent, embed_snapshot, find_state_script, parse_snapshot};

    #[test]
    fn finds_script_body_between_tags() {
        let html = r#"<table></table><script type="application/json" data-grid-state>{"search":"x"}</script>"#;
        assert_eq!(find_state_script(html), Some(r#"{"search":"x"}"#));
        assert_eq!(find_state_script("<table></table>"), None);
    }

    #[test]
    fn embedded_snapshot_survives_closing_tags_in_values() {
        let mut snapshot = StateSnapshot::default();
        snapshot.search = Some("</script><b>".to_owned());
        snapshot.view.current_id = Some(ViewId::System("active".to_owned()));

        let script = embed_snapshot(&snapshot).unwrap_or_default();
        let html = format!("<tr><td>row</td></tr>{script}");
        let parsed = parse_snapshot(&html).unwrap_or_default();

        assert_eq!(parsed, Some(snapshot));
    }

    #[test]
    fn malformed_state_is_an_error() {
        let html = r#"<script type="application/json">{"search":</script>"#;
        assert!(parse_snapshot(html).is_err());
        assert!(matches!(parse_snapshot("<p>no state</p>"), Ok(None)));
    }

    #[test]
    fn table_frames_are_recognised_by_suffix() {
        let event = FrameLoadEvent {
            frame_id: "members-table".to_owned(),
            ancestor_ids: vec!["members-grid".to_owned()],
            ..FrameLoadEvent::default()
        };
        assert!(event.is_table_frame());
        assert!(event.is_inside("members-grid"));
        assert!(!event.is_inside("roles-grid"));
    }
}
