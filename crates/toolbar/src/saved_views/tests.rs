use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use gridview_core::{AppError, AppResult};
use gridview_domain::{GridViewConfig, StateSnapshot, ViewId};
use serde_json::json;
use tokio::sync::Mutex;

use super::{Confirm, Notifier, SavedViewActions, SavedViewApi, SavedViewOutcome};
use crate::controller::GridViewController;
use crate::navigator::GridNavigator;

#[derive(Default)]
struct FakeApi {
    fail: bool,
    calls: Mutex<Vec<String>>,
    saved_configs: Mutex<Vec<GridViewConfig>>,
}

impl FakeApi {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    async fn record(&self, call: String) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Conflict("view name already taken".to_owned()));
        }
        self.calls.lock().await.push(call);
        Ok(())
    }
}

#[async_trait]
impl SavedViewApi for FakeApi {
    async fn create_view(
        &self,
        grid_key: &str,
        name: &str,
        config: &GridViewConfig,
    ) -> AppResult<ViewId> {
        self.record(format!("create {grid_key} {name}")).await?;
        self.saved_configs.lock().await.push(config.clone());
        Ok(ViewId::Saved(42))
    }

    async fn update_view(&self, view_id: &ViewId, _config: &GridViewConfig) -> AppResult<()> {
        self.record(format!("update {view_id}")).await
    }

    async fn delete_view(&self, view_id: &ViewId) -> AppResult<()> {
        self.record(format!("delete {view_id}")).await
    }

    async fn set_default(&self, grid_key: &str, view_id: &ViewId) -> AppResult<()> {
        self.record(format!("default {grid_key} {view_id}")).await
    }

    async fn clear_default(&self, grid_key: &str) -> AppResult<()> {
        self.record(format!("clear {grid_key}")).await
    }
}

struct FixedConfirm(bool);

impl Confirm for FixedConfirm {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: StdMutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_owned());
        }
    }
}

fn controller(current_id: Option<i64>) -> GridViewController {
    let navigator = GridNavigator::new("http://localhost/members?view_id=7&search=ann")
        .unwrap_or_else(|_| unreachable!());
    let mut controller = GridViewController::new(navigator);
    let snapshot: StateSnapshot = serde_json::from_value(json!({
        "view": {"currentId": current_id},
        "search": "ann",
        "filters": {"active": {"status": "active"}},
        "columns": {"visible": ["name"]},
        "config": {"gridKey": "members", "pageSize": 50}
    }))
    .unwrap_or_else(|_| unreachable!());
    controller.load_snapshot(snapshot);
    controller
}

fn actions(
    api: Arc<FakeApi>,
    confirmed: bool,
) -> (SavedViewActions, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    (
        SavedViewActions::new(api, Arc::new(FixedConfirm(confirmed)), notifier.clone()),
        notifier,
    )
}

#[tokio::test]
async fn save_sends_current_config_and_opens_the_new_view() {
    let api = Arc::new(FakeApi::default());
    let (actions, notifier) = actions(api.clone(), true);

    let outcome = actions.save_view(&controller(None), "  Active members ").await;

    let SavedViewOutcome::Assign(url) = outcome else {
        unreachable!()
    };
    assert!(url.contains("view_id=42"));
    assert_eq!(*api.calls.lock().await, vec!["create members Active members".to_owned()]);
    let configs = api.saved_configs.lock().await;
    assert_eq!(configs[0].page_size, 50);
    assert_eq!(configs[0].search.as_deref(), Some("ann"));
    assert_eq!(notifier.messages(), vec!["View saved successfully".to_owned()]);
}

#[tokio::test]
async fn blank_names_are_ignored() {
    let api = Arc::new(FakeApi::default());
    let (actions, notifier) = actions(api.clone(), true);

    let outcome = actions.save_view(&controller(None), "   ").await;

    assert_eq!(outcome, SavedViewOutcome::Unchanged);
    assert!(api.calls.lock().await.is_empty());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn declined_confirmation_skips_update_and_delete() {
    let api = Arc::new(FakeApi::default());
    let (actions, _) = actions(api.clone(), false);
    let controller = controller(Some(7));

    assert_eq!(actions.update_view(&controller).await, SavedViewOutcome::Unchanged);
    assert_eq!(actions.delete_view(&controller).await, SavedViewOutcome::Unchanged);
    assert!(api.calls.lock().await.is_empty());
}

#[tokio::test]
async fn confirmed_delete_leaves_the_view() {
    let api = Arc::new(FakeApi::default());
    let (actions, _) = actions(api.clone(), true);

    let outcome = actions.delete_view(&controller(Some(7))).await;

    let SavedViewOutcome::Assign(url) = outcome else {
        unreachable!()
    };
    assert!(!url.contains("view_id"));
    assert!(url.contains("search=ann"));
    assert_eq!(*api.calls.lock().await, vec!["delete 7".to_owned()]);
}

#[tokio::test]
async fn actions_without_a_view_alert_instead_of_calling() {
    let api = Arc::new(FakeApi::default());
    let (actions, notifier) = actions(api.clone(), true);

    let outcome = actions.set_default(&controller(None)).await;

    assert_eq!(outcome, SavedViewOutcome::Unchanged);
    assert!(api.calls.lock().await.is_empty());
    assert_eq!(
        notifier.messages(),
        vec!["No view selected to set as default".to_owned()]
    );
}

#[tokio::test]
async fn failures_alert_and_leave_state_unchanged() {
    let api = Arc::new(FakeApi::failing());
    let (actions, notifier) = actions(api, true);
    let controller = controller(Some(7));

    let outcome = actions.update_view(&controller).await;

    assert_eq!(outcome, SavedViewOutcome::Unchanged);
    assert_eq!(
        notifier.messages(),
        vec!["Failed to update view: conflict: view name already taken".to_owned()]
    );
    assert_eq!(
        controller.state().and_then(|state| state.view.current_id.clone()),
        Some(ViewId::Saved(7))
    );
}

#[tokio::test]
async fn defaults_are_set_and_cleared_for_the_grid() {
    let api = Arc::new(FakeApi::default());
    let (actions, _) = actions(api.clone(), true);
    let controller = controller(Some(7));

    assert_eq!(actions.set_default(&controller).await, SavedViewOutcome::Reload);
    assert_eq!(actions.clear_default(&controller).await, SavedViewOutcome::Reload);
    assert_eq!(
        *api.calls.lock().await,
        vec!["default members 7".to_owned(), "clear members".to_owned()]
    );
}
