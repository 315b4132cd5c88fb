use std::sync::Arc;

use gridview_core::AppError;
use gridview_domain::{PreferenceTarget, SavedViewDraft, ViewId};
use serde_json::json;

use crate::test_support::{FakeViewStore, alice, bob, draft, view_service};

use super::{CreateSavedViewInput, UpdateSavedViewInput};

fn input(name: &str, config: serde_json::Value) -> CreateSavedViewInput {
    CreateSavedViewInput {
        grid_key: "members".to_owned(),
        name: name.to_owned(),
        description: None,
        config,
        is_default: false,
    }
}

#[tokio::test]
async fn create_view_normalizes_and_assigns_owner() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);

    let view = service
        .create_view(
            &alice(),
            input(
                "Active",
                json!({
                    "filters": [{"field": "status", "operator": "eq", "value": "active"}],
                    "pageSize": 500
                }),
            ),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(view.owner_subject(), Some("alice"));
    assert!(!view.is_system_default());
    assert_eq!(view.config().page_size, 100);
    assert_eq!(view.config().filters.len(), 1);
}

#[tokio::test]
async fn create_view_rejects_invalid_config() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);

    let result = service
        .create_view(
            &alice(),
            input(
                "Broken",
                json!({"filters": [{"field": "ghost", "operator": "eq", "value": 1}]}),
            ),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(message)) if message.contains("ghost")));
}

#[tokio::test]
async fn create_view_as_default_stores_preference() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);
    let mut request = input("Mine", json!({}));
    request.is_default = true;

    let view = service
        .create_view(&alice(), request)
        .await
        .unwrap_or_else(|_| unreachable!());

    let preference = service
        .get_user_preference(&alice(), "members")
        .await
        .unwrap_or_default();
    assert_eq!(preference, Some(PreferenceTarget::View(view.id())));
}

#[tokio::test]
async fn effective_view_prefers_explicit_then_preference_then_system_default() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);
    let shared = store.seed(draft("members", None, "Everyone")).await;
    let own = store.seed(draft("members", Some("alice"), "Mine")).await;
    let other = store.seed(draft("members", Some("bob"), "Bob's")).await;

    let resolved = service
        .get_effective_view(&alice(), "members", None)
        .await
        .unwrap_or_default();
    assert_eq!(resolved.map(|view| view.id()), Some(shared.id()));

    let _ = service
        .set_user_default(&alice(), "members", ViewId::Saved(own.id()))
        .await;
    let resolved = service
        .get_effective_view(&alice(), "members", None)
        .await
        .unwrap_or_default();
    assert_eq!(resolved.map(|view| view.id()), Some(own.id()));

    let resolved = service
        .get_effective_view(&alice(), "members", Some(other.id()))
        .await
        .unwrap_or_default();
    assert_eq!(resolved.map(|view| view.id()), Some(own.id()));
}

#[tokio::test]
async fn effective_view_falls_back_to_legacy_default_flag() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);
    let legacy = store
        .seed(SavedViewDraft {
            is_default: true,
            ..draft("members", Some("alice"), "Legacy")
        })
        .await;

    let resolved = service
        .get_effective_view(&alice(), "members", None)
        .await
        .unwrap_or_default();
    assert_eq!(resolved.map(|view| view.id()), Some(legacy.id()));
}

#[tokio::test]
async fn explicit_view_from_another_grid_is_ignored() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);
    let foreign = store.seed(draft("tasks", Some("alice"), "Tasks")).await;

    let resolved = service
        .get_effective_view(&alice(), "members", Some(foreign.id()))
        .await
        .unwrap_or_default();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn update_view_is_owner_only() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);
    let own = store.seed(draft("members", Some("alice"), "Mine")).await;

    let result = service
        .update_view(
            &bob(),
            own.id(),
            UpdateSavedViewInput {
                name: Some("Stolen".to_owned()),
                ..UpdateSavedViewInput::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let updated = service
        .update_view(
            &alice(),
            own.id(),
            UpdateSavedViewInput {
                name: Some("Renamed".to_owned()),
                config: Some(json!({"sort": [{"field": "email", "direction": "desc"}]})),
                ..UpdateSavedViewInput::default()
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(updated.name(), "Renamed");
    assert_eq!(updated.config().sort.len(), 1);
}

#[tokio::test]
async fn delete_view_clears_matching_preference() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);
    let own = store.seed(draft("members", Some("alice"), "Mine")).await;
    let _ = service
        .set_user_default(&alice(), "members", ViewId::Saved(own.id()))
        .await;

    let result = service.delete_view(&alice(), own.id()).await;

    assert!(result.is_ok());
    assert!(store.is_deleted(own.id()).await);
    let preference = service
        .get_user_preference(&alice(), "members")
        .await
        .unwrap_or_default();
    assert!(preference.is_none());
}

#[tokio::test]
async fn set_user_default_rejects_foreign_and_undeclared_targets() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);
    let other = store.seed(draft("members", Some("bob"), "Bob's")).await;

    let foreign = service
        .set_user_default(&alice(), "members", ViewId::Saved(other.id()))
        .await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    let undeclared = service
        .set_user_default(&alice(), "tasks", ViewId::System("ghost".to_owned()))
        .await;
    assert!(matches!(undeclared, Err(AppError::NotFound(_))));

    let declared = service
        .set_user_default(&alice(), "tasks", ViewId::System("mine".to_owned()))
        .await;
    assert_eq!(
        declared.ok(),
        Some(PreferenceTarget::SystemView("mine".to_owned()))
    );
}

#[tokio::test]
async fn clear_user_default_resets_preference_and_legacy_flags() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);
    let legacy = store
        .seed(SavedViewDraft {
            is_default: true,
            ..draft("members", Some("alice"), "Legacy")
        })
        .await;
    let _ = service
        .set_user_default(&alice(), "members", ViewId::Saved(legacy.id()))
        .await;

    let result = service.clear_user_default(&alice(), "members").await;

    assert!(result.is_ok());
    let resolved = service
        .get_effective_view(&alice(), "members", None)
        .await
        .unwrap_or_default();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn validate_config_reports_unknown_grid() {
    let store = Arc::new(FakeViewStore::default());
    let service = view_service(&store);

    assert!(matches!(
        service.validate_config("ghost", &json!({})),
        Err(AppError::NotFound(_))
    ));
    assert_eq!(
        service
            .validate_config("members", &json!({"pageSize": "lots"}))
            .unwrap_or_default()
            .len(),
        1
    );
}
