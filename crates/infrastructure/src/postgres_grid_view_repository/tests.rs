use gridview_application::{GridViewPreferenceRepository, SavedViewRepository};
use gridview_domain::{GridViewConfig, PreferenceTarget, SavedViewDraft, SavedViewPatch};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresGridViewRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres grid view repository tests: {error}");
    }

    Some(pool)
}

fn unique_grid_key(prefix: &str) -> String {
    format!(
        "{prefix}-{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn draft(grid_key: &str, owner: Option<&str>, name: &str) -> SavedViewDraft {
    SavedViewDraft {
        grid_key: grid_key.to_owned(),
        owner_subject: owner.map(ToOwned::to_owned),
        name: name.to_owned(),
        description: None,
        is_default: false,
        is_system_default: owner.is_none(),
        config: GridViewConfig::default(),
    }
}

#[tokio::test]
async fn create_update_and_soft_delete_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGridViewRepository::new(pool);
    let grid_key = unique_grid_key("views");

    let created = repository
        .create_view(draft(&grid_key, Some("alice"), "Mine"))
        .await;
    assert!(created.is_ok());
    let mut view = created.unwrap_or_else(|_| unreachable!());

    let patched = view.apply(
        SavedViewPatch {
            name: Some("Renamed".to_owned()),
            ..SavedViewPatch::default()
        },
        chrono::Utc::now(),
    );
    assert!(patched.is_ok());
    assert!(repository.update_view(view.clone()).await.is_ok());

    let found = repository.find_view(view.id()).await.unwrap_or_default();
    assert_eq!(found.map(|view| view.name().to_owned()), Some("Renamed".to_owned()));

    assert!(repository.delete_view(view.id()).await.is_ok());
    assert!(repository.find_view(view.id()).await.unwrap_or_default().is_none());
    assert!(
        repository
            .list_views_for_grid(&grid_key, "alice")
            .await
            .unwrap_or_default()
            .is_empty()
    );
}

#[tokio::test]
async fn replace_preference_keeps_one_row_per_user() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGridViewRepository::new(pool);
    let grid_key = unique_grid_key("preferences");
    let view = repository
        .create_view(draft(&grid_key, Some("alice"), "Mine"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let first = repository
        .replace_preference(&grid_key, "alice", PreferenceTarget::View(view.id()))
        .await;
    let second = repository
        .replace_preference(
            &grid_key,
            "alice",
            PreferenceTarget::SystemView("open".to_owned()),
        )
        .await;
    assert!(first.is_ok());
    assert!(second.is_ok());

    assert_eq!(
        repository
            .find_preference(&grid_key, "alice")
            .await
            .unwrap_or_default(),
        Some(PreferenceTarget::SystemView("open".to_owned()))
    );
}
