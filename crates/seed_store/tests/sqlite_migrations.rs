use std::collections::HashSet;

use clipdeck_seed_core::{SeedError, SeedResult};
use clipdeck_seed_store::{CONFIG_FILE, SQLITE_FILE, SeedConfig, SeedStore};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use tempfile::tempdir;

async fn list_tables(store: &SeedStore) -> SeedResult<HashSet<String>> {
    let rows = store
        .connection()
        .query_all_raw(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'table'",
        ))
        .await
        .map_err(SeedError::from)?;
    let mut tables = HashSet::new();
    for row in rows {
        let name: String = row.try_get("", "name").map_err(SeedError::from)?;
        tables.insert(name);
    }
    Ok(tables)
}

#[tokio::test]
async fn sqlite_migrations_create_snapshot_tables() -> SeedResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let config = SeedConfig::default_sqlite(base.join("seed.sqlite").to_string_lossy());
    let store = SeedStore::connect(&config, base).await?;
    let tables = list_tables(&store).await?;
    for table in [
        "users",
        "videos",
        "video_engagements",
        "follow_engagements",
        "announcements",
        "announcement_engagements",
        "comments",
        "playlists",
        "playlist_videos",
    ] {
        assert!(tables.contains(table), "expected table '{table}' to exist");
    }
    store.close().await?;
    // Idempotency check.
    let again = SeedStore::connect(&config, base).await?;
    again.close().await
}

#[tokio::test]
async fn open_initializes_config_and_database_together() -> SeedResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = SeedStore::open(dir.path()).await?;
    assert!(dir.path().join(CONFIG_FILE).exists());
    assert!(dir.path().join(SQLITE_FILE).exists());
    assert!(list_tables(&store).await?.contains("comments"));
    store.close().await?;
    // Reopening reads the written config instead of replacing it.
    let written = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).expect("config");
    let again = SeedStore::open(dir.path()).await?;
    assert_eq!(
        std::fs::read_to_string(dir.path().join(CONFIG_FILE)).expect("config"),
        written
    );
    again.close().await
}
