use std::fs;

use clipdeck_seed_core::{
    AssetResolver, EntityFamily, MaintenanceApi, SeedError, SeedResult, SnapshotReadApi,
};
use clipdeck_seed_pipeline::{Pipeline, PipelineOptions, Snapshot};
use clipdeck_seed_store::{SeedConfig, SeedStore};
use serde_json::json;
use tempfile::tempdir;

fn write_snapshot(dir: &std::path::Path) {
    let files = [
        (
            "user.json",
            json!([
                { "id": "164", "name": "Ada", "image": "/avatars/ada.png", "emailVerified": "2023-11-05T12:00:00Z" },
                { "id": "165", "name": "Grace", "image": null }
            ]),
        ),
        (
            "video.json",
            json!([
                { "id": "1", "userId": "164", "title": "Intro", "videoUrl": "/v/intro.mp4", "publish": true }
            ]),
        ),
        (
            "videoEngagement.json",
            json!([{ "userId": "165", "videoId": "1", "engagementType": "SAVE" }]),
        ),
        (
            "followEngagement.json",
            json!([
                { "followerId": "164", "followingId": "165" },
                { "followerId": "164", "followingId": "165" }
            ]),
        ),
        (
            "announcement.json",
            json!([{ "id": "n1", "userId": "164", "message": "welcome" }]),
        ),
        (
            "announcementEngagement.json",
            json!([{ "announcementId": "n1", "userId": "165", "engagementType": "DISLIKE" }]),
        ),
        (
            "comment.json",
            json!([{ "id": "c1", "userId": "1", "videoId": "1", "message": "nice" }]),
        ),
        (
            "playlist.json",
            json!([{ "id": "p1", "userId": "1", "title": "Mix" }]),
        ),
        (
            "playlistHasVideo.json",
            json!([{ "playlistId": "p1", "videoId": "1" }]),
        ),
    ];
    for (name, body) in files {
        fs::write(dir.join(name), body.to_string()).expect("write snapshot file");
    }
}

#[tokio::test]
async fn snapshot_directory_seeds_sqlite_store() -> SeedResult<()> {
    let data = tempdir().expect("data dir");
    write_snapshot(data.path());
    let base = tempdir().expect("store dir");
    let store = SeedStore::open(base.path()).await?;

    let pipeline = Pipeline::new(
        &store,
        PipelineOptions::new(AssetResolver::cloudinary("clipdeck")),
    )?;
    let report = pipeline.run(Snapshot::load_dir(data.path())?).await?;

    assert_eq!(store.count_family(EntityFamily::Follow).await?, 1);
    let follows = report.family(EntityFamily::Follow).expect("follow report");
    assert_eq!(follows.skipped, 1);

    let ada = store.get_user("164").await?.expect("ada");
    assert_eq!(
        ada.image.as_deref(),
        Some("https://res.cloudinary.com/clipdeck/avatars/ada.png")
    );
    assert!(ada.email_verified.is_some());
    let grace = store.get_user("165").await?.expect("grace");
    assert_eq!(grace.image, None);

    let comment = store.get_comment("c1").await?.expect("comment");
    assert_eq!((comment.user_id.as_str(), comment.video_id.as_str()), ("165", "2"));
    let playlist = store.get_playlist("p1").await?.expect("playlist");
    assert_eq!(playlist.user_id, "167");

    // A second run starts from a cleared store and converges to the same state.
    let again = pipeline.run(Snapshot::load_dir(data.path())?).await?;
    assert_eq!(again.families, report.families);
    for family in EntityFamily::RECONCILE_ORDER {
        let expected = match family {
            EntityFamily::User => 2,
            _ => 1,
        };
        assert_eq!(store.count_family(family).await?, expected, "{family}");
    }
    store.close().await
}

#[tokio::test]
async fn duplicate_announcement_id_aborts_the_run() -> SeedResult<()> {
    let data = tempdir().expect("data dir");
    fs::write(
        data.path().join("announcement.json"),
        json!([
            { "id": "n1", "userId": "164", "message": "first" },
            { "id": "n1", "userId": "164", "message": "again" }
        ])
        .to_string(),
    )
    .expect("write announcements");
    let base = tempdir().expect("store dir");
    let config = SeedConfig::default_sqlite(base.path().join("seed.sqlite").to_string_lossy());
    let store = SeedStore::connect(&config, base.path()).await?;
    let pipeline = Pipeline::new(
        &store,
        PipelineOptions::new(AssetResolver::new("https://cdn.example.com")),
    )?;
    let err = pipeline
        .run(Snapshot::load_dir(data.path())?)
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::Storage { .. }));
    assert_eq!(store.count_family(EntityFamily::Announcement).await?, 1);
    store.close().await
}

#[tokio::test]
async fn concurrent_duplicate_pairs_are_written_once() -> SeedResult<()> {
    let data = tempdir().expect("data dir");
    let pairs = [("164", "165"), ("165", "164"), ("164", "165"), ("164", "165")];
    let follows: Vec<_> = pairs
        .iter()
        .map(|(from, to)| json!({ "followerId": from, "followingId": to }))
        .collect();
    fs::write(data.path().join("followEngagement.json"), json!(follows).to_string())
        .expect("write follows");
    let engagements: Vec<_> = ["LIKE", "DISLIKE", "LIKE", "DISLIKE"]
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let user = if index == 1 { "164" } else { "165" };
            json!({ "announcementId": "n1", "userId": user, "engagementType": kind })
        })
        .collect();
    fs::write(
        data.path().join("announcementEngagement.json"),
        json!(engagements).to_string(),
    )
    .expect("write engagements");
    fs::write(
        data.path().join("announcement.json"),
        json!([{ "id": "n1", "userId": "164", "message": "welcome" }]).to_string(),
    )
    .expect("write announcements");

    let base = tempdir().expect("store dir");
    let store = SeedStore::open(base.path()).await?;
    // One chunk holds every pair, so the duplicates race each other.
    let pipeline = Pipeline::new(
        &store,
        PipelineOptions::new(AssetResolver::new("https://cdn.example.com")).with_chunk_size(4),
    )?;
    let report = pipeline.run(Snapshot::load_dir(data.path())?).await?;

    let follows = report.family(EntityFamily::Follow).expect("follow report");
    assert_eq!((follows.written, follows.skipped), (2, 2));
    assert_eq!(store.count_family(EntityFamily::Follow).await?, 2);
    assert_eq!(store.find_follows("164", "165").await?.len(), 1);

    let engagements = report
        .family(EntityFamily::AnnouncementEngagement)
        .expect("engagement report");
    assert_eq!((engagements.written, engagements.skipped), (2, 2));
    assert_eq!(
        store.count_family(EntityFamily::AnnouncementEngagement).await?,
        2
    );
    let kept = store.find_announcement_engagements("n1", "165").await?;
    assert_eq!(kept.len(), 1);
    store.close().await
}
