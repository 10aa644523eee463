//! Per-family record reconcilers.
//!
//! Reconciliation is split in two. [`EntityReconciler::prepare`] turns a snapshot
//! record into a store row synchronously; it parses dates, resolves asset paths and
//! draws replacement owner keys. [`ApplyRow::apply`] then performs the store write.

use async_trait::async_trait;

use clipdeck_seed_core::{
    Announcement, AnnouncementEngagement, AnnouncementEngagementRecord, AnnouncementRecord,
    ApplyOutcome, AssetResolver, CommentRecord, CommentUpsert, CyclicAllocator, EntityFamily,
    Follow, FollowRecord, Patch, PlaylistRecord, PlaylistUpsert, PlaylistVideo,
    PlaylistVideoRecord, SeedBackend, SeedResult, Timestamp, UserRecord, UserUpsert,
    VideoEngagement, VideoEngagementRecord, VideoRecord, VideoUpsert,
};

pub trait EntityReconciler {
    const FAMILY: EntityFamily;
    type Record;
    type Row: ApplyRow;

    fn prepare(&mut self, record: Self::Record) -> SeedResult<Self::Row>;
}

/// A prepared row that knows which store capability writes it.
#[async_trait]
pub trait ApplyRow: Send {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome>;
}

/// Replacement owner keys for comments and playlists.
#[derive(Clone, Debug)]
pub struct OwnerAllocators {
    pub users: CyclicAllocator,
    pub videos: CyclicAllocator,
}

pub struct UserReconciler<'a> {
    assets: &'a AssetResolver,
}

impl<'a> UserReconciler<'a> {
    pub fn new(assets: &'a AssetResolver) -> Self {
        Self { assets }
    }
}

impl EntityReconciler for UserReconciler<'_> {
    const FAMILY: EntityFamily = EntityFamily::User;
    type Record = UserRecord;
    type Row = UserUpsert;

    fn prepare(&mut self, record: UserRecord) -> SeedResult<UserUpsert> {
        Ok(UserUpsert {
            email_verified: parse_patch(record.email_verified)?,
            image: resolve_patch(self.assets, &record.image),
            background_image: resolve_patch(self.assets, &record.background_image),
            id: record.id,
            name: record.name,
            handle: record.handle,
            email: record.email,
            description: record.description,
        })
    }
}

pub struct VideoReconciler<'a> {
    assets: &'a AssetResolver,
}

impl<'a> VideoReconciler<'a> {
    pub fn new(assets: &'a AssetResolver) -> Self {
        Self { assets }
    }
}

impl EntityReconciler for VideoReconciler<'_> {
    const FAMILY: EntityFamily = EntityFamily::Video;
    type Record = VideoRecord;
    type Row = VideoUpsert;

    fn prepare(&mut self, record: VideoRecord) -> SeedResult<VideoUpsert> {
        let video_url = resolve_patch(self.assets, &record.video_url);
        Ok(VideoUpsert {
            created_at: parse_patch(record.created_at)?,
            thumbnail_url: video_url.clone(),
            video_url,
            id: record.id,
            user_id: record.user_id,
            title: record.title,
            description: record.description,
            publish: record.publish,
        })
    }
}

pub struct VideoEngagementReconciler;

impl EntityReconciler for VideoEngagementReconciler {
    const FAMILY: EntityFamily = EntityFamily::VideoEngagement;
    type Record = VideoEngagementRecord;
    type Row = VideoEngagement;

    fn prepare(&mut self, record: VideoEngagementRecord) -> SeedResult<VideoEngagement> {
        Ok(VideoEngagement {
            created_at: parse_optional(record.created_at.as_deref())?,
            user_id: record.user_id,
            video_id: record.video_id,
            engagement_type: record.engagement_type,
        })
    }
}

pub struct FollowReconciler;

impl EntityReconciler for FollowReconciler {
    const FAMILY: EntityFamily = EntityFamily::Follow;
    type Record = FollowRecord;
    type Row = Follow;

    fn prepare(&mut self, record: FollowRecord) -> SeedResult<Follow> {
        Ok(Follow {
            created_at: parse_optional(record.created_at.as_deref())?,
            follower_id: record.follower_id,
            following_id: record.following_id,
        })
    }
}

pub struct AnnouncementReconciler;

impl EntityReconciler for AnnouncementReconciler {
    const FAMILY: EntityFamily = EntityFamily::Announcement;
    type Record = AnnouncementRecord;
    type Row = Announcement;

    fn prepare(&mut self, record: AnnouncementRecord) -> SeedResult<Announcement> {
        Ok(Announcement {
            created_at: parse_optional(record.created_at.as_deref())?,
            id: record.id,
            user_id: record.user_id,
            message: record.message,
        })
    }
}

pub struct AnnouncementEngagementReconciler;

impl EntityReconciler for AnnouncementEngagementReconciler {
    const FAMILY: EntityFamily = EntityFamily::AnnouncementEngagement;
    type Record = AnnouncementEngagementRecord;
    type Row = AnnouncementEngagement;

    fn prepare(
        &mut self,
        record: AnnouncementEngagementRecord,
    ) -> SeedResult<AnnouncementEngagement> {
        Ok(AnnouncementEngagement {
            created_at: parse_optional(record.created_at.as_deref())?,
            announcement_id: record.announcement_id,
            user_id: record.user_id,
            engagement_type: record.engagement_type,
        })
    }
}

/// Ignores the record's `userId`/`videoId` and draws both from the allocators,
/// two keys per record.
pub struct CommentReconciler<'a> {
    owners: &'a mut OwnerAllocators,
}

impl<'a> CommentReconciler<'a> {
    pub fn new(owners: &'a mut OwnerAllocators) -> Self {
        Self { owners }
    }
}

impl EntityReconciler for CommentReconciler<'_> {
    const FAMILY: EntityFamily = EntityFamily::Comment;
    type Record = CommentRecord;
    type Row = CommentUpsert;

    fn prepare(&mut self, record: CommentRecord) -> SeedResult<CommentUpsert> {
        let created_at = parse_patch(record.created_at)?;
        Ok(CommentUpsert {
            id: record.id,
            user_id: self.owners.users.next_drawn_key(),
            video_id: self.owners.videos.next_drawn_key(),
            message: record.message,
            created_at,
        })
    }
}

/// Ignores the record's `userId` and draws it from the user allocator.
pub struct PlaylistReconciler<'a> {
    owners: &'a mut OwnerAllocators,
}

impl<'a> PlaylistReconciler<'a> {
    pub fn new(owners: &'a mut OwnerAllocators) -> Self {
        Self { owners }
    }
}

impl EntityReconciler for PlaylistReconciler<'_> {
    const FAMILY: EntityFamily = EntityFamily::Playlist;
    type Record = PlaylistRecord;
    type Row = PlaylistUpsert;

    fn prepare(&mut self, record: PlaylistRecord) -> SeedResult<PlaylistUpsert> {
        let created_at = parse_patch(record.created_at)?;
        Ok(PlaylistUpsert {
            id: record.id,
            user_id: self.owners.users.next_drawn_key(),
            title: record.title,
            description: record.description,
            created_at,
        })
    }
}

pub struct PlaylistVideoReconciler;

impl EntityReconciler for PlaylistVideoReconciler {
    const FAMILY: EntityFamily = EntityFamily::PlaylistVideo;
    type Record = PlaylistVideoRecord;
    type Row = PlaylistVideo;

    fn prepare(&mut self, record: PlaylistVideoRecord) -> SeedResult<PlaylistVideo> {
        Ok(PlaylistVideo {
            playlist_id: record.playlist_id,
            video_id: record.video_id,
        })
    }
}

#[async_trait]
impl ApplyRow for UserUpsert {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        store.upsert_user(self).await?;
        Ok(ApplyOutcome::Written)
    }
}

#[async_trait]
impl ApplyRow for VideoUpsert {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        store.upsert_video(self).await?;
        Ok(ApplyOutcome::Written)
    }
}

#[async_trait]
impl ApplyRow for CommentUpsert {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        store.upsert_comment(self).await?;
        Ok(ApplyOutcome::Written)
    }
}

#[async_trait]
impl ApplyRow for PlaylistUpsert {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        store.upsert_playlist(self).await?;
        Ok(ApplyOutcome::Written)
    }
}

#[async_trait]
impl ApplyRow for VideoEngagement {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        store.insert_video_engagement(self).await?;
        Ok(ApplyOutcome::Written)
    }
}

#[async_trait]
impl ApplyRow for Announcement {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        store.insert_announcement(self).await?;
        Ok(ApplyOutcome::Written)
    }
}

#[async_trait]
impl ApplyRow for PlaylistVideo {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        store.insert_playlist_video(self).await?;
        Ok(ApplyOutcome::Written)
    }
}

#[async_trait]
impl ApplyRow for Follow {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        let key = format!("{} -> {}", self.follower_id, self.following_id);
        let outcome = store.insert_follow_if_absent(self).await?;
        if outcome == ApplyOutcome::Skipped {
            log::warn!("follow {key} already present; skipped");
        }
        Ok(outcome)
    }
}

#[async_trait]
impl ApplyRow for AnnouncementEngagement {
    async fn apply(self, store: &dyn SeedBackend) -> SeedResult<ApplyOutcome> {
        let key = format!("{}/{}", self.announcement_id, self.user_id);
        let outcome = store.insert_announcement_engagement_if_absent(self).await?;
        if outcome == ApplyOutcome::Skipped {
            log::warn!("announcement engagement {key} already present; skipped");
        }
        Ok(outcome)
    }
}

// Absent and null both leave the column unset on update.
fn parse_patch(value: Patch<String>) -> SeedResult<Patch<Timestamp>> {
    value
        .unless_null()
        .try_map(|raw| Timestamp::parse_rfc3339(&raw))
}

fn parse_optional(value: Option<&str>) -> SeedResult<Option<Timestamp>> {
    value.map(Timestamp::parse_rfc3339).transpose()
}

// No asset, whether absent, null or empty, is written as NULL.
fn resolve_patch(assets: &AssetResolver, path: &Patch<String>) -> Patch<String> {
    Patch::from(assets.resolve(path.value().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipdeck_seed_core::{DrawnKey, SeedError, VideoEngagementType};

    fn assets() -> AssetResolver {
        AssetResolver::new("https://cdn.example.com")
    }

    fn owners() -> OwnerAllocators {
        OwnerAllocators {
            users: CyclicAllocator::new(164..179).expect("users"),
            videos: CyclicAllocator::new(1..32).expect("videos"),
        }
    }

    fn drawn(on_update: &str, on_create: &str) -> DrawnKey {
        DrawnKey {
            on_update: on_update.into(),
            on_create: on_create.into(),
        }
    }

    #[test]
    fn user_assets_resolve_and_missing_image_clears() {
        let assets = assets();
        let mut reconciler = UserReconciler::new(&assets);
        let row = reconciler
            .prepare(UserRecord {
                id: "164".into(),
                name: Patch::Value("Ada".into()),
                handle: Patch::Missing,
                email: Patch::Missing,
                email_verified: Patch::Null,
                image: Patch::Value("/avatars/ada.png".into()),
                background_image: Patch::Missing,
                description: Patch::Missing,
            })
            .expect("prepare");
        assert_eq!(
            row.image,
            Patch::Value("https://cdn.example.com/avatars/ada.png".into())
        );
        assert_eq!(row.background_image, Patch::Null);
        assert_eq!(row.email_verified, Patch::Missing);
    }

    #[test]
    fn video_url_feeds_both_url_columns() {
        let assets = assets();
        let mut reconciler = VideoReconciler::new(&assets);
        let row = reconciler
            .prepare(VideoRecord {
                id: "1".into(),
                user_id: "164".into(),
                title: "Intro".into(),
                description: Patch::Missing,
                video_url: Patch::Value("/v/intro.mp4".into()),
                publish: Patch::Value(true),
                created_at: Patch::Value("2023-11-05T12:00:00Z".into()),
            })
            .expect("prepare");
        assert_eq!(row.video_url, row.thumbnail_url);
        assert_eq!(
            row.video_url,
            Patch::Value("https://cdn.example.com/v/intro.mp4".into())
        );
        assert_eq!(
            row.created_at,
            Patch::Value(Timestamp::from_micros(1_699_185_600_000_000))
        );
    }

    #[test]
    fn comments_and_playlists_share_the_user_cursor() {
        let mut owners = owners();
        let comment = |id: &str| CommentRecord {
            id: id.into(),
            user_id: "999".into(),
            video_id: "999".into(),
            message: "hi".into(),
            created_at: Patch::Missing,
        };
        let (first, second) = {
            let mut reconciler = CommentReconciler::new(&mut owners);
            (
                reconciler.prepare(comment("c1")).expect("c1"),
                reconciler.prepare(comment("c2")).expect("c2"),
            )
        };
        // Each record draws its update key, then its insert key.
        assert_eq!(first.user_id, drawn("164", "165"));
        assert_eq!(first.video_id, drawn("1", "2"));
        assert_eq!(second.user_id, drawn("166", "167"));
        assert_eq!(second.video_id, drawn("3", "4"));

        let mut reconciler = PlaylistReconciler::new(&mut owners);
        let playlist = reconciler
            .prepare(PlaylistRecord {
                id: "p1".into(),
                user_id: "999".into(),
                title: "Mix".into(),
                description: Patch::Missing,
                created_at: Patch::Missing,
            })
            .expect("playlist");
        assert_eq!(playlist.user_id, drawn("168", "169"));
    }

    #[test]
    fn unparsable_date_is_a_transform_error() {
        let err = VideoEngagementReconciler
            .prepare(VideoEngagementRecord {
                user_id: "164".into(),
                video_id: "1".into(),
                engagement_type: VideoEngagementType::View,
                created_at: Some("yesterday".into()),
            })
            .unwrap_err();
        assert!(matches!(err, SeedError::Transform { .. }));
    }
}
