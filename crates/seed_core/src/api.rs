use async_trait::async_trait;

use crate::model::{
    Announcement, AnnouncementEngagement, ApplyOutcome, Comment, CommentUpsert, EntityFamily,
    Follow, Playlist, PlaylistUpsert, PlaylistVideo, User, UserUpsert, Video, VideoEngagement,
    VideoUpsert,
};
use crate::SeedResult;

#[async_trait]
pub trait MaintenanceApi {
    /// Deletes every record of `family`, returning how many were removed.
    async fn clear_family(&self, family: EntityFamily) -> SeedResult<u64>;
    async fn count_family(&self, family: EntityFamily) -> SeedResult<u64>;
}

/// Insert-or-overwrite by primary key.
#[async_trait]
pub trait PrimaryWriteApi {
    async fn upsert_user(&self, row: UserUpsert) -> SeedResult<()>;
    async fn upsert_video(&self, row: VideoUpsert) -> SeedResult<()>;
    async fn upsert_comment(&self, row: CommentUpsert) -> SeedResult<()>;
    async fn upsert_playlist(&self, row: PlaylistUpsert) -> SeedResult<()>;
}

/// Plain inserts with no existence check.
#[async_trait]
pub trait AppendWriteApi {
    async fn insert_video_engagement(&self, row: VideoEngagement) -> SeedResult<()>;
    async fn insert_announcement(&self, row: Announcement) -> SeedResult<()>;
    async fn insert_playlist_video(&self, row: PlaylistVideo) -> SeedResult<()>;
}

/// Inserts guarded by a composite key. Implementations must perform the check and
/// the write as one atomic step; a present key yields [`ApplyOutcome::Skipped`].
#[async_trait]
pub trait RelationWriteApi {
    async fn insert_follow_if_absent(&self, row: Follow) -> SeedResult<ApplyOutcome>;
    async fn insert_announcement_engagement_if_absent(
        &self,
        row: AnnouncementEngagement,
    ) -> SeedResult<ApplyOutcome>;
}

#[async_trait]
pub trait SnapshotReadApi {
    async fn get_user(&self, id: &str) -> SeedResult<Option<User>>;
    async fn get_video(&self, id: &str) -> SeedResult<Option<Video>>;
    async fn get_comment(&self, id: &str) -> SeedResult<Option<Comment>>;
    async fn get_playlist(&self, id: &str) -> SeedResult<Option<Playlist>>;
    async fn find_follows(&self, follower_id: &str, following_id: &str)
    -> SeedResult<Vec<Follow>>;
    async fn find_announcement_engagements(
        &self,
        announcement_id: &str,
        user_id: &str,
    ) -> SeedResult<Vec<AnnouncementEngagement>>;
}

/// Everything the reconciliation pipeline needs from a store.
pub trait SeedBackend:
    MaintenanceApi + PrimaryWriteApi + AppendWriteApi + RelationWriteApi + SnapshotReadApi + Send + Sync
{
}

impl<T> SeedBackend for T where
    T: MaintenanceApi
        + PrimaryWriteApi
        + AppendWriteApi
        + RelationWriteApi
        + SnapshotReadApi
        + Send
        + Sync
{
}
