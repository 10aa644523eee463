//! Mutex-guarded in-memory store, used for dry runs and tests.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::api::{
    AppendWriteApi, MaintenanceApi, PrimaryWriteApi, RelationWriteApi, SnapshotReadApi,
};
use crate::model::{
    Announcement, AnnouncementEngagement, ApplyOutcome, Comment, CommentUpsert, EntityFamily,
    Follow, Playlist, PlaylistUpsert, PlaylistVideo, User, UserUpsert, Video, VideoEngagement,
    VideoUpsert,
};
use crate::{SeedError, SeedResult};

#[derive(Default)]
struct Tables {
    users: BTreeMap<String, User>,
    videos: BTreeMap<String, Video>,
    video_engagements: Vec<VideoEngagement>,
    follows: Vec<Follow>,
    announcements: BTreeMap<String, Announcement>,
    announcement_engagements: Vec<AnnouncementEngagement>,
    comments: BTreeMap<String, Comment>,
    playlists: BTreeMap<String, Playlist>,
    playlist_videos: Vec<PlaylistVideo>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> SeedResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| SeedError::storage("memory store poisoned"))
    }
}

fn drain_len<T>(items: &mut Vec<T>) -> u64 {
    let removed = items.len() as u64;
    items.clear();
    removed
}

fn drain_map<T>(items: &mut BTreeMap<String, T>) -> u64 {
    let removed = items.len() as u64;
    items.clear();
    removed
}

#[async_trait]
impl MaintenanceApi for MemoryStore {
    async fn clear_family(&self, family: EntityFamily) -> SeedResult<u64> {
        let mut tables = self.lock()?;
        let removed = match family {
            EntityFamily::User => drain_map(&mut tables.users),
            EntityFamily::Video => drain_map(&mut tables.videos),
            EntityFamily::VideoEngagement => drain_len(&mut tables.video_engagements),
            EntityFamily::Follow => drain_len(&mut tables.follows),
            EntityFamily::Announcement => drain_map(&mut tables.announcements),
            EntityFamily::AnnouncementEngagement => {
                drain_len(&mut tables.announcement_engagements)
            }
            EntityFamily::Comment => drain_map(&mut tables.comments),
            EntityFamily::Playlist => drain_map(&mut tables.playlists),
            EntityFamily::PlaylistVideo => drain_len(&mut tables.playlist_videos),
        };
        Ok(removed)
    }

    async fn count_family(&self, family: EntityFamily) -> SeedResult<u64> {
        let tables = self.lock()?;
        let count = match family {
            EntityFamily::User => tables.users.len(),
            EntityFamily::Video => tables.videos.len(),
            EntityFamily::VideoEngagement => tables.video_engagements.len(),
            EntityFamily::Follow => tables.follows.len(),
            EntityFamily::Announcement => tables.announcements.len(),
            EntityFamily::AnnouncementEngagement => tables.announcement_engagements.len(),
            EntityFamily::Comment => tables.comments.len(),
            EntityFamily::Playlist => tables.playlists.len(),
            EntityFamily::PlaylistVideo => tables.playlist_videos.len(),
        };
        Ok(count as u64)
    }
}

#[async_trait]
impl PrimaryWriteApi for MemoryStore {
    async fn upsert_user(&self, row: UserUpsert) -> SeedResult<()> {
        let mut tables = self.lock()?;
        match tables.users.entry(row.id.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().apply(row),
            Entry::Vacant(entry) => {
                entry.insert(User::from(row));
            }
        }
        Ok(())
    }

    async fn upsert_video(&self, row: VideoUpsert) -> SeedResult<()> {
        let mut tables = self.lock()?;
        match tables.videos.entry(row.id.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().apply(row),
            Entry::Vacant(entry) => {
                entry.insert(Video::from(row));
            }
        }
        Ok(())
    }

    async fn upsert_comment(&self, row: CommentUpsert) -> SeedResult<()> {
        let mut tables = self.lock()?;
        match tables.comments.entry(row.id.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().apply(row),
            Entry::Vacant(entry) => {
                entry.insert(Comment::from(row));
            }
        }
        Ok(())
    }

    async fn upsert_playlist(&self, row: PlaylistUpsert) -> SeedResult<()> {
        let mut tables = self.lock()?;
        match tables.playlists.entry(row.id.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().apply(row),
            Entry::Vacant(entry) => {
                entry.insert(Playlist::from(row));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AppendWriteApi for MemoryStore {
    async fn insert_video_engagement(&self, row: VideoEngagement) -> SeedResult<()> {
        self.lock()?.video_engagements.push(row);
        Ok(())
    }

    async fn insert_announcement(&self, row: Announcement) -> SeedResult<()> {
        let mut tables = self.lock()?;
        if tables.announcements.contains_key(&row.id) {
            return Err(SeedError::storage(format!(
                "announcement primary key already exists: {}",
                row.id
            )));
        }
        tables.announcements.insert(row.id.clone(), row);
        Ok(())
    }

    async fn insert_playlist_video(&self, row: PlaylistVideo) -> SeedResult<()> {
        self.lock()?.playlist_videos.push(row);
        Ok(())
    }
}

#[async_trait]
impl RelationWriteApi for MemoryStore {
    async fn insert_follow_if_absent(&self, row: Follow) -> SeedResult<ApplyOutcome> {
        let mut tables = self.lock()?;
        let exists = tables.follows.iter().any(|follow| {
            follow.follower_id == row.follower_id && follow.following_id == row.following_id
        });
        if exists {
            return Ok(ApplyOutcome::Skipped);
        }
        tables.follows.push(row);
        Ok(ApplyOutcome::Written)
    }

    async fn insert_announcement_engagement_if_absent(
        &self,
        row: AnnouncementEngagement,
    ) -> SeedResult<ApplyOutcome> {
        let mut tables = self.lock()?;
        let exists = tables.announcement_engagements.iter().any(|engagement| {
            engagement.announcement_id == row.announcement_id && engagement.user_id == row.user_id
        });
        if exists {
            return Ok(ApplyOutcome::Skipped);
        }
        tables.announcement_engagements.push(row);
        Ok(ApplyOutcome::Written)
    }
}

#[async_trait]
impl SnapshotReadApi for MemoryStore {
    async fn get_user(&self, id: &str) -> SeedResult<Option<User>> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    async fn get_video(&self, id: &str) -> SeedResult<Option<Video>> {
        Ok(self.lock()?.videos.get(id).cloned())
    }

    async fn get_comment(&self, id: &str) -> SeedResult<Option<Comment>> {
        Ok(self.lock()?.comments.get(id).cloned())
    }

    async fn get_playlist(&self, id: &str) -> SeedResult<Option<Playlist>> {
        Ok(self.lock()?.playlists.get(id).cloned())
    }

    async fn find_follows(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> SeedResult<Vec<Follow>> {
        Ok(self
            .lock()?
            .follows
            .iter()
            .filter(|follow| follow.follower_id == follower_id && follow.following_id == following_id)
            .cloned()
            .collect())
    }

    async fn find_announcement_engagements(
        &self,
        announcement_id: &str,
        user_id: &str,
    ) -> SeedResult<Vec<AnnouncementEngagement>> {
        Ok(self
            .lock()?
            .announcement_engagements
            .iter()
            .filter(|engagement| {
                engagement.announcement_id == announcement_id && engagement.user_id == user_id
            })
            .cloned()
            .collect())
    }
}
