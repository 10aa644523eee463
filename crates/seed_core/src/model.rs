use std::fmt;

use serde::{Deserialize, Serialize};

use crate::allocator::DrawnKey;
use crate::time::Timestamp;
use crate::value::Patch;
use crate::{SeedError, SeedResult};

/// Entity families held by the store, listed owners before owned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityFamily {
    User,
    Video,
    VideoEngagement,
    Follow,
    Announcement,
    AnnouncementEngagement,
    Comment,
    Playlist,
    PlaylistVideo,
}

impl EntityFamily {
    /// Reconcile order: every family comes after the families it references.
    pub const RECONCILE_ORDER: [EntityFamily; 9] = [
        EntityFamily::User,
        EntityFamily::Video,
        EntityFamily::VideoEngagement,
        EntityFamily::Follow,
        EntityFamily::Announcement,
        EntityFamily::AnnouncementEngagement,
        EntityFamily::Comment,
        EntityFamily::Playlist,
        EntityFamily::PlaylistVideo,
    ];

    /// Members before owners.
    pub fn clear_order() -> impl Iterator<Item = EntityFamily> {
        Self::RECONCILE_ORDER.into_iter().rev()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityFamily::User => "user",
            EntityFamily::Video => "video",
            EntityFamily::VideoEngagement => "video_engagement",
            EntityFamily::Follow => "follow",
            EntityFamily::Announcement => "announcement",
            EntityFamily::AnnouncementEngagement => "announcement_engagement",
            EntityFamily::Comment => "comment",
            EntityFamily::Playlist => "playlist",
            EntityFamily::PlaylistVideo => "playlist_video",
        }
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying one record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApplyOutcome {
    Written,
    /// Composite key already present; nothing was written.
    Skipped,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoEngagementType {
    Like,
    Dislike,
    View,
    Save,
}

impl VideoEngagementType {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoEngagementType::Like => "LIKE",
            VideoEngagementType::Dislike => "DISLIKE",
            VideoEngagementType::View => "VIEW",
            VideoEngagementType::Save => "SAVE",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnnouncementEngagementType {
    Like,
    Dislike,
}

impl AnnouncementEngagementType {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnouncementEngagementType::Like => "LIKE",
            AnnouncementEngagementType::Dislike => "DISLIKE",
        }
    }

    pub fn parse(value: &str) -> SeedResult<Self> {
        match value {
            "LIKE" => Ok(AnnouncementEngagementType::Like),
            "DISLIKE" => Ok(AnnouncementEngagementType::Dislike),
            other => Err(SeedError::storage(format!(
                "unknown announcement engagement type: {other}"
            ))),
        }
    }
}

// Upsert rows. Patch fields that are `Missing` are written as NULL on insert and
// left alone on update.

#[derive(Clone, Debug, PartialEq)]
pub struct UserUpsert {
    pub id: String,
    pub name: Patch<String>,
    pub handle: Patch<String>,
    pub email: Patch<String>,
    pub email_verified: Patch<Timestamp>,
    pub image: Patch<String>,
    pub background_image: Patch<String>,
    pub description: Patch<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoUpsert {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Patch<String>,
    pub video_url: Patch<String>,
    pub thumbnail_url: Patch<String>,
    pub publish: Patch<bool>,
    pub created_at: Patch<Timestamp>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommentUpsert {
    pub id: String,
    pub user_id: DrawnKey,
    pub video_id: DrawnKey,
    pub message: String,
    pub created_at: Patch<Timestamp>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistUpsert {
    pub id: String,
    pub user_id: DrawnKey,
    pub title: String,
    pub description: Patch<String>,
    pub created_at: Patch<Timestamp>,
}

// Stored shapes, as read back.

#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<Timestamp>,
    pub image: Option<String>,
    pub background_image: Option<String>,
    pub description: Option<String>,
}

impl User {
    pub fn apply(&mut self, upsert: UserUpsert) {
        upsert.name.merge_into(&mut self.name);
        upsert.handle.merge_into(&mut self.handle);
        upsert.email.merge_into(&mut self.email);
        upsert.email_verified.merge_into(&mut self.email_verified);
        upsert.image.merge_into(&mut self.image);
        upsert.background_image.merge_into(&mut self.background_image);
        upsert.description.merge_into(&mut self.description);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Video {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub publish: Option<bool>,
    pub created_at: Option<Timestamp>,
}

impl Video {
    pub fn apply(&mut self, upsert: VideoUpsert) {
        self.user_id = upsert.user_id;
        self.title = upsert.title;
        upsert.description.merge_into(&mut self.description);
        upsert.video_url.merge_into(&mut self.video_url);
        upsert.thumbnail_url.merge_into(&mut self.thumbnail_url);
        upsert.publish.merge_into(&mut self.publish);
        upsert.created_at.merge_into(&mut self.created_at);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub message: String,
    pub created_at: Option<Timestamp>,
}

impl Comment {
    pub fn apply(&mut self, upsert: CommentUpsert) {
        self.user_id = upsert.user_id.on_update;
        self.video_id = upsert.video_id.on_update;
        self.message = upsert.message;
        upsert.created_at.merge_into(&mut self.created_at);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Option<Timestamp>,
}

impl Playlist {
    pub fn apply(&mut self, upsert: PlaylistUpsert) {
        self.user_id = upsert.user_id.on_update;
        self.title = upsert.title;
        upsert.description.merge_into(&mut self.description);
        upsert.created_at.merge_into(&mut self.created_at);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoEngagement {
    pub user_id: String,
    pub video_id: String,
    pub engagement_type: VideoEngagementType,
    pub created_at: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Follow {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Announcement {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub created_at: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnouncementEngagement {
    pub announcement_id: String,
    pub user_id: String,
    pub engagement_type: AnnouncementEngagementType,
    pub created_at: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistVideo {
    pub playlist_id: String,
    pub video_id: String,
}

impl From<UserUpsert> for User {
    fn from(upsert: UserUpsert) -> Self {
        let mut user = User {
            id: upsert.id.clone(),
            ..User::default()
        };
        user.apply(upsert);
        user
    }
}

impl From<VideoUpsert> for Video {
    fn from(upsert: VideoUpsert) -> Self {
        let mut video = Video {
            id: upsert.id.clone(),
            ..Video::default()
        };
        video.apply(upsert);
        video
    }
}

impl From<CommentUpsert> for Comment {
    fn from(upsert: CommentUpsert) -> Self {
        Comment {
            id: upsert.id,
            user_id: upsert.user_id.on_create,
            video_id: upsert.video_id.on_create,
            message: upsert.message,
            created_at: upsert.created_at.into_option(),
        }
    }
}

impl From<PlaylistUpsert> for Playlist {
    fn from(upsert: PlaylistUpsert) -> Self {
        Playlist {
            id: upsert.id,
            user_id: upsert.user_id.on_create,
            title: upsert.title,
            description: upsert.description.into_option(),
            created_at: upsert.created_at.into_option(),
        }
    }
}
