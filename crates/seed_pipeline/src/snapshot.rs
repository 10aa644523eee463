use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use clipdeck_seed_core::{
    AnnouncementEngagementRecord, AnnouncementRecord, CommentRecord, EntityFamily, FollowRecord,
    PlaylistRecord, PlaylistVideoRecord, SeedError, SeedResult, UserRecord,
    VideoEngagementRecord, VideoRecord,
};

/// Every family's records, fully materialized and in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub users: Vec<UserRecord>,
    pub videos: Vec<VideoRecord>,
    pub video_engagements: Vec<VideoEngagementRecord>,
    pub follows: Vec<FollowRecord>,
    pub announcements: Vec<AnnouncementRecord>,
    pub announcement_engagements: Vec<AnnouncementEngagementRecord>,
    pub comments: Vec<CommentRecord>,
    pub playlists: Vec<PlaylistRecord>,
    pub playlist_videos: Vec<PlaylistVideoRecord>,
}

impl Snapshot {
    /// Reads the export files from `dir`. A missing file is an empty family.
    pub fn load_dir(dir: &Path) -> SeedResult<Self> {
        if !dir.is_dir() {
            return Err(SeedError::snapshot(format!(
                "snapshot directory not found: {}",
                dir.display()
            )));
        }
        let snapshot = Self {
            users: read_family(dir, EntityFamily::User)?,
            videos: read_family(dir, EntityFamily::Video)?,
            video_engagements: read_family(dir, EntityFamily::VideoEngagement)?,
            follows: read_family(dir, EntityFamily::Follow)?,
            announcements: read_family(dir, EntityFamily::Announcement)?,
            announcement_engagements: read_family(dir, EntityFamily::AnnouncementEngagement)?,
            comments: read_family(dir, EntityFamily::Comment)?,
            playlists: read_family(dir, EntityFamily::Playlist)?,
            playlist_videos: read_family(dir, EntityFamily::PlaylistVideo)?,
        };
        log::info!(
            "loaded snapshot from {} ({} records)",
            dir.display(),
            snapshot.total()
        );
        Ok(snapshot)
    }

    pub fn len_of(&self, family: EntityFamily) -> usize {
        match family {
            EntityFamily::User => self.users.len(),
            EntityFamily::Video => self.videos.len(),
            EntityFamily::VideoEngagement => self.video_engagements.len(),
            EntityFamily::Follow => self.follows.len(),
            EntityFamily::Announcement => self.announcements.len(),
            EntityFamily::AnnouncementEngagement => self.announcement_engagements.len(),
            EntityFamily::Comment => self.comments.len(),
            EntityFamily::Playlist => self.playlists.len(),
            EntityFamily::PlaylistVideo => self.playlist_videos.len(),
        }
    }

    pub fn total(&self) -> usize {
        EntityFamily::RECONCILE_ORDER
            .iter()
            .map(|family| self.len_of(*family))
            .sum()
    }
}

pub fn file_name(family: EntityFamily) -> &'static str {
    match family {
        EntityFamily::User => "user.json",
        EntityFamily::Video => "video.json",
        EntityFamily::VideoEngagement => "videoEngagement.json",
        EntityFamily::Follow => "followEngagement.json",
        EntityFamily::Announcement => "announcement.json",
        EntityFamily::AnnouncementEngagement => "announcementEngagement.json",
        EntityFamily::Comment => "comment.json",
        EntityFamily::Playlist => "playlist.json",
        EntityFamily::PlaylistVideo => "playlistHasVideo.json",
    }
}

fn read_family<T: DeserializeOwned>(dir: &Path, family: EntityFamily) -> SeedResult<Vec<T>> {
    let name = file_name(family);
    let path = dir.join(name);
    if !path.exists() {
        log::debug!("{name} not present; treating {family} as empty");
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(&path)
        .map_err(|err| SeedError::snapshot(format!("read {name}: {err}")))?;
    serde_json::from_str(&raw).map_err(|err| SeedError::snapshot(format!("parse {name}: {err}")))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use super::{Snapshot, file_name};
    use clipdeck_seed_core::{EntityFamily, Patch, SeedError};

    #[test]
    fn missing_files_are_empty_families() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join(file_name(EntityFamily::User)),
            json!([{ "id": "164", "name": "Ada", "image": null }]).to_string(),
        )
        .expect("write users");
        let snapshot = Snapshot::load_dir(dir.path()).expect("load");
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.users[0].image, Patch::Null);
        assert_eq!(snapshot.len_of(EntityFamily::Video), 0);
        assert_eq!(snapshot.total(), 1);
    }

    #[test]
    fn malformed_file_names_the_file() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("followEngagement.json"), "{ not json").expect("write");
        let err = Snapshot::load_dir(dir.path()).unwrap_err();
        match err {
            SeedError::Snapshot { message } => assert!(message.contains("followEngagement.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let err = Snapshot::load_dir(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, SeedError::Snapshot { .. }));
    }
}
