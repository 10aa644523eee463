//! Snapshot records as they arrive from the export files.
//!
//! Field names follow the export's camelCase JSON. Optional scalar fields use
//! [`Patch`] so that an absent key and an explicit `null` stay distinguishable.

use serde::{Deserialize, Serialize};

use crate::model::{AnnouncementEngagementType, VideoEngagementType};
use crate::value::Patch;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub handle: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub email: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub email_verified: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub image: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub background_image: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub description: Patch<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub description: Patch<String>,
    /// Relative asset path; both the playable and the thumbnail URL derive from it.
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub video_url: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub publish: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub created_at: Patch<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEngagementRecord {
    pub user_id: String,
    pub video_id: String,
    pub engagement_type: VideoEngagementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRecord {
    pub follower_id: String,
    pub following_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRecord {
    pub id: String,
    pub user_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementEngagementRecord {
    pub announcement_id: String,
    pub user_id: String,
    pub engagement_type: AnnouncementEngagementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// `userId` and `videoId` are carried but not trusted; reconciliation replaces them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub created_at: Patch<String>,
}

/// `userId` is carried but not trusted; reconciliation replaces it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub created_at: Patch<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideoRecord {
    pub playlist_id: String,
    pub video_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_record_reads_export_shape() {
        let record: UserRecord = serde_json::from_value(json!({
            "id": "164",
            "name": "Ada",
            "emailVerified": null,
            "image": "/v1/avatars/ada.png"
        }))
        .expect("user");
        assert_eq!(record.name, Patch::Value("Ada".into()));
        assert_eq!(record.email_verified, Patch::Null);
        assert_eq!(record.background_image, Patch::Missing);
        assert_eq!(record.image.value().map(String::as_str), Some("/v1/avatars/ada.png"));
    }

    #[test]
    fn engagement_type_is_upper_case() {
        let record: VideoEngagementRecord = serde_json::from_value(json!({
            "userId": "164",
            "videoId": "3",
            "engagementType": "LIKE"
        }))
        .expect("engagement");
        assert_eq!(record.engagement_type, VideoEngagementType::Like);
        assert!(record.created_at.is_none());

        let err = serde_json::from_value::<VideoEngagementRecord>(json!({
            "userId": "164",
            "videoId": "3",
            "engagementType": "SHRUG"
        }));
        assert!(err.is_err());
    }
}
