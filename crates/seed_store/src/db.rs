use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum Users {
    Table,
    Id,
    Name,
    Handle,
    Email,
    EmailVerified,
    Image,
    BackgroundImage,
    Description,
}

#[derive(Iden, Clone, Copy)]
pub enum Videos {
    Table,
    Id,
    UserId,
    Title,
    Description,
    VideoUrl,
    ThumbnailUrl,
    Publish,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum VideoEngagements {
    Table,
    RowId,
    UserId,
    VideoId,
    EngagementType,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum FollowEngagements {
    Table,
    FollowerId,
    FollowingId,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Announcements {
    Table,
    Id,
    UserId,
    Message,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum AnnouncementEngagements {
    Table,
    AnnouncementId,
    UserId,
    EngagementType,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Comments {
    Table,
    Id,
    UserId,
    VideoId,
    Message,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Playlists {
    Table,
    Id,
    UserId,
    Title,
    Description,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum PlaylistVideos {
    Table,
    RowId,
    PlaylistId,
    VideoId,
}
