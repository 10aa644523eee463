use sea_orm_migration::prelude::*;

use crate::db::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(key_col(Users::Id).primary_key())
                    .col(ColumnDef::new(Users::Name).text())
                    .col(ColumnDef::new(Users::Handle).text())
                    .col(ColumnDef::new(Users::Email).text())
                    .col(ColumnDef::new(Users::EmailVerified).big_integer())
                    .col(ColumnDef::new(Users::Image).text())
                    .col(ColumnDef::new(Users::BackgroundImage).text())
                    .col(ColumnDef::new(Users::Description).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Videos::Table)
                    .if_not_exists()
                    .col(key_col(Videos::Id).primary_key())
                    .col(key_col(Videos::UserId))
                    .col(ColumnDef::new(Videos::Title).text().not_null())
                    .col(ColumnDef::new(Videos::Description).text())
                    .col(ColumnDef::new(Videos::VideoUrl).text())
                    .col(ColumnDef::new(Videos::ThumbnailUrl).text())
                    .col(ColumnDef::new(Videos::Publish).boolean())
                    .col(ColumnDef::new(Videos::CreatedAt).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VideoEngagements::Table)
                    .if_not_exists()
                    .col(row_id_col(VideoEngagements::RowId))
                    .col(key_col(VideoEngagements::UserId))
                    .col(key_col(VideoEngagements::VideoId))
                    .col(
                        ColumnDef::new(VideoEngagements::EngagementType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VideoEngagements::CreatedAt).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FollowEngagements::Table)
                    .if_not_exists()
                    .col(key_col(FollowEngagements::FollowerId))
                    .col(key_col(FollowEngagements::FollowingId))
                    .col(ColumnDef::new(FollowEngagements::CreatedAt).big_integer())
                    .primary_key(
                        Index::create()
                            .name("pk_follow_engagements")
                            .col(FollowEngagements::FollowerId)
                            .col(FollowEngagements::FollowingId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Announcements::Table)
                    .if_not_exists()
                    .col(key_col(Announcements::Id).primary_key())
                    .col(key_col(Announcements::UserId))
                    .col(ColumnDef::new(Announcements::Message).text().not_null())
                    .col(ColumnDef::new(Announcements::CreatedAt).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AnnouncementEngagements::Table)
                    .if_not_exists()
                    .col(key_col(AnnouncementEngagements::AnnouncementId))
                    .col(key_col(AnnouncementEngagements::UserId))
                    .col(
                        ColumnDef::new(AnnouncementEngagements::EngagementType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AnnouncementEngagements::CreatedAt).big_integer())
                    .primary_key(
                        Index::create()
                            .name("pk_announcement_engagements")
                            .col(AnnouncementEngagements::AnnouncementId)
                            .col(AnnouncementEngagements::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(key_col(Comments::Id).primary_key())
                    .col(key_col(Comments::UserId))
                    .col(key_col(Comments::VideoId))
                    .col(ColumnDef::new(Comments::Message).text().not_null())
                    .col(ColumnDef::new(Comments::CreatedAt).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Playlists::Table)
                    .if_not_exists()
                    .col(key_col(Playlists::Id).primary_key())
                    .col(key_col(Playlists::UserId))
                    .col(ColumnDef::new(Playlists::Title).text().not_null())
                    .col(ColumnDef::new(Playlists::Description).text())
                    .col(ColumnDef::new(Playlists::CreatedAt).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlaylistVideos::Table)
                    .if_not_exists()
                    .col(row_id_col(PlaylistVideos::RowId))
                    .col(key_col(PlaylistVideos::PlaylistId))
                    .col(key_col(PlaylistVideos::VideoId))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, PlaylistVideos::Table).await?;
        drop_table(manager, Playlists::Table).await?;
        drop_table(manager, Comments::Table).await?;
        drop_table(manager, AnnouncementEngagements::Table).await?;
        drop_table(manager, Announcements::Table).await?;
        drop_table(manager, FollowEngagements::Table).await?;
        drop_table(manager, VideoEngagements::Table).await?;
        drop_table(manager, Videos::Table).await?;
        drop_table(manager, Users::Table).await
    }
}

async fn drop_table(manager: &SchemaManager<'_>, table: impl Iden + 'static) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(table).if_exists().to_owned())
        .await
}

fn key_col(col: impl Iden + 'static) -> ColumnDef {
    ColumnDef::new(col).string_len(64).not_null().to_owned()
}

fn row_id_col(col: impl Iden + 'static) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}
