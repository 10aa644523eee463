use std::path::Path;

use async_trait::async_trait;
use sea_orm::sea_query;
use sea_orm::sea_query::{
    Alias, Asterisk, Expr, ExprTrait, Func, InsertStatement, IntoIden, MysqlQueryBuilder,
    OnConflict, PostgresQueryBuilder, Query, QueryStatementWriter, SqliteQueryBuilder,
    Value as SeaValue, Values,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement,
};
use sea_orm_migration::MigratorTrait;

use crate::db::*;
use crate::migration::Migrator;
use crate::SeedConfig;
use clipdeck_seed_core::api::{
    AppendWriteApi, MaintenanceApi, PrimaryWriteApi, RelationWriteApi, SnapshotReadApi,
};
use clipdeck_seed_core::{
    Announcement, AnnouncementEngagement, AnnouncementEngagementType, ApplyOutcome, Comment,
    CommentUpsert, DrawnKey, EntityFamily, Follow, Patch, Playlist, PlaylistUpsert, PlaylistVideo,
    SeedError, SeedResult, Timestamp, User, UserUpsert, Video, VideoEngagement, VideoUpsert,
};

#[derive(Clone)]
pub struct SeedStore {
    conn: DatabaseConnection,
}

impl SeedStore {
    /// Connects using the config in `base_dir`, writing a default one if absent.
    pub async fn open(base_dir: &Path) -> SeedResult<Self> {
        let config = SeedConfig::load_or_init(base_dir)?;
        Self::connect(&config, base_dir).await
    }

    /// Connects and brings the schema up to date.
    pub async fn connect(config: &SeedConfig, base_dir: &Path) -> SeedResult<Self> {
        let mut options = ConnectOptions::new(config.database.url(base_dir));
        if let Some(pool) = &config.pool {
            pool.apply_to(&mut options);
        }
        options.sqlx_logging(false);
        let conn = Database::connect(options).await.map_err(SeedError::from)?;
        Migrator::up(&conn, None).await.map_err(SeedError::from)?;
        log::info!("connected to {} store", config.database.backend_name());
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Tears the connection pool down.
    pub async fn close(self) -> SeedResult<()> {
        self.conn.close().await.map_err(SeedError::from)
    }
}

#[async_trait]
impl MaintenanceApi for SeedStore {
    async fn clear_family(&self, family: EntityFamily) -> SeedResult<u64> {
        let removed = match family {
            EntityFamily::User => clear_table(&self.conn, Users::Table).await?,
            EntityFamily::Video => clear_table(&self.conn, Videos::Table).await?,
            EntityFamily::VideoEngagement => {
                clear_table(&self.conn, VideoEngagements::Table).await?
            }
            EntityFamily::Follow => clear_table(&self.conn, FollowEngagements::Table).await?,
            EntityFamily::Announcement => clear_table(&self.conn, Announcements::Table).await?,
            EntityFamily::AnnouncementEngagement => {
                clear_table(&self.conn, AnnouncementEngagements::Table).await?
            }
            EntityFamily::Comment => clear_table(&self.conn, Comments::Table).await?,
            EntityFamily::Playlist => clear_table(&self.conn, Playlists::Table).await?,
            EntityFamily::PlaylistVideo => clear_table(&self.conn, PlaylistVideos::Table).await?,
        };
        log::debug!("cleared {removed} {family} rows");
        Ok(removed)
    }

    async fn count_family(&self, family: EntityFamily) -> SeedResult<u64> {
        match family {
            EntityFamily::User => count_table(&self.conn, Users::Table).await,
            EntityFamily::Video => count_table(&self.conn, Videos::Table).await,
            EntityFamily::VideoEngagement => count_table(&self.conn, VideoEngagements::Table).await,
            EntityFamily::Follow => count_table(&self.conn, FollowEngagements::Table).await,
            EntityFamily::Announcement => count_table(&self.conn, Announcements::Table).await,
            EntityFamily::AnnouncementEngagement => {
                count_table(&self.conn, AnnouncementEngagements::Table).await
            }
            EntityFamily::Comment => count_table(&self.conn, Comments::Table).await,
            EntityFamily::Playlist => count_table(&self.conn, Playlists::Table).await,
            EntityFamily::PlaylistVideo => count_table(&self.conn, PlaylistVideos::Table).await,
        }
    }
}

#[async_trait]
impl PrimaryWriteApi for SeedStore {
    async fn upsert_user(&self, row: UserUpsert) -> SeedResult<()> {
        let mut upsert = UpsertBuilder::new(Users::Id, row.id.into());
        upsert.text(Users::Name, row.name);
        upsert.text(Users::Handle, row.handle);
        upsert.text(Users::Email, row.email);
        upsert.timestamp(Users::EmailVerified, row.email_verified);
        upsert.text(Users::Image, row.image);
        upsert.text(Users::BackgroundImage, row.background_image);
        upsert.text(Users::Description, row.description);
        exec(&self.conn, &upsert.build(Users::Table)).await
    }

    async fn upsert_video(&self, row: VideoUpsert) -> SeedResult<()> {
        let mut upsert = UpsertBuilder::new(Videos::Id, row.id.into());
        upsert.set(Videos::UserId, row.user_id.into());
        upsert.set(Videos::Title, row.title.into());
        upsert.text(Videos::Description, row.description);
        upsert.text(Videos::VideoUrl, row.video_url);
        upsert.text(Videos::ThumbnailUrl, row.thumbnail_url);
        upsert.flag(Videos::Publish, row.publish);
        upsert.timestamp(Videos::CreatedAt, row.created_at);
        exec(&self.conn, &upsert.build(Videos::Table)).await
    }

    async fn upsert_comment(&self, row: CommentUpsert) -> SeedResult<()> {
        let mut upsert = UpsertBuilder::new(Comments::Id, row.id.into());
        upsert.drawn(Comments::UserId, row.user_id);
        upsert.drawn(Comments::VideoId, row.video_id);
        upsert.set(Comments::Message, row.message.into());
        upsert.timestamp(Comments::CreatedAt, row.created_at);
        exec(&self.conn, &upsert.build(Comments::Table)).await
    }

    async fn upsert_playlist(&self, row: PlaylistUpsert) -> SeedResult<()> {
        let mut upsert = UpsertBuilder::new(Playlists::Id, row.id.into());
        upsert.drawn(Playlists::UserId, row.user_id);
        upsert.set(Playlists::Title, row.title.into());
        upsert.text(Playlists::Description, row.description);
        upsert.timestamp(Playlists::CreatedAt, row.created_at);
        exec(&self.conn, &upsert.build(Playlists::Table)).await
    }
}

#[async_trait]
impl AppendWriteApi for SeedStore {
    async fn insert_video_engagement(&self, row: VideoEngagement) -> SeedResult<()> {
        let insert = Query::insert()
            .into_table(VideoEngagements::Table)
            .columns([
                VideoEngagements::UserId,
                VideoEngagements::VideoId,
                VideoEngagements::EngagementType,
                VideoEngagements::CreatedAt,
            ])
            .values_panic([
                row.user_id.into(),
                row.video_id.into(),
                row.engagement_type.as_str().into(),
                timestamp_value(row.created_at).into(),
            ])
            .to_owned();
        exec(&self.conn, &insert).await
    }

    async fn insert_announcement(&self, row: Announcement) -> SeedResult<()> {
        let insert = Query::insert()
            .into_table(Announcements::Table)
            .columns([
                Announcements::Id,
                Announcements::UserId,
                Announcements::Message,
                Announcements::CreatedAt,
            ])
            .values_panic([
                row.id.into(),
                row.user_id.into(),
                row.message.into(),
                timestamp_value(row.created_at).into(),
            ])
            .to_owned();
        exec(&self.conn, &insert).await
    }

    async fn insert_playlist_video(&self, row: PlaylistVideo) -> SeedResult<()> {
        let insert = Query::insert()
            .into_table(PlaylistVideos::Table)
            .columns([PlaylistVideos::PlaylistId, PlaylistVideos::VideoId])
            .values_panic([
                row.playlist_id.into(),
                row.video_id.into(),
            ])
            .to_owned();
        exec(&self.conn, &insert).await
    }
}

#[async_trait]
impl RelationWriteApi for SeedStore {
    async fn insert_follow_if_absent(&self, row: Follow) -> SeedResult<ApplyOutcome> {
        let backend = self.conn.get_database_backend();
        let (sql, values) = insert_if_absent_sql(backend, follow_insert(row))?;
        insert_outcome(&self.conn, sql, values).await
    }

    async fn insert_announcement_engagement_if_absent(
        &self,
        row: AnnouncementEngagement,
    ) -> SeedResult<ApplyOutcome> {
        let backend = self.conn.get_database_backend();
        let (sql, values) = insert_if_absent_sql(backend, announcement_engagement_insert(row))?;
        insert_outcome(&self.conn, sql, values).await
    }
}

/// A plain insert plus the key columns a duplicate is detected on.
struct KeyedInsert<K> {
    insert: InsertStatement,
    key: [K; 2],
}

fn follow_insert(row: Follow) -> KeyedInsert<FollowEngagements> {
    let insert = Query::insert()
        .into_table(FollowEngagements::Table)
        .columns([
            FollowEngagements::FollowerId,
            FollowEngagements::FollowingId,
            FollowEngagements::CreatedAt,
        ])
        .values_panic([
            row.follower_id.into(),
            row.following_id.into(),
            timestamp_value(row.created_at).into(),
        ])
        .to_owned();
    KeyedInsert {
        insert,
        key: [FollowEngagements::FollowerId, FollowEngagements::FollowingId],
    }
}

fn announcement_engagement_insert(
    row: AnnouncementEngagement,
) -> KeyedInsert<AnnouncementEngagements> {
    let insert = Query::insert()
        .into_table(AnnouncementEngagements::Table)
        .columns([
            AnnouncementEngagements::AnnouncementId,
            AnnouncementEngagements::UserId,
            AnnouncementEngagements::EngagementType,
            AnnouncementEngagements::CreatedAt,
        ])
        .values_panic([
            row.announcement_id.into(),
            row.user_id.into(),
            row.engagement_type.as_str().into(),
            timestamp_value(row.created_at).into(),
        ])
        .to_owned();
    KeyedInsert {
        insert,
        key: [
            AnnouncementEngagements::AnnouncementId,
            AnnouncementEngagements::UserId,
        ],
    }
}

/// Renders an insert that leaves an existing row alone and reports zero affected
/// rows when it does.
///
/// MySQL gets `INSERT IGNORE`: its `ON DUPLICATE KEY UPDATE` form counts the
/// matched row as affected under the client's found-rows flag.
fn insert_if_absent_sql<K>(
    backend: DatabaseBackend,
    keyed: KeyedInsert<K>,
) -> SeedResult<(String, Values)>
where
    K: IntoIden,
{
    let KeyedInsert { mut insert, key } = keyed;
    match backend {
        DatabaseBackend::MySql => {
            let (sql, values) = insert.build(MysqlQueryBuilder);
            let rest = sql.strip_prefix("INSERT ").ok_or_else(|| {
                SeedError::storage(format!("unexpected insert statement: {sql}"))
            })?;
            Ok((format!("INSERT IGNORE {rest}"), values))
        }
        _ => {
            insert.on_conflict(OnConflict::columns(key).do_nothing().to_owned());
            Ok(build_stmt(backend, &insert))
        }
    }
}

#[async_trait]
impl SnapshotReadApi for SeedStore {
    async fn get_user(&self, id: &str) -> SeedResult<Option<User>> {
        let select = Query::select()
            .from(Users::Table)
            .columns([
                Users::Id,
                Users::Name,
                Users::Handle,
                Users::Email,
                Users::EmailVerified,
                Users::Image,
                Users::BackgroundImage,
                Users::Description,
            ])
            .and_where(Expr::col(Users::Id).eq(id))
            .limit(1)
            .to_owned();
        let Some(row) = query_one(&self.conn, &select).await? else {
            return Ok(None);
        };
        Ok(Some(User {
            id: row.try_get("", &col_name(Users::Id))?,
            name: row.try_get("", &col_name(Users::Name))?,
            handle: row.try_get("", &col_name(Users::Handle))?,
            email: row.try_get("", &col_name(Users::Email))?,
            email_verified: read_timestamp(&row, Users::EmailVerified)?,
            image: row.try_get("", &col_name(Users::Image))?,
            background_image: row.try_get("", &col_name(Users::BackgroundImage))?,
            description: row.try_get("", &col_name(Users::Description))?,
        }))
    }

    async fn get_video(&self, id: &str) -> SeedResult<Option<Video>> {
        let select = Query::select()
            .from(Videos::Table)
            .columns([
                Videos::Id,
                Videos::UserId,
                Videos::Title,
                Videos::Description,
                Videos::VideoUrl,
                Videos::ThumbnailUrl,
                Videos::Publish,
                Videos::CreatedAt,
            ])
            .and_where(Expr::col(Videos::Id).eq(id))
            .limit(1)
            .to_owned();
        let Some(row) = query_one(&self.conn, &select).await? else {
            return Ok(None);
        };
        Ok(Some(Video {
            id: row.try_get("", &col_name(Videos::Id))?,
            user_id: row.try_get("", &col_name(Videos::UserId))?,
            title: row.try_get("", &col_name(Videos::Title))?,
            description: row.try_get("", &col_name(Videos::Description))?,
            video_url: row.try_get("", &col_name(Videos::VideoUrl))?,
            thumbnail_url: row.try_get("", &col_name(Videos::ThumbnailUrl))?,
            publish: row.try_get("", &col_name(Videos::Publish))?,
            created_at: read_timestamp(&row, Videos::CreatedAt)?,
        }))
    }

    async fn get_comment(&self, id: &str) -> SeedResult<Option<Comment>> {
        let select = Query::select()
            .from(Comments::Table)
            .columns([
                Comments::Id,
                Comments::UserId,
                Comments::VideoId,
                Comments::Message,
                Comments::CreatedAt,
            ])
            .and_where(Expr::col(Comments::Id).eq(id))
            .limit(1)
            .to_owned();
        let Some(row) = query_one(&self.conn, &select).await? else {
            return Ok(None);
        };
        Ok(Some(Comment {
            id: row.try_get("", &col_name(Comments::Id))?,
            user_id: row.try_get("", &col_name(Comments::UserId))?,
            video_id: row.try_get("", &col_name(Comments::VideoId))?,
            message: row.try_get("", &col_name(Comments::Message))?,
            created_at: read_timestamp(&row, Comments::CreatedAt)?,
        }))
    }

    async fn get_playlist(&self, id: &str) -> SeedResult<Option<Playlist>> {
        let select = Query::select()
            .from(Playlists::Table)
            .columns([
                Playlists::Id,
                Playlists::UserId,
                Playlists::Title,
                Playlists::Description,
                Playlists::CreatedAt,
            ])
            .and_where(Expr::col(Playlists::Id).eq(id))
            .limit(1)
            .to_owned();
        let Some(row) = query_one(&self.conn, &select).await? else {
            return Ok(None);
        };
        Ok(Some(Playlist {
            id: row.try_get("", &col_name(Playlists::Id))?,
            user_id: row.try_get("", &col_name(Playlists::UserId))?,
            title: row.try_get("", &col_name(Playlists::Title))?,
            description: row.try_get("", &col_name(Playlists::Description))?,
            created_at: read_timestamp(&row, Playlists::CreatedAt)?,
        }))
    }

    async fn find_follows(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> SeedResult<Vec<Follow>> {
        let select = Query::select()
            .from(FollowEngagements::Table)
            .columns([
                FollowEngagements::FollowerId,
                FollowEngagements::FollowingId,
                FollowEngagements::CreatedAt,
            ])
            .and_where(Expr::col(FollowEngagements::FollowerId).eq(follower_id))
            .and_where(Expr::col(FollowEngagements::FollowingId).eq(following_id))
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter()
            .map(|row| {
                Ok(Follow {
                    follower_id: row.try_get("", &col_name(FollowEngagements::FollowerId))?,
                    following_id: row.try_get("", &col_name(FollowEngagements::FollowingId))?,
                    created_at: read_timestamp(row, FollowEngagements::CreatedAt)?,
                })
            })
            .collect()
    }

    async fn find_announcement_engagements(
        &self,
        announcement_id: &str,
        user_id: &str,
    ) -> SeedResult<Vec<AnnouncementEngagement>> {
        let select = Query::select()
            .from(AnnouncementEngagements::Table)
            .columns([
                AnnouncementEngagements::AnnouncementId,
                AnnouncementEngagements::UserId,
                AnnouncementEngagements::EngagementType,
                AnnouncementEngagements::CreatedAt,
            ])
            .and_where(Expr::col(AnnouncementEngagements::AnnouncementId).eq(announcement_id))
            .and_where(Expr::col(AnnouncementEngagements::UserId).eq(user_id))
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter()
            .map(|row| {
                let engagement_type: String =
                row.try_get("", &col_name(AnnouncementEngagements::EngagementType))?;
                Ok(AnnouncementEngagement {
                    announcement_id: row
                        .try_get("", &col_name(AnnouncementEngagements::AnnouncementId))?,
                    user_id: row.try_get("", &col_name(AnnouncementEngagements::UserId))?,
                    engagement_type: AnnouncementEngagementType::parse(&engagement_type)?,
                    created_at: read_timestamp(row, AnnouncementEngagements::CreatedAt)?,
                })
            })
            .collect()
    }
}

/// Insert-or-update keyed on one primary key column.
///
/// `Missing` patches are inserted as NULL and excluded from the update set.
struct UpsertBuilder<C> {
    key: C,
    columns: Vec<C>,
    values: Vec<SeaValue>,
    updates: Vec<C>,
    /// Columns updated to a value other than the inserted one.
    assigned: Vec<(C, SeaValue)>,
}

impl<C> UpsertBuilder<C>
where
    C: sea_query::Iden + Copy + 'static,
{
    fn new(key: C, key_value: SeaValue) -> Self {
        Self {
            key,
            columns: vec![key],
            values: vec![key_value],
            updates: Vec::new(),
            assigned: Vec::new(),
        }
    }

    fn set(&mut self, column: C, value: SeaValue) {
        self.columns.push(column);
        self.values.push(value);
        self.updates.push(column);
    }

    fn patch(&mut self, column: C, missing: bool, value: SeaValue) {
        self.columns.push(column);
        self.values.push(value);
        if !missing {
            self.updates.push(column);
        }
    }

    fn drawn(&mut self, column: C, key: DrawnKey) {
        self.columns.push(column);
        self.values.push(key.on_create.into());
        self.assigned.push((column, key.on_update.into()));
    }

    fn text(&mut self, column: C, patch: Patch<String>) {
        let missing = patch.is_missing();
        self.patch(column, missing, SeaValue::String(patch.into_option()));
    }

    fn timestamp(&mut self, column: C, patch: Patch<Timestamp>) {
        let missing = patch.is_missing();
        self.patch(column, missing, timestamp_value(patch.into_option()));
    }

    fn flag(&mut self, column: C, patch: Patch<bool>) {
        let missing = patch.is_missing();
        self.patch(column, missing, SeaValue::Bool(patch.into_option()));
    }

    fn build(self, table: impl sea_query::IntoTableRef) -> InsertStatement {
        let mut on_conflict = OnConflict::column(self.key);
        if self.updates.is_empty() && self.assigned.is_empty() {
            // MySQL has no DO NOTHING; this renders `ON DUPLICATE KEY UPDATE key = key` there.
            on_conflict.do_nothing_on([self.key]);
        } else {
            on_conflict.update_columns(self.updates);
            for (column, value) in self.assigned {
                on_conflict.value(column, value);
            }
        }
        Query::insert()
            .into_table(table)
            .columns(self.columns)
            .values_panic(self.values.into_iter().map(Into::into))
            .on_conflict(on_conflict)
            .to_owned()
    }
}

async fn clear_table<C, T>(conn: &C, table: T) -> SeedResult<u64>
where
    C: ConnectionTrait,
    T: sea_query::Iden + 'static,
{
    let delete = Query::delete().from_table(table).to_owned();
    exec_affected(conn, &delete).await
}

async fn count_table<C, T>(conn: &C, table: T) -> SeedResult<u64>
where
    C: ConnectionTrait,
    T: sea_query::Iden + 'static,
{
    let select = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("total"))
        .from(table)
        .to_owned();
    let row = query_one(conn, &select)
        .await?
        .ok_or_else(|| SeedError::storage("count returned no row"))?;
    let total: i64 = row.try_get("", "total")?;
    u64::try_from(total).map_err(|_| SeedError::storage("negative row count"))
}

fn timestamp_value(value: Option<Timestamp>) -> SeaValue {
    SeaValue::BigInt(value.map(Timestamp::as_micros))
}

fn read_timestamp(row: &QueryResult, column: impl sea_query::Iden) -> SeedResult<Option<Timestamp>> {
    let value: Option<i64> = row.try_get("", &col_name(column))?;
    Ok(value.map(Timestamp::from_micros))
}

fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(backend: DatabaseBackend, stmt: &S) -> (String, Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

async fn exec<C, S>(conn: &C, stmt: &S) -> SeedResult<()>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    exec_affected(conn, stmt).await.map(|_| ())
}

async fn exec_affected<C, S>(conn: &C, stmt: &S) -> SeedResult<u64>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let result = conn
        .execute_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(result.rows_affected())
}

async fn insert_outcome<C>(conn: &C, sql: String, values: Values) -> SeedResult<ApplyOutcome>
where
    C: ConnectionTrait,
{
    let backend = conn.get_database_backend();
    let result = conn
        .execute_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    if result.rows_affected() == 0 {
        Ok(ApplyOutcome::Skipped)
    } else {
        Ok(ApplyOutcome::Written)
    }
}

async fn query_all<C, S>(conn: &C, stmt: &S) -> SeedResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

async fn query_one<C, S>(conn: &C, stmt: &S) -> SeedResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}
