use serde::Serialize;

use clipdeck_seed_core::{
    ApplyOutcome, AssetResolver, ChunkRunner, CyclicAllocator, DEFAULT_OWNER_USER_IDS,
    DEFAULT_OWNER_VIDEO_IDS, EntityFamily, KeyRange, SeedBackend, SeedResult,
};

use crate::reconcile::{
    AnnouncementEngagementReconciler, AnnouncementReconciler, ApplyRow, CommentReconciler,
    EntityReconciler, FollowReconciler, OwnerAllocators, PlaylistReconciler,
    PlaylistVideoReconciler, UserReconciler, VideoEngagementReconciler, VideoReconciler,
};
use crate::snapshot::Snapshot;

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub assets: AssetResolver,
    pub chunk_size: usize,
    pub owner_user_ids: KeyRange,
    pub owner_video_ids: KeyRange,
}

impl PipelineOptions {
    pub fn new(assets: AssetResolver) -> Self {
        Self {
            assets,
            chunk_size: 1,
            owner_user_ids: DEFAULT_OWNER_USER_IDS,
            owner_video_ids: DEFAULT_OWNER_VIDEO_IDS,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ClearedFamily {
    pub family: EntityFamily,
    pub removed: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct FamilyReport {
    pub family: EntityFamily,
    pub processed: usize,
    pub written: usize,
    /// Records whose composite key was already present.
    pub skipped: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RunReport {
    pub cleared: Vec<ClearedFamily>,
    pub families: Vec<FamilyReport>,
}

impl RunReport {
    pub fn family(&self, family: EntityFamily) -> Option<&FamilyReport> {
        self.families.iter().find(|report| report.family == family)
    }
}

/// Clears the store and reconciles a snapshot into it, family by family.
pub struct Pipeline<'a> {
    store: &'a dyn SeedBackend,
    runner: ChunkRunner,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a dyn SeedBackend, options: PipelineOptions) -> SeedResult<Self> {
        let runner = ChunkRunner::new(options.chunk_size)?;
        // Surface empty owner ranges before anything is cleared.
        owner_allocators(&options)?;
        Ok(Self {
            store,
            runner,
            options,
        })
    }

    /// Deletes every family, members before owners.
    pub async fn clear(&self) -> SeedResult<Vec<ClearedFamily>> {
        log::info!("clearing store");
        let mut cleared = Vec::with_capacity(EntityFamily::RECONCILE_ORDER.len());
        for family in EntityFamily::clear_order() {
            let removed = self.store.clear_family(family).await?;
            cleared.push(ClearedFamily { family, removed });
        }
        Ok(cleared)
    }

    /// Applies `snapshot` in dependency order. Stops at the first failure.
    pub async fn reconcile(&self, snapshot: Snapshot) -> SeedResult<Vec<FamilyReport>> {
        log::info!(
            "reconciling {} records with chunk size {}",
            snapshot.total(),
            self.runner.chunk_size()
        );
        let Snapshot {
            users,
            videos,
            video_engagements,
            follows,
            announcements,
            announcement_engagements,
            comments,
            playlists,
            playlist_videos,
        } = snapshot;
        let assets = &self.options.assets;
        let mut owners = owner_allocators(&self.options)?;

        let mut reports = Vec::with_capacity(EntityFamily::RECONCILE_ORDER.len());
        reports.push(
            self.reconcile_family(&mut UserReconciler::new(assets), users)
                .await?,
        );
        reports.push(
            self.reconcile_family(&mut VideoReconciler::new(assets), videos)
                .await?,
        );
        reports.push(
            self.reconcile_family(&mut VideoEngagementReconciler, video_engagements)
                .await?,
        );
        reports.push(self.reconcile_family(&mut FollowReconciler, follows).await?);
        reports.push(
            self.reconcile_family(&mut AnnouncementReconciler, announcements)
                .await?,
        );
        reports.push(
            self.reconcile_family(
                &mut AnnouncementEngagementReconciler,
                announcement_engagements,
            )
            .await?,
        );
        // Comments draw first from the shared user cursor, then playlists continue it.
        let mut comment_reconciler = CommentReconciler::new(&mut owners);
        reports.push(self.reconcile_family(&mut comment_reconciler, comments).await?);
        let mut playlist_reconciler = PlaylistReconciler::new(&mut owners);
        reports.push(self.reconcile_family(&mut playlist_reconciler, playlists).await?);
        reports.push(
            self.reconcile_family(&mut PlaylistVideoReconciler, playlist_videos)
                .await?,
        );
        Ok(reports)
    }

    /// Clear, then reconcile.
    pub async fn run(&self, snapshot: Snapshot) -> SeedResult<RunReport> {
        let cleared = self.clear().await?;
        let families = self.reconcile(snapshot).await?;
        Ok(RunReport { cleared, families })
    }

    async fn reconcile_family<R>(
        &self,
        reconciler: &mut R,
        records: Vec<R::Record>,
    ) -> SeedResult<FamilyReport>
    where
        R: EntityReconciler,
    {
        let family = R::FAMILY;
        let processed = records.len();
        let store = self.store;
        let outcomes = self
            .runner
            .run(records, |record| {
                let row = reconciler.prepare(record);
                async move { row?.apply(store).await }
            })
            .await?;
        let skipped = outcomes
            .iter()
            .filter(|outcome| **outcome == ApplyOutcome::Skipped)
            .count();
        let report = FamilyReport {
            family,
            processed,
            written: processed - skipped,
            skipped,
        };
        log::info!(
            "{family}: {} processed, {} written, {} skipped",
            report.processed,
            report.written,
            report.skipped
        );
        Ok(report)
    }
}

fn owner_allocators(options: &PipelineOptions) -> SeedResult<OwnerAllocators> {
    Ok(OwnerAllocators {
        users: CyclicAllocator::new(options.owner_user_ids)?,
        videos: CyclicAllocator::new(options.owner_video_ids)?,
    })
}
