use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{app::ServiceContext, calendar::CalendarSyncEngine};

/// Registers the background jobs: the daily tracker reset and, when a feed
/// is configured, the periodic calendar sync. Both work through the shared
/// service context, same accessors the request handlers use.
pub async fn configure_jobs(
    ctx: Arc<ServiceContext>,
    sync_engine: Option<Arc<CalendarSyncEngine>>,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let reset_cron = ctx.config.spam.reset_cron.clone();
    let tracker_ctx = ctx.clone();
    let reset_job = Job::new_async(reset_cron.as_str(), move |_id, _l| {
        let ctx = tracker_ctx.clone();
        Box::pin(async move {
            let cleared = ctx.tracker.reset();
            tracing::info!(target: "scheduler", cleared, "daily tracker reset");
        })
    })?;
    scheduler.add(reset_job).await?;
    tracing::info!(target: "scheduler", cron = %reset_cron, "tracker reset job registered");

    if let Some(engine) = sync_engine {
        let sync_cron = ctx.config.calendar.sync_cron.clone();
        let sync_job = Job::new_async(sync_cron.as_str(), move |_id, _l| {
            let engine = engine.clone();
            Box::pin(async move {
                engine.sync().await;
            })
        })?;
        scheduler.add(sync_job).await?;
        tracing::info!(target: "scheduler", cron = %sync_cron, "calendar sync job registered");
    }

    scheduler.start().await?;
    Ok(scheduler)
}
