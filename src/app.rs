use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, time::timeout};
use tokio_cron_scheduler::JobScheduler;

use crate::{
    calendar::{BlockedDatesHandle, CalendarSyncEngine},
    config::AppConfig,
    http,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    mail::Mailer,
    spam::{RateTracker, RegionClient},
    store::HeldStore,
    tasks,
};

/// All mutable service state behind one owner: the per-origin tracker, the
/// published blocked-date set, the hold queue, and the outbound
/// collaborators. Handlers and scheduled jobs share it through `Arc`.
pub struct ServiceContext {
    pub config: Arc<AppConfig>,
    pub tracker: RateTracker,
    pub blocked_dates: BlockedDatesHandle,
    pub held: HeldStore,
    pub mailer: Mailer,
    pub region: RegionClient,
}

pub struct ContactIntakeApp {
    ctx: Arc<ServiceContext>,
    scheduler: JobScheduler,
    shutdown: Shutdown,
}

impl ContactIntakeApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let http_client = Client::builder()
            .user_agent(format!("kontakt-intake-rust/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let held = HeldStore::open(paths.store_path.clone()).await?;
        let mailer = Mailer::new(config.mail.clone())?;
        let region = RegionClient::new(http_client.clone(), config.region.clone());
        let blocked_dates = BlockedDatesHandle::default();

        let sync_engine = config.calendar.feed_url.clone().map(|feed_url| {
            Arc::new(CalendarSyncEngine::new(
                http_client,
                feed_url,
                config.timezone,
                blocked_dates.clone(),
            ))
        });

        let ctx = Arc::new(ServiceContext {
            config,
            tracker: RateTracker::new(),
            blocked_dates,
            held,
            mailer,
            region,
        });

        match &sync_engine {
            Some(engine) => engine.sync().await,
            None => {
                tracing::warn!(
                    target: "calendar",
                    "CALENDAR_FEED_URL not set, blocked-date sync disabled"
                );
            }
        }

        let scheduler = tasks::configure_jobs(ctx.clone(), sync_engine).await?;

        Ok(Self {
            ctx,
            scheduler,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            ctx,
            mut scheduler,
            shutdown,
        } = self;

        let addr = SocketAddr::from(([0, 0, 0, 0], ctx.config.server.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!(%addr, "contact-form intake listening");

        let router = http::create_router(ctx.clone());
        let mut serve_shutdown = shutdown.subscribe();
        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            serve_shutdown.notified().await;
            tracing::info!("shutdown signal received (CTRL+C / SIGTERM)");
        })
        .await;

        if let Err(err) = result {
            tracing::error!(error = %err, "http server exited with error");
        }

        let shutdown_timeout = Duration::from_secs(5);
        match timeout(shutdown_timeout, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(?err, "scheduler teardown failed");
            }
            Err(_) => {
                tracing::warn!(
                    target: "scheduler",
                    "scheduler did not stop within {:?}",
                    shutdown_timeout
                );
            }
        }

        tracing::info!("intake service stopped");
        Ok(())
    }
}
