use anyhow::{Context, Result};
use chrono_tz::Tz;
use reqwest::Client;
use url::Url;

use super::{feed, BlockedDates, BlockedDatesHandle};

/// Periodically rebuilds the blocked-date set from the external calendar
/// feed. A failed fetch or parse leaves the previously published set
/// untouched; the next scheduled tick is the retry. Runs are not serialized
/// against each other: the rebuild is idempotent and publication is a single
/// pointer swap.
pub struct CalendarSyncEngine {
    http: Client,
    feed_url: Url,
    timezone: Tz,
    blocked: BlockedDatesHandle,
}

impl CalendarSyncEngine {
    pub fn new(http: Client, feed_url: Url, timezone: Tz, blocked: BlockedDatesHandle) -> Self {
        Self {
            http,
            feed_url,
            timezone,
            blocked,
        }
    }

    pub async fn sync(&self) {
        let body = match self.fetch_feed().await {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(
                    target: "calendar",
                    error = %err,
                    "feed sync failed, keeping previous blocked dates"
                );
                return;
            }
        };

        let events = feed::parse_feed(&body, self.timezone);
        let days = feed::expand_blocked_days(&events);
        let digest = feed::digest(&days);

        if self.blocked.current().digest == digest {
            tracing::debug!(target: "calendar", "feed unchanged");
            return;
        }

        tracing::info!(
            target: "calendar",
            events = events.len(),
            days = days.len(),
            "publishing updated blocked dates"
        );
        self.blocked.publish(BlockedDates { days, digest });
    }

    async fn fetch_feed(&self) -> Result<String> {
        let response = self
            .http
            .get(self.feed_url.clone())
            .send()
            .await
            .with_context(|| format!("failed to fetch calendar feed {}", self.feed_url))?
            .error_for_status()?;
        response.text().await.context("failed to read feed body")
    }
}
