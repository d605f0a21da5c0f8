use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{
    api::WorkTotalsProvider,
    utils::{
        clock::Clock,
        percentage::{seconds_percentage, Percentage},
        time::day_range,
    },
};

use super::{alert::Notifier, storage::dedupe_store::DedupeStore};

/// Required work time per day, 8 hours.
pub const DAY_SECONDS: u64 = 60 * 60 * 8;
pub const ALERT_START_PERCENT: f64 = 85.;
pub const ALERT_STEP_PERCENT: f64 = 5.;
pub const WATCH_INTERVAL: Duration = Duration::from_secs(60);

const ALERT_KEY_PREFIX: &str = "overworkingwatcher";
const ALERTED: &str = "ok";

#[derive(Debug, Clone, Copy)]
pub struct WatcherSettings {
    pub day_seconds: u64,
    pub alert_start_percent: f64,
    pub alert_step_percent: f64,
    pub interval: Duration,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            day_seconds: DAY_SECONDS,
            alert_start_percent: ALERT_START_PERCENT,
            alert_step_percent: ALERT_STEP_PERCENT,
            interval: WATCH_INTERVAL,
        }
    }
}

/// Key identifying an alert for a day and a stepped percentage. The month is zero based, so
/// December 12th 2023 becomes `2023-11-12`.
pub fn alert_key(date: NaiveDate, stepped: Percentage) -> String {
    format!(
        "{ALERT_KEY_PREFIX}-{:04}-{:02}-{:02}-{}",
        date.year(),
        date.month0(),
        date.day(),
        stepped.truncated()
    )
}

pub fn alert_message(percent: Percentage) -> String {
    format!(
        "Today you have already worked {}% of the required time!",
        percent.truncated()
    )
}

/// Periodically compares today's work with the daily quota and alerts the user once per day for
/// every step above the alert threshold.
pub struct OverworkWatcher<S: DedupeStore> {
    totals: Arc<dyn WorkTotalsProvider>,
    store: S,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    settings: WatcherSettings,
    shutdown: CancellationToken,
}

impl<S: DedupeStore> OverworkWatcher<S> {
    pub fn new(
        totals: Arc<dyn WorkTotalsProvider>,
        store: S,
        notifier: Box<dyn Notifier>,
        clock: Box<dyn Clock>,
        settings: WatcherSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            totals,
            store,
            notifier,
            clock,
            settings,
            shutdown,
        }
    }

    /// Performs a single check. Returns the percentage the user was alerted about, if any.
    pub async fn on_tick(&self) -> Result<Option<Percentage>> {
        let now = self.clock.local_time();
        let (start, end) = day_range(now)?;
        let total = self.totals.get_total(start, end).await?;

        let percent = seconds_percentage(total.time, self.settings.day_seconds as f64);
        let stepped = percent.stepped(self.settings.alert_step_percent);
        debug!("Worked {percent} of the day");

        if *stepped < self.settings.alert_start_percent {
            return Ok(None);
        }

        let key = alert_key(now.date_naive(), stepped);
        if !self.store.claim(&key, ALERTED).await? {
            debug!("Already alerted for {key}");
            return Ok(None);
        }

        self.notifier.notify(&alert_message(percent)).await?;
        Ok(Some(percent))
    }

    /// Executes the watcher event loop. The first check happens one interval after start.
    pub async fn run(self) -> Result<()> {
        let mut check_point = self.clock.instant();
        loop {
            check_point += self.settings.interval;

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(check_point) => ()
            }

            match self
                .on_tick()
                .instrument(info_span!("Checking today's work"))
                .await
            {
                Ok(Some(percent)) => info!("Alerted about working {percent} of the day"),
                Ok(None) => {}
                Err(e) => error!("Failed to check today's work {e:?}"),
            }
        }
    }
}
