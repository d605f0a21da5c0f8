use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use storage::dedupe_store::{DedupeStore, FileDedupeStore};
use ticker::{CounterSignal, ElapsedTimeTicker, DEFAULT_TICK_PERIOD};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use watcher::{OverworkWatcher, WatcherSettings};

use crate::{
    api::{http::HttpWorkApi, ActiveTaskQuery, WorkTotalsProvider},
    utils::clock::{Clock, DefaultClock},
};

use alert::{create_notifier, Notifier};

pub mod alert;
pub mod args;
pub mod shutdown;
pub mod signals;
pub mod status;
pub mod storage;
pub mod ticker;
pub mod watcher;

pub const ALERTS_FILE: &str = "alerts.json";

/// Represents the starting point for the daemon. Alerts go to the inbox in `dir`, and to stdout
/// too when `show_console` is set.
pub async fn start_daemon(dir: PathBuf, api_url: String, show_console: bool) -> Result<()> {
    info!("Starting daemon in {dir:?} for {api_url}");
    let api = Arc::new(HttpWorkApi::new(api_url)?);

    let shutdown_token = CancellationToken::new();
    let (sender, receiver) = mpsc::channel::<CounterSignal>(10);

    let ticker = create_ticker(api.clone(), api.clone(), DefaultClock, DEFAULT_TICK_PERIOD);
    let status = ticker.subscribe();

    let watcher = create_watcher(
        api,
        FileDedupeStore::new(dir.join(ALERTS_FILE))?,
        create_notifier(&dir, show_console, DefaultClock)?,
        &shutdown_token,
        DefaultClock,
        WatcherSettings::default(),
    );

    let status_path = dir.join(status::STATUS_FILE);

    let (_, signals_result, ticker_result, watcher_result, status_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        signals::forward_signals(sender, shutdown_token.clone()),
        ticker.run(receiver, shutdown_token.clone()),
        watcher.run(),
        status::write_status(&status_path, status, &DefaultClock, shutdown_token.clone()),
    );

    if let Err(signals_result) = signals_result {
        error!("Signal forwarding got an error {:?}", signals_result);
    }

    if let Err(ticker_result) = ticker_result {
        error!("Counter got an error {:?}", ticker_result);
    }

    if let Err(watcher_result) = watcher_result {
        error!("Overwork watcher got an error {:?}", watcher_result);
    }

    if let Err(status_result) = status_result {
        error!("Status writer got an error {:?}", status_result);
    }

    info!("Daemon stopped");
    Ok(())
}

fn create_ticker(
    totals: Arc<dyn WorkTotalsProvider>,
    active_tasks: Arc<dyn ActiveTaskQuery>,
    clock: impl Clock,
    period: Duration,
) -> ElapsedTimeTicker {
    ElapsedTimeTicker::new(totals, active_tasks, Box::new(clock), period)
}

fn create_watcher<S: DedupeStore>(
    totals: Arc<dyn WorkTotalsProvider>,
    store: S,
    notifier: impl Notifier + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
    settings: WatcherSettings,
) -> OverworkWatcher<S> {
    OverworkWatcher::new(
        totals,
        store,
        Box::new(notifier),
        Box::new(clock),
        settings,
        shutdown_token.clone(),
    )
}

#[cfg(test)]
mod daemon_tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::Result;
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        api::{entities::WorkReportTotal, MockActiveTaskQuery, MockWorkTotalsProvider},
        daemon::{
            alert::{create_notifier, inbox_for},
            create_ticker, create_watcher, status,
            storage::dedupe_store::{DedupeStore, FileDedupeStore},
            ticker::CounterSignal,
            watcher::WatcherSettings,
            ALERTS_FILE,
        },
        utils::{clock::TestClock, logging::TEST_LOGGING},
    };

    /// Smoke test wiring the counter, the watcher and the status file together on real time
    /// with shortened periods.
    #[tokio::test]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let test_clock = TestClock::starting_at_local(
            NaiveDate::from_ymd_opt(2023, 12, 12)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
        );

        // 27000 seconds is 93.75% of the day
        let mut totals = MockWorkTotalsProvider::new();
        totals
            .expect_get_total()
            .returning(|_, _| Ok(WorkReportTotal { time: 27000. }));
        let totals = Arc::new(totals);
        let mut active_tasks = MockActiveTaskQuery::new();
        active_tasks.expect_has_active_task().returning(|| Ok(true));
        let dir = tempdir()?;
        let notifier = create_notifier(dir.path(), false, test_clock.clone())?;
        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<CounterSignal>(10);

        let ticker = create_ticker(
            totals.clone(),
            Arc::new(active_tasks),
            test_clock.clone(),
            Duration::from_millis(20),
        );
        let counter = ticker.subscribe();
        let watcher = create_watcher(
            totals,
            FileDedupeStore::new(dir.path().join(ALERTS_FILE))?,
            notifier,
            &shutdown_token,
            test_clock.clone(),
            WatcherSettings {
                interval: Duration::from_millis(50),
                ..Default::default()
            },
        );
        let status_path = dir.path().join(status::STATUS_FILE);

        let (_, ticker_result, watcher_result, status_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                let today = NaiveDate::from_ymd_opt(2023, 12, 12).unwrap();
                assert!(status::read_status(&status_path, today).await.unwrap().is_some());
                sender.send(CounterSignal::Stop).await.unwrap();
                tokio::time::sleep(Duration::from_millis(50)).await;
                shutdown_token.cancel()
            },
            ticker.run(receiver, shutdown_token.clone()),
            watcher.run(),
            status::write_status(&status_path, counter.clone(), &test_clock, shutdown_token.clone()),
        );

        ticker_result?;
        watcher_result?;
        status_result?;

        let state = *counter.borrow();
        assert!(!state.running);
        assert!(state.elapsed_seconds.unwrap() > 27000);

        let store = FileDedupeStore::new(dir.path().join(ALERTS_FILE))?;
        assert_eq!(
            store
                .get("overworkingwatcher-2023-11-12-90")
                .await?
                .as_deref(),
            Some("ok")
        );
        assert!(!status_path.exists());

        let alerts = inbox_for(dir.path())?.take_all().await?;
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("93%"));

        Ok(())
    }
}
