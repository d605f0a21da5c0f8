use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{interval_at, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    api::{ActiveTaskQuery, WorkTotalsProvider},
    utils::{
        clock::Clock,
        time::{day_range, format_hhmmss},
    },
};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Requests sent by whoever controls current work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSignal {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickerState {
    pub running: bool,
    /// Seconds worked today. Unknown until the backend reports them.
    pub elapsed_seconds: Option<u64>,
}

impl TickerState {
    pub fn display_value(&self) -> String {
        format_hhmmss(self.elapsed_seconds)
    }
}

/// Owned handle of the incrementing task. Dropping it stops the increments.
struct TickHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.token.cancel();
        self.task.abort();
    }
}

/// Counts seconds worked today. The counter is seeded from the backend and then advanced
/// locally once per period while work is active.
pub struct ElapsedTimeTicker {
    state: Arc<watch::Sender<TickerState>>,
    totals: Arc<dyn WorkTotalsProvider>,
    active_tasks: Arc<dyn ActiveTaskQuery>,
    clock: Box<dyn Clock>,
    period: Duration,
    handle: Option<TickHandle>,
}

impl ElapsedTimeTicker {
    pub fn new(
        totals: Arc<dyn WorkTotalsProvider>,
        active_tasks: Arc<dyn ActiveTaskQuery>,
        clock: Box<dyn Clock>,
        period: Duration,
    ) -> Self {
        let (state, _) = watch::channel(TickerState::default());
        Self {
            state: Arc::new(state),
            totals,
            active_tasks,
            clock,
            period,
            handle: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TickerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> TickerState {
        *self.state.borrow()
    }

    pub fn display_value(&self) -> String {
        self.state().display_value()
    }

    /// Loads today's total and starts counting if some task is active. Failures leave the counter
    /// unknown and stopped.
    pub async fn initialize(&mut self) {
        let (start, end) = match day_range(self.clock.local_time()) {
            Ok(range) => range,
            Err(e) => {
                error!("Failed to compute today's range {e:?}");
                return;
            }
        };
        let total = match self.totals.get_total(start, end).await {
            Ok(total) => total,
            Err(e) => {
                error!("Failed to load today's work total {e:?}");
                return;
            }
        };
        debug!("Today's total is {} seconds", total.seconds());
        self.state
            .send_modify(|state| state.elapsed_seconds = Some(total.seconds()));

        match self.active_tasks.has_active_task().await {
            Ok(true) => self.start(),
            Ok(false) => debug!("No active task, counter stays stopped"),
            Err(e) => warn!("Failed to check for an active task, assuming none {e:?}"),
        }
    }

    /// Starts incrementing the counter. Does nothing if it's already running.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            debug!("Counter is already running");
            return;
        }

        let token = CancellationToken::new();
        self.state.send_modify(|state| state.running = true);
        let first_tick = self.clock.instant() + self.period;
        let task = tokio::spawn(increment_every(
            self.state.clone(),
            token.clone(),
            first_tick,
            self.period,
        ));
        self.handle = Some(TickHandle { token, task });
        info!("Counter started");
    }

    /// Stops incrementing the counter. No increments happen after this returns.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // Cancelling under the state lock orders this against in-flight increments.
        self.state.send_modify(|state| {
            state.running = false;
            handle.token.cancel();
        });
        info!("Counter stopped at {}", self.display_value());
    }

    /// Executes the counter event loop until `shutdown` is cancelled.
    pub async fn run(
        mut self,
        mut signals: mpsc::Receiver<CounterSignal>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        self.initialize()
            .instrument(info_span!("Initializing today counter"))
            .await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.stop();
                    return Ok(());
                }
                signal = signals.recv() => match signal {
                    Some(CounterSignal::Start) => self.start(),
                    Some(CounterSignal::Stop) => self.stop(),
                    None => {
                        debug!("Signal channel closed, counting until shutdown");
                        shutdown.cancelled().await;
                        self.stop();
                        return Ok(());
                    }
                }
            }
        }
    }
}

async fn increment_every(
    state: Arc<watch::Sender<TickerState>>,
    token: CancellationToken,
    first_tick: Instant,
    period: Duration,
) {
    let mut interval = interval_at(first_tick, period);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = interval.tick() => {
                state.send_if_modified(|state| {
                    if token.is_cancelled() || !state.running {
                        return false;
                    }
                    state.elapsed_seconds = Some(state.elapsed_seconds.unwrap_or(0) + 1);
                    true
                });
            }
        }
    }
}
