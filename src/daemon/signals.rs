//! Translates process signals into [CounterSignal]s. `work start` sends SIGUSR1 and
//! `work stop` sends SIGUSR2 to running daemons.

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ticker::CounterSignal;

#[cfg(unix)]
pub async fn forward_signals(
    sender: mpsc::Sender<CounterSignal>,
    shutdown: CancellationToken,
) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::info;

    let mut start = signal(SignalKind::user_defined1())?;
    let mut stop = signal(SignalKind::user_defined2())?;

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            Some(_) = start.recv() => CounterSignal::Start,
            Some(_) = stop.recv() => CounterSignal::Stop,
            else => return Ok(()),
        };
        info!("Received {next:?} request");
        sender.send(next).await?;
    }
}

#[cfg(not(unix))]
pub async fn forward_signals(
    _sender: mpsc::Sender<CounterSignal>,
    shutdown: CancellationToken,
) -> Result<()> {
    tracing::warn!("Work signals are not supported on this platform");
    shutdown.cancelled().await;
    Ok(())
}
