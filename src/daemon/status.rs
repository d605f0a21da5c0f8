use std::{io::ErrorKind, path::Path};

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::utils::clock::Clock;

use super::ticker::TickerState;

pub const STATUS_FILE: &str = "today";

/// Counter as last written by a daemon. `date` and `pid` let readers detect files left behind by
/// a daemon that died or wasn't updated since yesterday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub date: NaiveDate,
    pub pid: u32,
    pub counter: String,
}

/// Mirrors the counter into a file whenever it changes, so the cli can show it. The file is
/// removed on shutdown.
pub async fn write_status(
    path: &Path,
    mut receiver: watch::Receiver<TickerState>,
    clock: &dyn Clock,
    shutdown: CancellationToken,
) -> Result<()> {
    let pid = std::process::id();
    loop {
        let status = DaemonStatus {
            date: clock.local_time().date_naive(),
            pid,
            counter: receiver.borrow_and_update().display_value(),
        };
        if let Err(e) = store_status(path, &status).await {
            warn!("Failed to update status file {path:?}: {e}");
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = receiver.changed() => {
                if changed.is_err() {
                    debug!("Counter is gone, stopping status updates");
                    shutdown.cancelled().await;
                    break;
                }
            }
        }
    }

    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn store_status(path: &Path, status: &DaemonStatus) -> Result<()> {
    let mut buffer = serde_json::to_vec(status)?;
    buffer.push(b'\n');
    tokio::fs::write(path, buffer).await?;
    Ok(())
}

/// Reads the status written by a daemon. Files written on another day and files that can't be
/// parsed are ignored.
pub async fn read_status(path: &Path, today: NaiveDate) -> Result<Option<DaemonStatus>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(v) => v,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str::<DaemonStatus>(content.trim()) {
        Ok(status) if status.date == today => Ok(Some(status)),
        Ok(status) => {
            debug!("Ignoring status from {}", status.date);
            Ok(None)
        }
        Err(e) => {
            warn!("Ignoring unreadable status file {path:?}: {e}");
            Ok(None)
        }
    }
}
