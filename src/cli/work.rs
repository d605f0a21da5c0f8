use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use sysinfo::Signal;
use tracing::{debug, info};

use crate::{
    api::http::HttpWorkApi,
    daemon::status::{read_status, DaemonStatus, STATUS_FILE},
    utils::time::{day_range, format_hhmmss},
};

use super::process::{is_process_alive, signal_daemons};

#[derive(Subcommand, Debug)]
pub enum WorkCommand {
    #[command(about = "Start working on a task")]
    Start {
        #[arg(help = "Id of the task")]
        task_id: i64,
    },
    #[command(about = "Stop working on the current task")]
    Stop,
}

/// Executables that can be running a daemon.
pub struct DaemonExecutables<'a> {
    pub daemon: &'a Path,
    pub cli: &'a Path,
}

/// Changes current work on the backend and lets running daemons know about it.
pub async fn process_work_command(
    command: WorkCommand,
    api: &HttpWorkApi,
    executables: DaemonExecutables<'_>,
) -> Result<()> {
    let signal = match command {
        WorkCommand::Start { task_id } => {
            api.start_work(task_id).await?;
            println!("Started working on task {task_id}");
            Signal::User1
        }
        WorkCommand::Stop => {
            api.stop_current_work().await?;
            println!("Stopped working");
            Signal::User2
        }
    };

    let signaled = signal_daemons(executables.daemon, executables.cli, signal);
    info!("Notified {signaled} daemons");
    Ok(())
}

/// Prints the counter of a running daemon, or asks the backend when no daemon is running.
pub async fn process_today_command(dir: &Path, api: &HttpWorkApi) -> Result<()> {
    let today = Local::now().date_naive();
    if let Some(status) = live_status(dir, today, is_process_alive).await? {
        println!("{}", status.counter);
        return Ok(());
    }

    let (start, end) = day_range(Local::now())?;
    let total = api.report_total(start, end).await?;
    println!("{}", format_hhmmss(Some(total.seconds())));
    Ok(())
}

/// Today's status of a daemon that is still running. Files of crashed daemons are skipped.
async fn live_status(
    dir: &Path,
    today: NaiveDate,
    is_alive: impl Fn(u32) -> bool,
) -> Result<Option<DaemonStatus>> {
    Ok(read_status(&dir.join(STATUS_FILE), today)
        .await?
        .filter(|status| {
            let alive = is_alive(status.pid);
            if !alive {
                debug!("Daemon {} is gone, ignoring its status", status.pid);
            }
            alive
        }))
}
