use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{bail, Result};
use sysinfo::{get_current_pid, Pid, Process, ProcessesToUpdate, Signal, System};
use tracing::{info, warn};

/// Finds running daemons. Those are either the daemon executable or the cli running `serve`.
fn find_daemons<'a>(system: &'a System, daemon: &Path, cli: &Path) -> Vec<(&'a Pid, &'a Process)> {
    let Ok(current_id) = get_current_pid() else {
        return vec![];
    };
    system
        .processes()
        .iter()
        .filter(|(pid, _)| **pid != current_id)
        .filter(|(_, process)| !matches!(process.parent(), Some(p) if p == current_id))
        .filter(|(_, process)| match process.exe().filter(|v| v.exists()) {
            Some(exe) if exe == daemon => true,
            Some(exe) if exe == cli => process.cmd().iter().any(|v| v == "serve"),
            _ => false,
        })
        .collect()
}

pub fn kill_previous_servers(daemon: &Path, cli: &Path) {
    let system = System::new_all();
    for (pid, process) in find_daemons(&system, daemon, cli) {
        info!("Stopping daemon {pid}");
        // This will forcefully terminate the process on Windows. Anything better will require a
        // lot more work.
        if process.kill_with(Signal::Term).is_none() {
            process.kill();
        }
        process.wait();
    }
}

/// Sends `signal` to every running daemon. Returns the amount of daemons that got it.
pub fn signal_daemons(daemon: &Path, cli: &Path, signal: Signal) -> usize {
    let system = System::new_all();
    let mut signaled = 0;
    for (pid, process) in find_daemons(&system, daemon, cli) {
        match process.kill_with(signal) {
            Some(true) => signaled += 1,
            Some(false) => warn!("Failed to send {signal:?} to {pid}"),
            None => warn!("{signal:?} is not supported on this platform"),
        }
    }
    signaled
}

/// Whether a process with `pid` still exists. Used to tell a live daemon's files from leftovers.
pub fn is_process_alive(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}

/// Intended for shutting down previous daemons and starting a new one. The daemon executable
/// detaches itself, so this only waits for the detaching part.
pub fn restart_server(daemon: PathBuf, cli: &Path, dir: Option<&Path>, api_url: &str) -> Result<()> {
    kill_previous_servers(&daemon, cli);
    let mut command = std::process::Command::new(&daemon);
    command.args(["--api-url", api_url]);
    if let Some(dir) = dir {
        command.arg("--dir").arg(dir);
    }
    command.stdin(Stdio::null());

    println!("Spawning");
    let status = command.status()?;
    if !status.success() {
        bail!("Daemon {daemon:?} exited with {status}");
    }
    println!("Success");
    Ok(())
}
