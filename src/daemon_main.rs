// Without a console window on windows. Comment out to see stdout while developing.
#![windows_subsystem = "windows"]

use anyhow::Result;
use clap::Parser;
use timetally::{
    daemon::{args::DaemonArgs, start_daemon},
    utils::{
        dir::application_dir,
        logging::{enable_logging, DAEMON_PREFIX},
    },
};

fn main() -> Result<()> {
    let command_args = std::env::args().collect::<Vec<_>>();
    let args = DaemonArgs::parse_from(&command_args);

    if !args.force && detach(command_args)? {
        return Ok(());
    }

    let app_dir = application_dir(args.dir.clone())?;
    enable_logging(DAEMON_PREFIX, &app_dir, args.log, args.log_console)?;

    let show_console = args.show_console();
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(start_daemon(app_dir, args.api_url, show_console))
}

/// Moves the daemon away from the terminal. Returns `true` in the process that should exit.
#[cfg(all(windows, feature = "win"))]
fn detach(mut command_args: Vec<String>) -> Result<bool> {
    use std::os::windows::process::CommandExt;
    use std::process::{Command, Stdio};
    use windows::Win32::System::Threading::DETACHED_PROCESS;

    command_args.push("--force".into());
    let mut command = Command::new(std::env::current_exe()?);
    command
        .args(command_args.into_iter().skip(1))
        .creation_flags(DETACHED_PROCESS.0)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[allow(clippy::zombie_processes)]
    command.spawn()?;
    println!("Started timetally daemon");
    Ok(true)
}

/// Moves the daemon away from the terminal. Returns `true` in the process that should exit.
#[cfg(unix)]
fn detach(_command_args: Vec<String>) -> Result<bool> {
    use daemonize::{Daemonize, Outcome, Stdio};

    match Daemonize::new()
        .stdout(Stdio::devnull())
        .stderr(Stdio::devnull())
        .execute()
    {
        Outcome::Parent(parent) => {
            parent?;
            println!("Started timetally daemon, alerts are shown by the next timetally command");
            Ok(true)
        }
        Outcome::Child(child) => {
            child?;
            Ok(false)
        }
    }
}

#[cfg(not(any(unix, all(windows, feature = "win"))))]
fn detach(_command_args: Vec<String>) -> Result<bool> {
    Ok(false)
}
