pub mod daemon_path;
pub mod process;
pub mod report;
pub mod work;

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use daemon_path::to_daemon_path;
use process::{kill_previous_servers, restart_server};
use report::{process_report_command, ReportCommand};
use tracing::{level_filters::LevelFilter, warn};
use work::{process_today_command, process_work_command, DaemonExecutables, WorkCommand};

use crate::{
    api::http::{HttpWorkApi, DEFAULT_API_URL},
    daemon::{alert::inbox_for, start_daemon},
    utils::{
        dir::application_dir,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Timetally", version, long_about = None)]
#[command(about = "Keeps track of today's work and warns about overworking", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long = "api-url",
        global = true,
        env = "TIMETALLY_API_URL",
        default_value = DEFAULT_API_URL,
        help = "Base url of the time tracking api"
    )]
    api_url: String,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {},
    #[command(
        about = "Run a daemon directly in current console. Used for debugging"
    )]
    Serve {},
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Start or stop work on a task")]
    Work {
        #[command(subcommand)]
        command: WorkCommand,
    },
    #[command(about = "Show time worked today")]
    Today {},
    #[command(about = "Show time worked during a range of days")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let app_dir = application_dir(args.dir.clone())?;
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let cli_path = env::current_exe()?;
    let daemon_path = to_daemon_path(cli_path.clone());

    match args.commands {
        Commands::Init {} => restart_server(
            daemon_path,
            &cli_path,
            args.dir.as_deref(),
            &args.api_url,
        ),
        Commands::Stop {} => {
            kill_previous_servers(&daemon_path, &cli_path);
            Ok(())
        }
        Commands::Serve {} => start_daemon(app_dir, args.api_url, true).await,
        Commands::Work { command } => {
            show_pending_alerts(&app_dir).await;
            let api = HttpWorkApi::new(args.api_url)?;
            process_work_command(
                command,
                &api,
                DaemonExecutables {
                    daemon: &daemon_path,
                    cli: &cli_path,
                },
            )
            .await
        }
        Commands::Today {} => {
            show_pending_alerts(&app_dir).await;
            let api = HttpWorkApi::new(args.api_url)?;
            process_today_command(&app_dir, &api).await
        }
        Commands::Report { command } => {
            show_pending_alerts(&app_dir).await;
            let api = HttpWorkApi::new(args.api_url)?;
            process_report_command(command, &api).await
        }
    }
}

/// Prints alerts the daemon raised since the last command. Failing to read them shouldn't stop
/// the command itself.
async fn show_pending_alerts(app_dir: &Path) {
    let alerts = match inbox_for(app_dir) {
        Ok(inbox) => inbox.take_all().await,
        Err(e) => Err(e),
    };
    match alerts {
        Ok(alerts) => {
            for alert in alerts {
                println!("\x07{alert}");
            }
        }
        Err(e) => warn!("Failed to read pending alerts {e:?}"),
    }
}
