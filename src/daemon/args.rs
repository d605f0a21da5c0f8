use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::api::http::DEFAULT_API_URL;

/// Arguments of the `timetally-daemon` binary. The cli passes `--dir` and `--api-url` through
/// when it spawns the daemon.
#[derive(Parser, Debug)]
#[command(name = "timetally-daemon", version, about = "Counts today's work and warns about overworking")]
pub struct DaemonArgs {
    /// Stay attached to the current process instead of detaching.
    #[arg(long)]
    pub force: bool,
    #[arg(long, help = "Application directory for status, alert and log files")]
    pub dir: Option<PathBuf>,
    #[arg(long = "api-url", env = "TIMETALLY_API_URL", default_value = DEFAULT_API_URL, help = "Base url of the time tracking api")]
    pub api_url: String,
    /// Mirror logs and alerts to the console. Only useful together with `--force`.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}

impl DaemonArgs {
    /// Alerts can only be printed when the daemon keeps its console.
    pub fn show_console(&self) -> bool {
        self.force && self.log_console
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use tracing::level_filters::LevelFilter;

    use super::DaemonArgs;

    #[test]
    fn test_arguments_passed_by_cli() {
        let args = DaemonArgs::parse_from([
            "timetally-daemon",
            "--dir",
            "/tmp/timetally",
            "--api-url",
            "http://tracker:9000/api",
        ]);

        assert!(!args.force);
        assert_eq!(args.dir, Some(PathBuf::from("/tmp/timetally")));
        assert_eq!(args.api_url, "http://tracker:9000/api");
        assert!(!args.show_console());
    }

    #[test]
    fn test_console_needs_attached_daemon() {
        let detached = DaemonArgs::parse_from(["timetally-daemon", "--log-console"]);
        assert!(!detached.show_console());

        let attached = DaemonArgs::parse_from([
            "timetally-daemon",
            "--force",
            "--log-console",
            "--log-filter",
            "debug",
        ]);
        assert!(attached.show_console());
        assert_eq!(attached.log, Some(LevelFilter::DEBUG));
    }
}
