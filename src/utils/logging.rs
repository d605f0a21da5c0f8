use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

pub const CLI_PREFIX: &str = "cli";
pub const DAEMON_PREFIX: &str = "daemon";

const LOGS_DIR: &str = "logs";
const KEPT_LOG_FILES: usize = 5;

/// Installs the global subscriber. Logs always go into daily rotated files inside
/// `app_dir/logs`, stdout is only used when `show_std` is set.
pub fn enable_logging(
    prefix: &str,
    app_dir: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(KEPT_LOG_FILES)
        .filename_prefix(prefix)
        .build(app_dir.join(LOGS_DIR))?;

    let stdout = std::io::stdout.with_filter(move |_| show_std);
    let directive = filter_directive(log_level, std::env::var("RUST_LOG").ok());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&directive)?)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .pretty()
        .init();
    Ok(())
}

/// Only this crate's events are kept. An explicit level wins over `RUST_LOG`, which may hold
/// either a bare level or full directives.
fn filter_directive(log_level: Option<LevelFilter>, rust_log: Option<String>) -> String {
    let krate = env!("CARGO_PKG_NAME").replace('-', "_");
    match (log_level, rust_log) {
        (Some(level), _) => format!("{krate}={level}"),
        (None, Some(env)) if env.contains('=') => env,
        (None, Some(env)) if !env.trim().is_empty() => format!("{krate}={}", env.trim()),
        _ => format!("{krate}=info"),
    }
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
