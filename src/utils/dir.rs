use std::{env, path::PathBuf};

use anyhow::{anyhow, Result};

const APP_DIR_NAME: &str = "timetally";

/// Directory for status, alert and log files. `explicit` comes from `--dir` and wins over the
/// platform default. The directory is created when missing.
pub fn application_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path,
        None => default_application_dir(|name| env::var(name).ok())?,
    };
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// `%APPDATA%\timetally` on windows. `$XDG_STATE_HOME/timetally`, falling back to
/// `$HOME/.local/state/timetally`, everywhere else.
fn default_application_dir(var: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    let base = if cfg!(windows) {
        var("APPDATA")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("APPDATA is not set"))?
    } else {
        var("XDG_STATE_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| var("HOME").map(|home| PathBuf::from(home).join(".local/state")))
            .ok_or_else(|| anyhow!("Neither XDG_STATE_HOME nor HOME is set, pass --dir"))?
    };
    Ok(base.join(APP_DIR_NAME))
}
