use std::{io::ErrorKind, path::PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use fs4::tokio::AsyncFileExt;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::warn;

/// Alert waiting to be shown by the cli.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAlert {
    pub moment: DateTime<Utc>,
    pub message: String,
}

impl PendingAlert {
    pub fn new(moment: DateTime<Utc>, message: &str) -> Self {
        Self {
            moment,
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for PendingAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.moment.with_timezone(&Local).format("%H:%M"),
            self.message
        )
    }
}

/// Append-only file of alerts, one json object per line. The daemon pushes, the cli takes
/// everything and empties the file.
pub struct AlertInbox {
    path: PathBuf,
}

impl AlertInbox {
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub async fn push(&self, alert: &PendingAlert) -> Result<()> {
        let mut line = serde_json::to_vec(alert)?;
        line.push(b'\n');

        let mut file = File::options()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.lock_exclusive()?;
        let result = async {
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;
        file.unlock_async().await?;
        Ok(result?)
    }

    /// Returns every pending alert, oldest first, and clears the inbox.
    pub async fn take_all(&self) -> Result<Vec<PendingAlert>> {
        let mut file = match File::options().read(true).write(true).open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => Err(e)?,
        };
        file.lock_exclusive()?;
        let result = async {
            let mut content = String::new();
            file.read_to_string(&mut content).await?;
            file.set_len(0).await?;
            anyhow::Ok(content)
        }
        .await;
        file.unlock_async().await?;

        Ok(result?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(alert) => Some(alert),
                Err(e) => {
                    warn!("Skipping unreadable alert {line:?}: {e}");
                    None
                }
            })
            .collect())
    }
}
