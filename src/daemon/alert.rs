use std::{io::Write, path::Path};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, warn};

use crate::utils::clock::Clock;

use super::storage::alert_inbox::{AlertInbox, PendingAlert};

pub const INBOX_FILE: &str = "inbox.jsonl";

/// Shows alerts to the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Rings the terminal bell and prints the alert. Only useful when the daemon runs in a console.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "\x07{message}")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Leaves the alert in the inbox, the next cli command shows it.
pub struct InboxNotifier {
    inbox: AlertInbox,
    clock: Box<dyn Clock>,
}

impl InboxNotifier {
    pub fn new(inbox: AlertInbox, clock: Box<dyn Clock>) -> Self {
        Self { inbox, clock }
    }
}

#[async_trait]
impl Notifier for InboxNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.inbox
            .push(&PendingAlert::new(self.clock.time(), message))
            .await
    }
}

/// Logs the alert and hands it to every notifier. Fails only when none of them delivered it.
pub struct AlertFanout {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl AlertFanout {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl Notifier for AlertFanout {
    async fn notify(&self, message: &str) -> Result<()> {
        warn!("{message}");
        let mut delivered = false;
        let mut last_error = None;
        for notifier in &self.notifiers {
            match notifier.notify(message).await {
                Ok(()) => delivered = true,
                Err(e) => {
                    error!("Failed to deliver an alert {e:?}");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if !delivered => Err(e),
            _ => Ok(()),
        }
    }
}

/// Notifier used by the daemon. Alerts always land in the inbox inside `dir`, and are also
/// printed when the daemon owns a console.
pub fn create_notifier(
    dir: &Path,
    show_console: bool,
    clock: impl Clock,
) -> Result<AlertFanout> {
    let inbox = inbox_for(dir)?;
    let mut notifiers: Vec<Box<dyn Notifier>> =
        vec![Box::new(InboxNotifier::new(inbox, Box::new(clock)))];
    if show_console {
        notifiers.push(Box::new(ConsoleNotifier));
    }
    Ok(AlertFanout::new(notifiers))
}

/// Inbox the daemon running for `dir` leaves its alerts in.
pub fn inbox_for(dir: &Path) -> Result<AlertInbox> {
    Ok(AlertInbox::new(dir.join(INBOX_FILE))?)
}
