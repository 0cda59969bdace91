//! Watch command handler
//!
//! Runs a [`NotificationFeed`] against a remote server and prints the inbox
//! whenever it changes. Lines typed on stdin act on the inbox.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::external::ApiNotificationStore;
use crate::services::notifications::{FeedOptions, FeedSnapshot, NotificationFeed};

const RENDER_TICK: Duration = Duration::from_secs(1);

const HELP: &str = "commands: read ID | read-all | approve ID | reject ID [COMMENT] | delete ID | refresh | help | quit";

/// One line of stdin input
#[derive(Debug, PartialEq, Eq)]
enum WatchCommand {
    Read(i64),
    ReadAll,
    Approve(i64),
    Reject(i64, Option<String>),
    Delete(i64),
    Refresh,
    Help,
    Quit,
}

impl WatchCommand {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));

        let id = || -> Result<i64, String> {
            let raw = rest.split_whitespace().next().unwrap_or("");
            raw.parse()
                .map_err(|_| format!("'{}' expects a notification id", verb))
        };

        let command = match verb {
            "read" => Self::Read(id()?),
            "read-all" => Self::ReadAll,
            "approve" => Self::Approve(id()?),
            "reject" => {
                let id = id()?;
                let comment = rest
                    .split_once(char::is_whitespace)
                    .map(|(_, comment)| comment.trim().to_string())
                    .filter(|comment| !comment.is_empty());
                Self::Reject(id, comment)
            }
            "delete" => Self::Delete(id()?),
            "refresh" => Self::Refresh,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{}'", other)),
        };
        Ok(Some(command))
    }
}

pub struct WatchCommandHandler {
    config: Settings,
}

impl WatchCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Runs until `quit`, end of input or Ctrl+C.
    pub async fn execute(&self, api_url: &str, token: &str, user_id: Option<i32>) -> AppResult<()> {
        self.config.notifications.validate()?;

        let store = Arc::new(ApiNotificationStore::new(api_url, token));
        let feed = NotificationFeed::new(
            store,
            user_id,
            FeedOptions::from(&self.config.notifications),
        );
        let sync = feed.start();
        info!(api_url = %api_url, user_id = ?user_id, "Watching notifications");
        println!("{}", HELP);

        let result = self.run_loop(&feed).await;

        feed.stop();
        if let Err(e) = sync.await {
            warn!(error = %e, "Feed task ended abnormally");
        }
        result
    }

    async fn run_loop(&self, feed: &Arc<NotificationFeed>) -> AppResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut tick = tokio::time::interval(RENDER_TICK);
        let mut last_shown: Option<FeedSnapshot> = None;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = line.map_err(|e| AppError::Internal {
                        source: anyhow::anyhow!("Failed to read stdin: {}", e),
                    })?;
                    let Some(line) = line else {
                        return Ok(());
                    };
                    match WatchCommand::parse(&line) {
                        Ok(Some(WatchCommand::Quit)) => return Ok(()),
                        Ok(Some(WatchCommand::Help)) => println!("{}", HELP),
                        Ok(Some(command)) => {
                            if let Err(e) = apply(feed, command).await {
                                println!("! {}", e);
                            }
                        }
                        Ok(None) => {}
                        Err(message) => println!("! {}. {}", message, HELP),
                    }
                }
                _ = tick.tick() => {
                    let snapshot = feed.snapshot().await;
                    if last_shown.as_ref() != Some(&snapshot) {
                        print!("{}", render(&snapshot));
                        last_shown = Some(snapshot);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    return Ok(());
                }
            }
        }
    }
}

async fn apply(feed: &NotificationFeed, command: WatchCommand) -> AppResult<()> {
    match command {
        WatchCommand::Read(id) => {
            feed.mark_read(id).await?;
        }
        WatchCommand::ReadAll => {
            let updated = feed.mark_all_read().await?;
            println!("✓ {} marked read", updated);
        }
        WatchCommand::Approve(id) => {
            let resolution = feed.approve(id).await?;
            println!("✓ #{} {}", resolution.original.id, resolution.original.status);
        }
        WatchCommand::Reject(id, comment) => {
            let resolution = feed.reject(id, comment).await?;
            println!("✓ #{} {}", resolution.original.id, resolution.original.status);
        }
        WatchCommand::Delete(id) => feed.delete(id).await?,
        WatchCommand::Refresh => feed.waker().wake(),
        WatchCommand::Help | WatchCommand::Quit => {}
    }
    Ok(())
}

fn render(snapshot: &FeedSnapshot) -> String {
    let mut out = format!(
        "--- {} notification(s), {} unread",
        snapshot.notifications.len(),
        snapshot.unread_count()
    );
    if let Some(synced) = snapshot.last_synced {
        out.push_str(&format!(", synced {}", synced.format("%H:%M:%S")));
    }
    if snapshot.loading {
        out.push_str(", loading");
    }
    out.push('\n');
    if let Some(error) = &snapshot.error {
        out.push_str(&format!("! {}\n", error));
    }
    for n in &snapshot.notifications {
        let from = n
            .from_user_name
            .as_deref()
            .map(|name| format!(" from {}", name))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:>6} [{:<8}] {}: {}{}\n",
            n.id,
            n.status.as_str(),
            n.kind.as_str(),
            n.title,
            from
        ));
    }
    out
}
