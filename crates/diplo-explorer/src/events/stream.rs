//! JSONL stream reader for user events
//!
//! Reads events from stdin or a file and sends them through a channel.
//! Malformed lines are logged and skipped.

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::UserEvent;

/// Stream reader configuration
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// Read from file instead of stdin
    pub file_path: Option<PathBuf>,
}

impl StreamConfig {
    pub fn stdin() -> Self {
        Self { file_path: None }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
        }
    }
}

/// Parse one line; blank and malformed lines yield `None`
pub fn parse_line(line: &str) -> Option<UserEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<UserEvent>(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, line, "Skipping malformed event");
            None
        }
    }
}

/// Start the event stream reader
///
/// Returns a channel receiver that will receive parsed events. The channel
/// closes when the input ends.
pub fn start_stream(config: StreamConfig) -> mpsc::UnboundedReceiver<UserEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        if let Err(e) = run_stream(config, tx).await {
            error!(error = %e, "Event stream reader failed");
        }
    });

    rx
}

async fn run_stream(config: StreamConfig, tx: mpsc::UnboundedSender<UserEvent>) -> std::io::Result<()> {
    match config.file_path {
        Some(path) => {
            let file = tokio::fs::File::open(&path).await?;
            read_events(BufReader::new(file), tx).await
        }
        None => read_events(BufReader::new(tokio::io::stdin()), tx).await,
    }
}

/// Forward every parseable line until the input ends or the receiver is dropped
pub async fn read_events<R: AsyncBufRead + Unpin>(
    reader: R,
    tx: mpsc::UnboundedSender<UserEvent>,
) -> std::io::Result<()> {
    let mut lines = reader.lines();
    let mut forwarded = 0usize;

    while let Some(line) = lines.next_line().await? {
        let Some(event) = parse_line(&line) else {
            continue;
        };
        if tx.send(event).is_err() {
            // Receiver dropped, stop reading
            break;
        }
        forwarded += 1;
    }

    debug!(count = forwarded, "Event stream ended");
    Ok(())
}
