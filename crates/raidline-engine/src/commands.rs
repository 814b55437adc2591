//! Scorer commands from a line-oriented JSON stream.
//!
//! Each non-empty line is one [`ScorerCommand`], e.g.
//! `{"command":"resolve_raid","action":{...}}`. Lines that fail to parse
//! are logged and skipped. The channel closes when the stream ends, which
//! stops the match loop.

use raidline_core::engine::ScorerCommand;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Result<ScorerCommand, serde_json::Error>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed))
}

/// Forward every command read from `input` into `commands`.
///
/// Returns the number of commands forwarded.
pub async fn forward_commands<R>(input: R, commands: mpsc::Sender<ScorerCommand>) -> u64
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut forwarded: u64 = 0;
    let mut line_no: u64 = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read command input");
                break;
            }
        };
        line_no = line_no.saturating_add(1);

        match parse_line(&line) {
            None => {}
            Some(Ok(command)) => {
                debug!(line = line_no, command = command.name(), "Command received");
                if commands.send(command).await.is_err() {
                    // Match loop has stopped.
                    break;
                }
                forwarded = forwarded.saturating_add(1);
            }
            Some(Err(e)) => {
                warn!(line = line_no, error = %e, "Failed to parse scorer command");
            }
        }
    }

    info!(forwarded, "Command input closed");
    forwarded
}
