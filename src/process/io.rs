//! Stderr handling for the CLI subprocess.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStderr;
use tokio::task::JoinHandle;

use crate::{Error, Result};

/// Reads the CLI's stderr line by line.
///
/// Stderr carries diagnostics only; protocol records always arrive on stdout.
pub struct StderrReader {
    reader: BufReader<ChildStderr>,
}

impl StderrReader {
    pub fn new(stderr: ChildStderr) -> Self {
        Self {
            reader: BufReader::new(stderr),
        }
    }

    /// Read the next line, without its trailing newline.
    ///
    /// Returns `Ok(None)` once the CLI closes stderr.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line).await.map_err(Error::io)?;
        if bytes == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Forward every line to a `debug` event until stderr closes.
    pub fn spawn_log_forwarder(mut self, pid: Option<u32>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.read_line().await {
                    Ok(Some(line)) if line.is_empty() => {}
                    Ok(Some(line)) => tracing::debug!(target: "claudekit::cli", pid = ?pid, "{line}"),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(pid = ?pid, "stderr read failed: {e}");
                        break;
                    }
                }
            }
        })
    }
}
