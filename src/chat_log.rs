//! Append-only plain-text log of chat exchanges.
//!
//! Each exchange becomes `User: ...`, `AI: ...` and a blank line. The file
//! is opened and closed per call. Write failures are logged and swallowed
//! so a chat reply never fails because of the log.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one exchange. Best-effort: errors only produce a warning.
    pub async fn record(&self, user_text: &str, ai_text: &str) {
        let mut file = match fs::OpenOptions::new().create(true).append(true).open(&self.path).await {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to open chat log {}: {e}", self.path.display());
                return;
            }
        };

        let entry = format!("User: {user_text}\nAI: {ai_text}\n\n");
        // tokio hands writes to a background task; flush so the block is on disk on return.
        let written = match file.write_all(entry.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!("Failed to write chat log entry: {e}");
        } else {
            debug!("Saved exchange to {}", self.path.display());
        }
    }
}
