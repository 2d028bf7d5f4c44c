//! Tick streaming from a JSON-lines file

use anyhow::Context;
use pairtrade_rs::data::PriceTick;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Reads ticks on a background task and forwards them in file order
pub struct TickStreamer {
    handle: JoinHandle<anyhow::Result<usize>>,
}

impl TickStreamer {
    /// Start streaming `path`; ticks arrive on the returned receiver
    pub fn from_file(path: &Path) -> (Self, mpsc::Receiver<PriceTick>) {
        let (tick_tx, tick_rx) = mpsc::channel(1000);
        let path = path.to_path_buf();
        let handle = tokio::spawn(async move { read_ticks(path, tick_tx).await });
        (Self { handle }, tick_rx)
    }

    /// Wait for the reader, returning how many ticks it sent
    pub async fn finish(self) -> anyhow::Result<usize> {
        self.handle.await.context("Tick reader task panicked")?
    }
}

async fn read_ticks(path: PathBuf, tick_tx: mpsc::Sender<PriceTick>) -> anyhow::Result<usize> {
    let file = tokio::fs::File::open(&path)
        .await
        .with_context(|| format!("Failed to open tick file {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    let mut sent = 0usize;

    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?
    {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let tick: PriceTick = serde_json::from_str(line)
            .with_context(|| format!("Malformed tick on line {line_no} of {}", path.display()))?;
        if tick_tx.send(tick).await.is_err() {
            warn!("Tick receiver dropped, stopping reader");
            break;
        }
        sent += 1;
    }

    info!(ticks = sent, file = %path.display(), "Tick file exhausted");
    Ok(sent)
}
