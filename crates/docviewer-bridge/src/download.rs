// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Task-based download service.
//
// Mirrors the shape of a platform download manager: `start` hands back a
// task, and the caller subscribes to `Progress`, `Complete` and `Fail`
// events. The HTTP implementation here backs the desktop and Android
// bridges. The body goes to `<dest>.part` and is renamed over `dest` once
// complete; dropping the task aborts the transfer and removes the part file.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use docviewer_core::paths::{FileGuard, part_path};
use docviewer_core::{PlatformError, ViewerConfig};

use crate::traits::BridgeResult;

/// Event emitted by a running download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    /// Bytes received so far and the total, when the server announced one.
    Progress { received: u64, total: Option<u64> },
    /// The file is fully written at the destination.
    Complete,
    /// The download stopped; the destination may hold a partial file.
    Fail(String),
}

/// Sending half handed to whatever drives a download.
pub type DownloadEventSender = mpsc::UnboundedSender<DownloadEvent>;

/// Handle to a started download. Dropping it aborts the driver, if one
/// was attached.
#[derive(Debug)]
pub struct DownloadTask {
    events: mpsc::UnboundedReceiver<DownloadEvent>,
    driver: Option<JoinHandle<()>>,
}

impl DownloadTask {
    /// Create a task together with the sender that feeds it.
    pub fn channel() -> (DownloadEventSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                events: rx,
                driver: None,
            },
        )
    }

    /// Tie the lifetime of the spawned transfer to this handle.
    pub fn with_driver(mut self, driver: JoinHandle<()>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Wait for the next event. `None` means the driver went away without
    /// reporting an outcome.
    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }
}

impl Drop for DownloadTask {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

/// HTTP-backed download service.
#[derive(Debug, Clone)]
pub struct HttpDownloadService {
    client: reqwest::Client,
    read_timeout: Duration,
}

impl HttpDownloadService {
    pub fn new(config: &ViewerConfig) -> BridgeResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| PlatformError::bridge(format!("HTTP client init failed: {e}")))?;
        Ok(Self {
            client,
            read_timeout: config.read_timeout(),
        })
    }

    /// Start a download of `url` into `dest` on the current tokio runtime.
    pub fn start(&self, url: &str, dest: &Path) -> BridgeResult<DownloadTask> {
        if dest.exists() {
            return Err(PlatformError::new(
                PlatformError::FILE_EXISTS,
                format!("file already exists: {}", dest.display()),
            ));
        }
        let url = reqwest::Url::parse(url)
            .map_err(|e| PlatformError::new(401, format!("invalid url {url}: {e}")))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlatformError::bridge(format!("no async runtime: {e}")))?;

        let (tx, task) = DownloadTask::channel();
        let client = self.client.clone();
        let read_timeout = self.read_timeout;
        let dest = dest.to_path_buf();

        info!(url = %url, path = %dest.display(), "download task started");
        let driver = runtime.spawn(async move {
            match fetch(&client, url, &dest, read_timeout, &tx).await {
                Ok(bytes) => {
                    debug!(bytes, path = %dest.display(), "download task complete");
                    let _ = tx.send(DownloadEvent::Complete);
                }
                Err(reason) => {
                    warn!(path = %dest.display(), "download task failed: {reason}");
                    let _ = tx.send(DownloadEvent::Fail(reason));
                }
            }
        });
        Ok(task.with_driver(driver))
    }
}

async fn fetch(
    client: &reqwest::Client,
    url: reqwest::Url,
    dest: &Path,
    read_timeout: Duration,
    tx: &DownloadEventSender,
) -> Result<u64, String> {
    let silent = || format!("no data for {}s", read_timeout.as_secs());

    let response = tokio::time::timeout(read_timeout, client.get(url).send())
        .await
        .map_err(|_| silent())?
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| e.to_string())?;
    let total = response.content_length();

    let part = FileGuard::new(part_path(dest));
    let mut file = tokio::fs::File::create(part.path())
        .await
        .map_err(|e| format!("create {}: {e}", part.path().display()))?;

    let mut received = 0u64;
    let mut stream = response.bytes_stream();
    loop {
        let next = tokio::time::timeout(read_timeout, stream.next())
            .await
            .map_err(|_| silent())?;
        let Some(chunk) = next else { break };
        let chunk = chunk.map_err(|e| e.to_string())?;
        file.write_all(&chunk)
            .await
            .map_err(|e| format!("write {}: {e}", part.path().display()))?;
        received += chunk.len() as u64;
        let _ = tx.send(DownloadEvent::Progress { received, total });
    }
    file.flush().await.map_err(|e| e.to_string())?;
    drop(file);

    tokio::fs::rename(part.path(), dest)
        .await
        .map_err(|e| format!("rename into {}: {e}", dest.display()))?;
    part.keep();
    Ok(received)
}
