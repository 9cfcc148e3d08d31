// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Streamed HTTP download.
//
// Chunks are appended to `<dest>.part` as they arrive and the part file is
// renamed over `dest` only once the body is complete, so a dropped
// connection never leaves a truncated file where the cache would find it.
// The wait for the response head and each body read are bounded by the
// configured read timeout.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use docviewer_core::error::{DocViewerError, Result};
use docviewer_core::paths::{FileGuard, part_path};
use docviewer_core::{Progress, ProgressSink};

/// Turns byte counts into the progress values reported while downloading.
///
/// Intermediate values stay strictly below 100; [`Progress::COMPLETE`] is
/// reported separately once the file is in place.
#[derive(Debug)]
pub struct ProgressTracker {
    total: Option<u64>,
    received: u64,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self { total, received: 0 }
    }

    /// Record `len` more bytes; returns the progress to report, if any.
    pub fn advance(&mut self, len: usize) -> Option<Progress> {
        self.received = self.received.saturating_add(len as u64);
        Progress::from_bytes(self.received, self.total).filter(|p| p.progress < 100.0)
    }

    pub fn received(&self) -> u64 {
        self.received
    }
}

/// GET `url` into `dest`, reporting progress to `progress`. Returns the
/// number of bytes written.
pub async fn download(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    read_timeout: Duration,
    progress: &dyn ProgressSink,
) -> Result<u64> {
    let part = FileGuard::new(part_path(dest));
    info!(url, path = %dest.display(), "streamed download started");

    let bytes = write_body(client, url, part.path(), read_timeout, progress)
        .await
        .inspect_err(|e| warn!(url, "streamed download failed: {e}"))?;
    tokio::fs::rename(part.path(), dest).await?;
    part.keep();

    progress.emit(Progress::COMPLETE);
    info!(path = %dest.display(), bytes, "streamed download complete");
    Ok(bytes)
}

async fn write_body(
    client: &reqwest::Client,
    url: &str,
    part: &Path,
    read_timeout: Duration,
    progress: &dyn ProgressSink,
) -> Result<u64> {
    let read_timed_out = || DocViewerError::TimedOut {
        operation: "HTTP read",
        secs: read_timeout.as_secs(),
    };

    let response = tokio::time::timeout(read_timeout, client.get(url).send())
        .await
        .map_err(|_| read_timed_out())?
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| DocViewerError::Http(e.to_string()))?;

    let mut tracker = ProgressTracker::new(response.content_length());
    let mut file = tokio::fs::File::create(part).await?;
    let mut stream = response.bytes_stream();

    loop {
        let next = tokio::time::timeout(read_timeout, stream.next())
            .await
            .map_err(|_| read_timed_out())?;
        let Some(chunk) = next else { break };
        let chunk = chunk.map_err(|e| DocViewerError::Http(e.to_string()))?;
        file.write_all(&chunk).await?;
        if let Some(p) = tracker.advance(chunk.len()) {
            progress.emit(p);
        }
    }

    file.flush().await?;
    debug!(bytes = tracker.received(), "response body written");
    Ok(tracker.received())
}
