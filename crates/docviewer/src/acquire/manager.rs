// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Delegated download through the platform download service.

use std::path::Path;

use tracing::{info, warn};

use docviewer_bridge::download::DownloadEvent;
use docviewer_bridge::traits::PlatformBridge;
use docviewer_core::error::{DocViewerError, Result};
use docviewer_core::paths::FileGuard;
use docviewer_core::{PlatformError, Progress, ProgressSink};

use crate::cache;

/// Map a failure to start the download task.
fn start_error(e: PlatformError) -> DocViewerError {
    if e.code == PlatformError::FILE_EXISTS {
        DocViewerError::AlreadyDownloaded
    } else {
        DocViewerError::DownloadTask(e.to_string())
    }
}

/// Download `url` to `dest` with the platform service and wait for the
/// outcome. A destination the service already holds counts as success; on
/// failure, or when the returned future is dropped first, any partial file
/// is removed and the task is released.
pub async fn download(
    bridge: &dyn PlatformBridge,
    url: &str,
    dest: &Path,
    progress: &dyn ProgressSink,
) -> Result<()> {
    let mut task = match bridge.start_download(url, dest).map_err(start_error) {
        Ok(task) => task,
        Err(DocViewerError::AlreadyDownloaded) => {
            info!(path = %dest.display(), "download service already holds file, reusing it");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let written = FileGuard::new(dest);

    loop {
        match task.next_event().await {
            Some(DownloadEvent::Progress { received, total }) => {
                let partial = Progress::from_bytes(received, total).filter(|p| p.progress < 100.0);
                if let Some(p) = partial {
                    progress.emit(p);
                }
            }
            Some(DownloadEvent::Complete) => {
                progress.emit(Progress::COMPLETE);
                written.keep();
                info!(path = %dest.display(), "platform download complete");
                return Ok(());
            }
            Some(DownloadEvent::Fail(reason)) => {
                warn!(url, "platform download failed: {reason}");
                cache::remove_file_if_exists(dest).await;
                return Err(DocViewerError::DownloadFailed(reason));
            }
            None => {
                warn!(url, "download task ended without an outcome");
                cache::remove_file_if_exists(dest).await;
                return Err(DocViewerError::DownloadFailed(
                    "download task ended without completing".into(),
                ));
            }
        }
    }
}
