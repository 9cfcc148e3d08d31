// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview and share dispatch.
//
// Bridge calls may block (JNI round trips, process spawns), so they run on
// the blocking pool.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use docviewer_bridge::traits::PlatformBridge;
use docviewer_core::error::{DocViewerError, Result};
use docviewer_core::{PreviewInfo, UriPermissions, file_name_from_uri, mime};

/// Hands local files to the host preview and share services.
#[derive(Clone)]
pub struct Dispatcher {
    bridge: Arc<dyn PlatformBridge>,
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DocViewerError::Bridge(format!("bridge call aborted: {e}")))?
}

impl Dispatcher {
    pub fn new(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self { bridge }
    }

    /// Preview the file at `path`. Returns the file URI on success.
    pub async fn dispatch(&self, path: &Path) -> Result<String> {
        let uri = self
            .bridge
            .file_uri(path)
            .map_err(|e| DocViewerError::Bridge(e.to_string()))?;
        let info = PreviewInfo::from_uri(&uri);

        let bridge = Arc::clone(&self.bridge);
        let preview_uri = uri.clone();
        blocking(move || {
            let capable = bridge.can_preview(&preview_uri).map_err(|e| {
                DocViewerError::CapabilityCheck {
                    code: e.code,
                    message: e.message,
                }
            })?;
            if !capable {
                return Err(DocViewerError::NotPreviewable(preview_uri));
            }
            bridge
                .open_preview(&info)
                .map_err(|e| DocViewerError::PreviewOpen {
                    code: e.code,
                    message: e.message,
                })
        })
        .await
        .inspect_err(|e| warn!(uri = %uri, "preview dispatch failed: {e}"))?;

        info!(uri = %uri, platform = self.bridge.platform_name(), "preview opened");
        Ok(uri)
    }

    /// Offer the file behind `uri` to other apps through the system chooser,
    /// granting read and, when `write` is set, write access.
    pub async fn share(&self, uri: &str, write: bool) -> Result<()> {
        let mime_type = mime::mime_for_name(&file_name_from_uri(uri));
        let permissions = if write {
            UriPermissions::read_write()
        } else {
            UriPermissions::read_only()
        };

        let bridge = Arc::clone(&self.bridge);
        let share_uri = uri.to_owned();
        blocking(move || {
            bridge
                .share_file(&share_uri, mime_type, permissions)
                .map_err(|e| DocViewerError::Share {
                    code: e.code,
                    message: e.message,
                })
        })
        .await?;

        info!(uri, write, "share chooser launched");
        Ok(())
    }
}
