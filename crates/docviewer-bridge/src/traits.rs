// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the host services DocViewer needs.
//
// Every method reports failures as a `PlatformError` (code + message); the
// viewer module turns those into the user-facing `DocViewerError` variants.

use std::path::Path;

use docviewer_core::{PlatformError, PreviewInfo, UriPermissions};

use crate::download::DownloadTask;

/// Result type for bridge calls.
pub type BridgeResult<T> = std::result::Result<T, PlatformError>;

/// Unified bridge that groups all native capabilities.
pub trait PlatformBridge: NativePreview + NativeShare + NativeDownload + Send + Sync {
    /// Human-readable platform name (e.g. "Android", "Desktop (linux)").
    fn platform_name(&self) -> &str;

    /// Convert a local path into the URI form the platform's preview and
    /// share services accept.
    fn file_uri(&self, path: &Path) -> BridgeResult<String> {
        url::Url::from_file_path(path).map(String::from).map_err(|()| {
            PlatformError::bridge(format!("not an absolute path: {}", path.display()))
        })
    }
}

/// In-place document preview.
pub trait NativePreview {
    /// Whether the platform can preview the file behind `uri`.
    fn can_preview(&self, uri: &str) -> BridgeResult<bool>;

    /// Present the preview. Returns once the previewer has been launched.
    fn open_preview(&self, info: &PreviewInfo) -> BridgeResult<()>;
}

/// Share a file with another app through the system chooser.
pub trait NativeShare {
    /// Launch the chooser for `uri`, granting the receiving app `permissions`.
    fn share_file(&self, uri: &str, mime_type: &str, permissions: UriPermissions)
    -> BridgeResult<()>;
}

/// Platform download service.
pub trait NativeDownload {
    /// Start downloading `url` into `dest`. Events arrive on the returned
    /// task. Fails with `PlatformError::FILE_EXISTS` when `dest` is taken.
    fn start_download(&self, url: &str, dest: &Path) -> BridgeResult<DownloadTask>;
}
