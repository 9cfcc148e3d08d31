// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for DocViewer.

use serde::{Deserialize, Serialize};

use crate::error::DocViewerError;
use crate::mime;

/// Event name host adapters use when forwarding [`Progress`] to the
/// scripting layer as a device event.
pub const PROGRESS_EVENT: &str = "RNDownloaderProgress";

/// One document-open request as sent by the scripting layer.
///
/// Field presence follows scripting truthiness: an empty string counts as
/// absent, which is why the accessors below should be preferred over the
/// raw fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl FileInfo {
    /// Request for a remote document.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Request for an inline base64 payload.
    pub fn inline(
        base64: impl Into<String>,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
    ) -> Self {
        Self {
            base64: Some(base64.into()),
            file_name: Some(file_name.into()),
            file_type: Some(file_type.into()),
            ..Self::default()
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn url(&self) -> Option<&str> {
        present(&self.url)
    }

    pub fn file_name(&self) -> Option<&str> {
        present(&self.file_name)
    }

    pub fn file_type(&self) -> Option<&str> {
        present(&self.file_type)
    }

    pub fn base64(&self) -> Option<&str> {
        present(&self.base64)
    }

    /// Whether an existing file at the resolved path may be reused.
    pub fn cache(&self) -> bool {
        self.cache.unwrap_or(false)
    }
}

/// Download progress notification, serialized as `{"progress": <0..100>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub progress: f64,
}

impl Progress {
    /// Terminal progress value emitted once a transfer has completed.
    pub const COMPLETE: Progress = Progress { progress: 100.0 };

    /// Percentage for `received` of `total` bytes. Returns `None` when the
    /// total is unknown.
    pub fn from_bytes(received: u64, total: Option<u64>) -> Option<Self> {
        let total = total.filter(|t| *t > 0)?;
        Some(Self {
            progress: received as f64 * 100.0 / total as f64,
        })
    }
}

/// Receiver of per-request progress updates.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn emit(&self, progress: Progress) {
        self(progress)
    }
}

/// Sink that drops every update.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _progress: Progress) {}
}

/// What the host previewer needs to show a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInfo {
    /// Display name (the file name).
    pub title: String,
    /// Platform file URI.
    pub uri: String,
    pub mime_type: String,
}

impl PreviewInfo {
    /// Build preview info for a file URI, deriving title and MIME type from
    /// the URI's last segment.
    pub fn from_uri(uri: &str) -> Self {
        let title = file_name_from_uri(uri);
        let mime_type = mime::mime_for_extension(mime::extension_of(&title)).to_owned();
        Self {
            title,
            uri: uri.to_owned(),
            mime_type,
        }
    }
}

/// Extract the (percent-decoded) file name from a file URI.
pub fn file_name_from_uri(uri: &str) -> String {
    if let Ok(parsed) = url::Url::parse(uri) {
        if let Ok(path) = parsed.to_file_path() {
            if let Some(name) = path.file_name() {
                return name.to_string_lossy().into_owned();
            }
        }
    }
    uri.rsplit('/').next().unwrap_or_default().to_owned()
}

/// URI permissions granted to the receiving app of a share request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UriPermissions {
    pub read: bool,
    pub write: bool,
}

impl UriPermissions {
    /// `Intent.FLAG_GRANT_READ_URI_PERMISSION`.
    pub const FLAG_READ: i32 = 0x0000_0001;
    /// `Intent.FLAG_GRANT_WRITE_URI_PERMISSION`.
    pub const FLAG_WRITE: i32 = 0x0000_0002;

    pub fn read_only() -> Self {
        Self {
            read: true,
            write: false,
        }
    }

    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
        }
    }

    /// Platform flag bits for these permissions.
    pub fn flags(&self) -> i32 {
        let mut flags = 0;
        if self.read {
            flags |= Self::FLAG_READ;
        }
        if self.write {
            flags |= Self::FLAG_WRITE;
        }
        flags
    }
}

/// Outcome of a document-open request: the previewed URI or the failure.
pub type OpenOutcome = std::result::Result<String, DocViewerError>;

/// Render an outcome as the `(error, result)` pair older host adapters pass
/// to the scripting callback: `("", uri)` on success, `(message, None)` on
/// failure.
pub fn to_callback_args(outcome: &OpenOutcome) -> (String, Option<String>) {
    match outcome {
        Ok(uri) => (String::new(), Some(uri.clone())),
        Err(e) => (e.to_string(), None),
    }
}
