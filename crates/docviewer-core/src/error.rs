// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for DocViewer.
//
// The `Display` text of each variant is the message handed to the scripting
// layer through the completion callback, so wording is part of the contract.

use thiserror::Error;

/// Top-level error type for all DocViewer operations.
#[derive(Debug, Error)]
pub enum DocViewerError {
    // -- Validation --
    /// A required `FileInfo` field was missing. Holds the documented list,
    /// e.g. `"url,fileName,fileType"`.
    #[error("Requires parameters: {0}")]
    MissingParameters(&'static str),

    #[error("unable to resolve a local file path for the request")]
    NoFilePath,

    // -- Acquisition --
    /// Decoding or writing a base64 payload failed. The detail is only logged.
    #[error("openDocb64 execute failed")]
    Base64Write(String),

    #[error("HTTP download failed: {0}")]
    Http(String),

    #[error("download fail:{0}")]
    DownloadFailed(String),

    #[error("Invoke catch downloadTask failed:{0}")]
    DownloadTask(String),

    /// The download service already holds a file at the destination path.
    #[error("download target already exists")]
    AlreadyDownloaded,

    // -- Dispatch --
    #[error(
        "Failed to obtain the result of whether it can be previewed, err.code = {code}, err.message = {message}"
    )]
    CapabilityCheck { code: i32, message: String },

    #[error("file cannot be previewed: {0}")]
    NotPreviewable(String),

    #[error("Failed to open preview, err.code = {code}, err.message = {message}")]
    PreviewOpen { code: i32, message: String },

    #[error("share startAbility err: err.code = {code}, err.message = {message}")]
    Share { code: i32, message: String },

    // -- Deadline --
    #[error("{operation} timed out after {secs}s")]
    TimedOut { operation: &'static str, secs: u64 },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    #[error("native DocViewer module is not available")]
    ModuleUnavailable,
}

/// Coarse error classes, used for log levels and by host adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request; nothing was attempted.
    Validation,
    /// Producing the local file failed.
    Acquisition,
    /// Handing the file to the host previewer failed.
    Dispatch,
    /// The overall or per-read deadline elapsed.
    Timeout,
    /// The host platform lacks the capability or the bridge broke.
    Platform,
}

impl DocViewerError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameters(_) | Self::NoFilePath => ErrorKind::Validation,
            Self::Base64Write(_)
            | Self::Http(_)
            | Self::DownloadFailed(_)
            | Self::DownloadTask(_)
            | Self::AlreadyDownloaded
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Acquisition,
            Self::CapabilityCheck { .. }
            | Self::NotPreviewable(_)
            | Self::PreviewOpen { .. }
            | Self::Share { .. } => ErrorKind::Dispatch,
            Self::TimedOut { .. } => ErrorKind::Timeout,
            Self::Bridge(_) | Self::PlatformUnavailable | Self::ModuleUnavailable => {
                ErrorKind::Platform
            }
        }
    }
}

/// Failure reported by a host platform service: a numeric code plus message,
/// the shape every native preview/share/download API reports errors in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("err.code = {code}, err.message = {message}")]
pub struct PlatformError {
    pub code: i32,
    pub message: String,
}

impl PlatformError {
    /// Capability not supported on this device.
    pub const UNSUPPORTED: i32 = 801;
    /// Download service: a file already exists at the destination path.
    pub const FILE_EXISTS: i32 = 13_400_002;
    /// Generic bridge failure (JNI call failed, process spawn failed, ...).
    pub const BRIDGE: i32 = -1;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unsupported(what: &str) -> Self {
        Self::new(Self::UNSUPPORTED, format!("{what} is not supported on this platform"))
    }

    pub fn bridge(message: impl Into<String>) -> Self {
        Self::new(Self::BRIDGE, message)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocViewerError>;
