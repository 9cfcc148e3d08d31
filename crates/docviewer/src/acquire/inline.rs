// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Base64 materialisation.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use docviewer_core::error::{DocViewerError, Result};

/// Decode `payload` and write the bytes to `dest`, replacing any previous
/// content. Every failure surfaces as `DocViewerError::Base64Write`.
pub async fn save_base64(payload: &str, dest: &Path) -> Result<()> {
    let bytes = decode(payload).map_err(|e| {
        warn!(path = %dest.display(), "base64 decode failed: {e}");
        DocViewerError::Base64Write(e.to_string())
    })?;

    write_all(dest, &bytes).await.map_err(|e| {
        warn!(path = %dest.display(), "base64 write failed: {e}");
        DocViewerError::Base64Write(e.to_string())
    })?;

    info!(path = %dest.display(), bytes = bytes.len(), "base64 payload written");
    Ok(())
}

/// Standard-alphabet decode, tolerating embedded line breaks and spaces.
fn decode(payload: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    general_purpose::STANDARD.decode(compact)
}

async fn write_all(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}
