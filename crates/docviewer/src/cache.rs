// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Path-keyed cache check. A file at the resolved path is reused as-is; it is
// never revalidated against the remote copy.

use std::path::Path;

use tracing::debug;

/// Result of looking up a resolved path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// A file exists at the path and may be dispatched directly.
    Hit,
    /// Nothing there; the file has to be produced first.
    Miss,
}

/// Check whether anything exists at `path`.
pub async fn check(path: &Path) -> CacheState {
    let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
    debug!(path = %path.display(), exists, "cache lookup");
    if exists { CacheState::Hit } else { CacheState::Miss }
}

/// Delete `path` if present. Failures are ignored.
pub async fn remove_file_if_exists(path: &Path) {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!(path = %path.display(), "failed to remove file: {e}");
        }
    }
}
