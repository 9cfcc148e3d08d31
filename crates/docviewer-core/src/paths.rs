// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deterministic destination paths inside the temp directory.
//
// The resolved path doubles as the cache key: the same inputs always yield
// the same path. Names are used verbatim, and a later write to the same path
// silently replaces the earlier file.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Compute the destination path for a request.
///
/// * `file_name` present: `temp_dir/file_name[.file_type]`.
/// * else `url` present: the URL's last path segment, kept as-is when it
///   already has a dot, otherwise suffixed with `.file_type` when one is
///   given.
/// * else, or when the URL has no usable last segment: `None`.
pub fn resolve(
    temp_dir: &Path,
    file_name: Option<&str>,
    file_type: Option<&str>,
    url: Option<&str>,
) -> Option<PathBuf> {
    let file_type = file_type.filter(|t| !t.is_empty());

    if let Some(name) = file_name.filter(|n| !n.is_empty()) {
        return Some(temp_dir.join(with_type(name, file_type)));
    }

    let segment = url.and_then(last_segment)?;
    if segment.contains('.') {
        Some(temp_dir.join(segment))
    } else {
        Some(temp_dir.join(with_type(&segment, file_type)))
    }
}

fn with_type(name: &str, file_type: Option<&str>) -> String {
    match file_type {
        Some(ext) => format!("{name}.{ext}"),
        None => name.to_owned(),
    }
}

/// Last non-empty path segment of `url`, ignoring query and fragment.
fn last_segment(url: &str) -> Option<String> {
    if let Ok(parsed) = url::Url::parse(url) {
        return parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
    }

    // Not an absolute URL: split the raw string.
    let without_suffix = url.split(['?', '#']).next().unwrap_or_default();
    without_suffix
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// `<dest>.part`: where a download is written before it is complete.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Removes a file when dropped, unless [`FileGuard::keep`] was called.
///
/// Download futures can be dropped at any await point (deadline, aborted
/// task), so cleanup of half-written files is tied to the guard rather than
/// to an error branch.
#[derive(Debug)]
pub struct FileGuard {
    path: PathBuf,
    armed: bool,
}

impl FileGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file is good: leave it in place.
    pub fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed unfinished file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.path.display(), "failed to remove file: {e}"),
        }
    }
}
