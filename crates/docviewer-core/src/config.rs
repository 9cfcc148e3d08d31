// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Module configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Name of the optional config file inside the files directory.
pub const CONFIG_FILE: &str = "docviewer.json";

/// Settings for the document viewer module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory (under the files directory) that holds fetched documents.
    pub temp_dir_name: String,
    /// HTTP connect timeout, seconds.
    pub connect_timeout_secs: u64,
    /// Maximum silence between two body reads, seconds.
    pub read_timeout_secs: u64,
    /// Deadline for a whole request, acquisition and dispatch included.
    pub operation_timeout_secs: u64,
    /// Whether share requests grant write permission unless told otherwise.
    pub share_write_default: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            temp_dir_name: "docViewerTemp".into(),
            connect_timeout_secs: 60,
            read_timeout_secs: 60,
            operation_timeout_secs: 300,
            share_write_default: true,
        }
    }
}

impl ViewerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Read `docviewer.json` from `files_dir`, or return defaults if absent.
    pub fn load(files_dir: &Path) -> Result<Self> {
        let path = files_dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Like [`ViewerConfig::load`] but never fails: a broken file is logged
    /// and replaced by defaults.
    pub fn load_or_default(files_dir: &Path) -> Self {
        Self::load(files_dir).unwrap_or_else(|e| {
            warn!("failed to load {CONFIG_FILE}: {e}");
            Self::default()
        })
    }
}

/// Default files directory for desktop hosts, created if needed.
///
/// Mobile hosts pass the application's own files directory instead.
pub fn default_files_dir() -> PathBuf {
    let dir = data_home().join("docviewer");
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn data_home() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}
