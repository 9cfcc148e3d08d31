// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-module context: the resolved temp directory plus configuration,
// passed explicitly to every component.

use std::path::{Path, PathBuf};

use docviewer_core::error::Result;
use docviewer_core::{FileInfo, ViewerConfig, paths};
use tracing::info;

/// Resolved directories and settings for one viewer module instance.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    temp_dir: PathBuf,
    config: ViewerConfig,
}

impl ModuleContext {
    /// Create `files_dir/<temp_dir_name>` and build the context around it.
    pub fn create(files_dir: &Path, config: ViewerConfig) -> Result<Self> {
        let temp_dir = files_dir.join(&config.temp_dir_name);
        std::fs::create_dir_all(&temp_dir)?;
        info!(path = %temp_dir.display(), "viewer temp directory ready");
        Ok(Self { temp_dir, config })
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Destination path for `info`, or `None` when nothing names a file.
    pub fn resolve_path(&self, info: &FileInfo) -> Option<PathBuf> {
        paths::resolve(&self.temp_dir, info.file_name(), info.file_type(), info.url())
    }
}
