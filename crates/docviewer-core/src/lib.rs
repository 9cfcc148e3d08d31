// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocViewer: core types, errors, configuration and the pure resolvers
// (file path and MIME type) shared across all crates.

pub mod config;
pub mod error;
pub mod mime;
pub mod paths;
pub mod types;

pub use config::ViewerConfig;
pub use error::{DocViewerError, ErrorKind, PlatformError};
pub use types::*;
