// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! DocViewer: native platform bridge abstractions.
//!
//! This crate defines the traits the viewer module uses to reach host
//! services (document preview, share sheet, download service) and the
//! platform dispatch that picks an implementation for the target OS.

pub mod download;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod desktop;

use std::sync::Arc;

use docviewer_core::ViewerConfig;
use docviewer_core::error::Result;

/// Build the bridge implementation for the target operating system.
///
/// RETURNS: a shared trait object so every in-flight request can hold it.
pub fn platform_bridge(config: &ViewerConfig) -> Result<Arc<dyn traits::PlatformBridge>> {
    #[cfg(target_os = "android")]
    {
        // Android: Intents through JNI, downloads over HTTP.
        Ok(Arc::new(android::AndroidBridge::new(config)?))
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: the system opener (`xdg-open`, `open`, `start`).
        Ok(Arc::new(desktop::DesktopBridge::new(config)?))
    }
}
