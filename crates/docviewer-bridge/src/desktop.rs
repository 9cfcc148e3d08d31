// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge for Linux, macOS and Windows hosts.
//
// "Preview" hands the file to the system opener (`xdg-open`, `open`,
// `cmd /C start`), which launches whatever viewer the user has associated
// with the type. Desktops have no share sheet, so sharing reports
// `UNSUPPORTED`. Downloads go through the HTTP download service.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use docviewer_core::{PlatformError, PreviewInfo, UriPermissions, ViewerConfig};
use docviewer_core::error::Result;

use crate::download::{DownloadTask, HttpDownloadService};
use crate::traits::*;

/// Bridge backed by the desktop's default-application opener.
pub struct DesktopBridge {
    name: String,
    downloads: HttpDownloadService,
}

impl DesktopBridge {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let downloads = HttpDownloadService::new(config)
            .map_err(|e| docviewer_core::DocViewerError::Bridge(e.to_string()))?;
        Ok(Self {
            name: format!("Desktop ({})", std::env::consts::OS),
            downloads,
        })
    }
}

/// Program and leading arguments of the system opener.
fn opener() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[][..])
    } else if cfg!(target_os = "windows") {
        ("cmd", &["/C", "start", ""][..])
    } else {
        ("xdg-open", &[][..])
    }
}

/// Whether `program` resolves to a file somewhere on `PATH`.
fn on_path(program: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(program);
        candidate.is_file() || candidate.with_extension("exe").is_file()
    })
}

/// Spawn `command` detached from our stdio. A helper thread waits on the
/// child so it is reaped once the opener exits.
fn launch(mut command: Command) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(std::thread::spawn(move || match child.wait() {
        Ok(status) => {
            tracing::debug!(%status, "system opener exited");
            Some(status)
        }
        Err(e) => {
            tracing::warn!("failed to wait for system opener: {e}");
            None
        }
    }))
}

/// Local path behind a `file://` URI.
fn local_path(uri: &str) -> BridgeResult<PathBuf> {
    url::Url::parse(uri)
        .ok()
        .and_then(|u| u.to_file_path().ok())
        .ok_or_else(|| PlatformError::new(401, format!("not a file uri: {uri}")))
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        &self.name
    }
}

impl NativePreview for DesktopBridge {
    fn can_preview(&self, uri: &str) -> BridgeResult<bool> {
        let path = local_path(uri)?;
        if !path.is_file() {
            return Err(PlatformError::new(
                13_900_002,
                format!("no such file: {}", path.display()),
            ));
        }
        let (program, _) = opener();
        Ok(on_path(program))
    }

    fn open_preview(&self, info: &PreviewInfo) -> BridgeResult<()> {
        let path = local_path(&info.uri)?;
        let (program, args) = opener();

        tracing::info!(
            path = %path.display(),
            mime = %info.mime_type,
            opener = program,
            "Desktop: launching system opener"
        );

        let mut command = Command::new(program);
        command.args(args).arg(&path);
        launch(command)
            .map(|_reaper| ())
            .map_err(|e| PlatformError::bridge(format!("failed to launch {program}: {e}")))
    }
}

impl NativeShare for DesktopBridge {
    fn share_file(
        &self,
        uri: &str,
        _mime_type: &str,
        _permissions: UriPermissions,
    ) -> BridgeResult<()> {
        tracing::warn!(uri, "NativeShare::share_file called on desktop bridge");
        Err(PlatformError::unsupported("share"))
    }
}

impl NativeDownload for DesktopBridge {
    fn start_download(&self, url: &str, dest: &Path) -> BridgeResult<DownloadTask> {
        self.downloads.start(url, dest)
    }
}
