// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles: a recording platform bridge, a progress recorder and a tiny
// HTTP server.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use docviewer_bridge::download::{
    DownloadEvent, DownloadEventSender, DownloadTask, HttpDownloadService,
};
use docviewer_bridge::traits::{
    BridgeResult, NativeDownload, NativePreview, NativeShare, PlatformBridge,
};
use docviewer_core::{
    NoProgress, PlatformError, PreviewInfo, Progress, ProgressSink, UriPermissions, ViewerConfig,
};

enum DownloadScript {
    Run { body: Vec<u8>, events: Vec<DownloadEvent> },
    Refuse(PlatformError),
    /// Writes a partial file, then never reports.
    Hang,
}

/// Bridge that records every call and replays scripted outcomes.
pub struct MockBridge {
    capable: bool,
    capability_error: Option<PlatformError>,
    preview_error: Option<PlatformError>,
    download: DownloadScript,
    previews: Mutex<Vec<PreviewInfo>>,
    shares: Mutex<Vec<(String, String, UriPermissions)>>,
    downloads: Mutex<Vec<(String, PathBuf)>>,
    held: Mutex<Vec<DownloadEventSender>>,
}

impl Default for MockBridge {
    fn default() -> Self {
        Self {
            capable: true,
            capability_error: None,
            preview_error: None,
            download: DownloadScript::Run {
                body: Vec::new(),
                events: vec![DownloadEvent::Complete],
            },
            previews: Mutex::default(),
            shares: Mutex::default(),
            downloads: Mutex::default(),
            held: Mutex::default(),
        }
    }
}

impl MockBridge {
    /// Downloads write `body` to the destination, then replay `events` and
    /// close the task.
    pub fn with_download(mut self, body: &[u8], events: Vec<DownloadEvent>) -> Self {
        self.download = DownloadScript::Run {
            body: body.to_vec(),
            events,
        };
        self
    }

    pub fn with_start_error(mut self, error: PlatformError) -> Self {
        self.download = DownloadScript::Refuse(error);
        self
    }

    /// Downloads start, leave a partial file and never report anything.
    pub fn with_hanging_download(mut self) -> Self {
        self.download = DownloadScript::Hang;
        self
    }

    pub fn with_capability_error(mut self, error: PlatformError) -> Self {
        self.capability_error = Some(error);
        self
    }

    pub fn with_preview_error(mut self, error: PlatformError) -> Self {
        self.preview_error = Some(error);
        self
    }

    pub fn incapable(mut self) -> Self {
        self.capable = false;
        self
    }

    pub fn previews(&self) -> Vec<PreviewInfo> {
        self.previews.lock().expect("lock").clone()
    }

    pub fn shares(&self) -> Vec<(String, String, UriPermissions)> {
        self.shares.lock().expect("lock").clone()
    }

    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.downloads.lock().expect("lock").clone()
    }
}

impl PlatformBridge for MockBridge {
    fn platform_name(&self) -> &str {
        "Mock"
    }
}

impl NativePreview for MockBridge {
    fn can_preview(&self, _uri: &str) -> BridgeResult<bool> {
        match &self.capability_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.capable),
        }
    }

    fn open_preview(&self, info: &PreviewInfo) -> BridgeResult<()> {
        if let Some(e) = &self.preview_error {
            return Err(e.clone());
        }
        self.previews.lock().expect("lock").push(info.clone());
        Ok(())
    }
}

impl NativeShare for MockBridge {
    fn share_file(
        &self,
        uri: &str,
        mime_type: &str,
        permissions: UriPermissions,
    ) -> BridgeResult<()> {
        self.shares
            .lock()
            .expect("lock")
            .push((uri.to_owned(), mime_type.to_owned(), permissions));
        Ok(())
    }
}

impl NativeDownload for MockBridge {
    fn start_download(&self, url: &str, dest: &Path) -> BridgeResult<DownloadTask> {
        self.downloads
            .lock()
            .expect("lock")
            .push((url.to_owned(), dest.to_path_buf()));

        let (tx, task) = DownloadTask::channel();
        match &self.download {
            DownloadScript::Refuse(e) => return Err(e.clone()),
            DownloadScript::Hang => {
                std::fs::write(dest, b"partial").expect("write mock download");
                self.held.lock().expect("lock").push(tx);
            }
            DownloadScript::Run { body, events } => {
                std::fs::write(dest, body).expect("write mock download");
                for event in events {
                    tx.send(event.clone()).expect("send");
                }
            }
        }
        Ok(task)
    }
}

/// Records previews like [`MockBridge`] but downloads through the real
/// HTTP download service.
pub struct ServiceBridge {
    recorder: MockBridge,
    service: HttpDownloadService,
}

impl ServiceBridge {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            recorder: MockBridge::default(),
            service: HttpDownloadService::new(config).expect("download service"),
        }
    }

    pub fn previews(&self) -> Vec<PreviewInfo> {
        self.recorder.previews()
    }
}

impl PlatformBridge for ServiceBridge {
    fn platform_name(&self) -> &str {
        "Mock (HTTP downloads)"
    }
}

impl NativePreview for ServiceBridge {
    fn can_preview(&self, uri: &str) -> BridgeResult<bool> {
        self.recorder.can_preview(uri)
    }

    fn open_preview(&self, info: &PreviewInfo) -> BridgeResult<()> {
        self.recorder.open_preview(info)
    }
}

impl NativeShare for ServiceBridge {
    fn share_file(
        &self,
        uri: &str,
        mime_type: &str,
        permissions: UriPermissions,
    ) -> BridgeResult<()> {
        self.recorder.share_file(uri, mime_type, permissions)
    }
}

impl NativeDownload for ServiceBridge {
    fn start_download(&self, url: &str, dest: &Path) -> BridgeResult<DownloadTask> {
        self.service.start(url, dest)
    }
}

/// Progress sink that keeps every value it sees.
#[derive(Default)]
pub struct RecordingProgress {
    values: Mutex<Vec<f64>>,
}

impl RecordingProgress {
    pub fn values(&self) -> Vec<f64> {
        self.values.lock().expect("lock").clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, progress: Progress) {
        self.values.lock().expect("lock").push(progress.progress);
    }
}

pub fn silent() -> NoProgress {
    NoProgress
}

/// In-process HTTP/1.1 server answering every request the same way.
pub struct TestServer {
    addr: std::net::SocketAddr,
    requests: Arc<AtomicUsize>,
}

#[derive(Clone)]
enum Reply {
    Body { payload: Vec<u8>, chunks: usize },
    Stall { prefix: Vec<u8>, declared: usize },
    Status(&'static str),
    Silent,
}

impl TestServer {
    /// `200 OK` with a Content-Length, body written in `chunks` flushes.
    pub async fn chunked(payload: Vec<u8>, chunks: usize) -> Self {
        Self::start(Reply::Body {
            payload,
            chunks: chunks.max(1),
        })
        .await
    }

    /// Announces `declared` bytes, sends `prefix` and then goes quiet.
    pub async fn stalling(prefix: Vec<u8>, declared: usize) -> Self {
        Self::start(Reply::Stall { prefix, declared }).await
    }

    /// Accepts the connection and never answers.
    pub async fn silent() -> Self {
        Self::start(Reply::Silent).await
    }

    /// Bare status line with a short body.
    pub async fn status(status: &'static str) -> Self {
        Self::start(Reply::Status(status)).await
    }

    pub fn url(&self, name: &str) -> String {
        format!("http://{}/files/{name}", self.addr)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = reply.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = socket.read(&mut buf).await;
                    let _ = answer(&mut socket, reply).await;
                });
            }
        });

        Self { addr, requests }
    }
}

async fn answer(socket: &mut tokio::net::TcpStream, reply: Reply) -> std::io::Result<()> {
    match reply {
        Reply::Body { payload, chunks } => {
            head(socket, "200 OK", payload.len()).await?;
            let size = payload.len().div_ceil(chunks).max(1);
            for chunk in payload.chunks(size) {
                socket.write_all(chunk).await?;
                socket.flush().await?;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
        Reply::Stall { prefix, declared } => {
            head(socket, "200 OK", declared).await?;
            socket.write_all(&prefix).await?;
            socket.flush().await?;
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Reply::Status(status) => {
            let body = b"error";
            head(socket, status, body.len()).await?;
            socket.write_all(body).await?;
        }
        Reply::Silent => tokio::time::sleep(Duration::from_secs(30)).await,
    }
    socket.shutdown().await
}

async fn head(socket: &mut tokio::net::TcpStream, status: &str, len: usize) -> std::io::Result<()> {
    let head = format!("HTTP/1.1 {status}\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n");
    socket.write_all(head.as_bytes()).await
}
