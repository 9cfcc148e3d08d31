// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The native viewer module: validates a request, gets its file onto local
// storage (reusing a cached copy when asked to) and dispatches it to the
// host previewer. Every request runs under the configured operation
// deadline, so it always ends in exactly one outcome.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use docviewer_bridge::traits::PlatformBridge;
use docviewer_core::error::{DocViewerError, Result};
use docviewer_core::{FileInfo, ProgressSink};

use crate::acquire::{self, Strategy};
use crate::cache::{self, CacheState};
use crate::context::ModuleContext;
use crate::dispatch::Dispatcher;
use crate::flow::{EntryPoint, Event, Flow, Phase};

/// Document viewer module bound to one context and platform bridge.
pub struct DocViewerModule {
    ctx: ModuleContext,
    bridge: Arc<dyn PlatformBridge>,
    dispatcher: Dispatcher,
    http: reqwest::Client,
}

impl DocViewerModule {
    pub fn new(ctx: ModuleContext, bridge: Arc<dyn PlatformBridge>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(ctx.config().connect_timeout())
            .build()
            .map_err(|e| DocViewerError::Http(format!("HTTP client init failed: {e}")))?;
        info!(
            platform = bridge.platform_name(),
            temp_dir = %ctx.temp_dir().display(),
            "doc viewer module initialised"
        );
        Ok(Self {
            ctx,
            dispatcher: Dispatcher::new(Arc::clone(&bridge)),
            bridge,
            http,
        })
    }

    pub fn context(&self) -> &ModuleContext {
        &self.ctx
    }

    /// Open a remote document through the platform download service.
    /// Requires `url`.
    pub async fn open_doc(
        &self,
        params: &[FileInfo],
        progress: &dyn ProgressSink,
    ) -> Result<String> {
        self.run(EntryPoint::OpenDoc, params, progress).await
    }

    /// Open a remote document fetched with a streamed HTTP GET.
    /// Requires `url`, `fileName` and `fileType`.
    pub async fn open_doc_binary_in_url(
        &self,
        params: &[FileInfo],
        progress: &dyn ProgressSink,
    ) -> Result<String> {
        self.run(EntryPoint::OpenDocBinaryInUrl, params, progress).await
    }

    /// Open an inline base64 document. Requires `base64`, `fileName` and
    /// `fileType`.
    pub async fn open_doc_b64(
        &self,
        params: &[FileInfo],
        progress: &dyn ProgressSink,
    ) -> Result<String> {
        self.run(EntryPoint::OpenDocB64, params, progress).await
    }

    /// Offer an already-local file to other apps. `write` defaults to the
    /// configured share permission.
    pub async fn share_preview(&self, uri: &str, write: Option<bool>) -> Result<()> {
        let write = write.unwrap_or(self.ctx.config().share_write_default);
        self.dispatcher.share(uri, write).await
    }

    /// Run one request under the operation deadline.
    pub async fn run(
        &self,
        entry: EntryPoint,
        params: &[FileInfo],
        progress: &dyn ProgressSink,
    ) -> Result<String> {
        let deadline = self.ctx.config().operation_timeout();
        let outcome = tokio::time::timeout(deadline, self.drive(entry, params, progress))
            .await
            .unwrap_or_else(|_| {
                Err(DocViewerError::TimedOut {
                    operation: entry.name(),
                    secs: deadline.as_secs(),
                })
            });

        match &outcome {
            Ok(uri) => info!(entry = entry.name(), uri = %uri, "request done"),
            Err(e) => warn!(entry = entry.name(), kind = ?e.kind(), "request failed: {e}"),
        }
        outcome
    }

    async fn drive(
        &self,
        entry: EntryPoint,
        params: &[FileInfo],
        progress: &dyn ProgressSink,
    ) -> Result<String> {
        let mut flow = Flow::new(entry);
        flow.advance(Event::Begin);

        let info = flow.check(entry.validate(params))?;
        let path = flow.check(self.ctx.resolve_path(info).ok_or(DocViewerError::NoFilePath))?;

        if flow.advance(Event::Valid { cache: info.cache() }) == Phase::CacheCheck {
            let event = match cache::check(&path).await {
                CacheState::Hit => Event::CacheHit,
                CacheState::Miss => Event::CacheMiss,
            };
            flow.advance(event);
        }

        if let Phase::Acquiring(strategy) = flow.phase() {
            let produced = self.acquire(strategy, info, &path, progress).await;
            flow.check(produced)?;
            flow.advance(Event::Produced);
        }

        flow.advance(Event::Dispatch);
        let uri = flow.check(self.dispatcher.dispatch(&path).await)?;
        flow.advance(Event::Dispatched);
        Ok(uri)
    }

    async fn acquire(
        &self,
        strategy: Strategy,
        info: &FileInfo,
        path: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let config = self.ctx.config();
        match strategy {
            Strategy::Base64 => {
                let payload = info.base64().ok_or(DocViewerError::MissingParameters(
                    "base64, fileName, fileType",
                ))?;
                acquire::inline::save_base64(payload, path).await
            }
            Strategy::StreamedHttp => {
                let url = info.url().ok_or(DocViewerError::MissingParameters("url"))?;
                acquire::stream::download(&self.http, url, path, config.read_timeout(), progress)
                    .await
                    .map(|_bytes| ())
            }
            Strategy::PlatformDownload => {
                let url = info.url().ok_or(DocViewerError::MissingParameters("url"))?;
                acquire::manager::download(self.bridge.as_ref(), url, path, progress).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, MockBridge, RecordingProgress, ServiceBridge, TestServer};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use docviewer_bridge::download::DownloadEvent;
    use docviewer_core::{PlatformError, ViewerConfig};

    struct Harness {
        _files: tempfile::TempDir,
        bridge: Arc<MockBridge>,
        module: DocViewerModule,
    }

    fn harness(bridge: MockBridge) -> Harness {
        let config = ViewerConfig {
            read_timeout_secs: 1,
            operation_timeout_secs: 3,
            ..ViewerConfig::default()
        };
        let files = tempfile::tempdir().expect("tempdir");
        let ctx = ModuleContext::create(files.path(), config).expect("ctx");
        let bridge = Arc::new(bridge);
        let module = DocViewerModule::new(ctx, bridge.clone()).expect("module");
        Harness {
            _files: files,
            bridge,
            module,
        }
    }

    fn temp_entries(h: &Harness) -> usize {
        std::fs::read_dir(h.module.context().temp_dir()).expect("read_dir").count()
    }

    // -- openDocb64 ----------------------------------------------------------

    #[tokio::test]
    async fn b64_writes_and_previews() {
        let h = harness(MockBridge::default());
        let params = vec![FileInfo::inline(STANDARD.encode(b"%PDF-1.7"), "invoice", "pdf")];

        let uri = h.module.open_doc_b64(&params, &testing::silent()).await.expect("open");

        let path = h.module.context().temp_dir().join("invoice.pdf");
        assert_eq!(std::fs::read(&path).expect("read"), b"%PDF-1.7");
        assert!(uri.ends_with("invoice.pdf"));
        assert_eq!(h.bridge.previews()[0].mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn b64_missing_fields_touch_nothing() {
        let h = harness(MockBridge::default());
        let params = vec![FileInfo {
            base64: Some("aGk=".into()),
            file_type: Some("txt".into()),
            ..FileInfo::default()
        }];

        let err = h.module.open_doc_b64(&params, &testing::silent()).await.expect_err("invalid");

        assert_eq!(err.to_string(), "Requires parameters: base64, fileName, fileType");
        assert_eq!(temp_entries(&h), 0);
        assert!(h.bridge.previews().is_empty());
    }

    #[tokio::test]
    async fn b64_bad_payload_reports_fixed_message() {
        let h = harness(MockBridge::default());
        let params = vec![FileInfo::inline("***", "x", "pdf")];
        let err = h.module.open_doc_b64(&params, &testing::silent()).await.expect_err("bad");
        assert_eq!(err.to_string(), "openDocb64 execute failed");
        assert!(h.bridge.previews().is_empty());
    }

    #[tokio::test]
    async fn b64_cache_hit_keeps_existing_file() {
        let h = harness(MockBridge::default());
        let path = h.module.context().temp_dir().join("invoice.pdf");
        std::fs::write(&path, b"cached").expect("seed");
        let params =
            vec![FileInfo::inline(STANDARD.encode(b"fresh"), "invoice", "pdf").with_cache(true)];

        h.module.open_doc_b64(&params, &testing::silent()).await.expect("open");

        assert_eq!(std::fs::read(&path).expect("read"), b"cached");
        assert_eq!(h.bridge.previews().len(), 1);
    }

    #[tokio::test]
    async fn b64_cache_miss_writes() {
        let h = harness(MockBridge::default());
        let params =
            vec![FileInfo::inline(STANDARD.encode(b"fresh"), "invoice", "pdf").with_cache(true)];

        h.module.open_doc_b64(&params, &testing::silent()).await.expect("open");

        let path = h.module.context().temp_dir().join("invoice.pdf");
        assert_eq!(std::fs::read(&path).expect("read"), b"fresh");
    }

    #[tokio::test]
    async fn b64_without_cache_overwrites() {
        let h = harness(MockBridge::default());
        let path = h.module.context().temp_dir().join("invoice.pdf");
        std::fs::write(&path, b"cached").expect("seed");
        let params = vec![FileInfo::inline(STANDARD.encode(b"fresh"), "invoice", "pdf")];

        h.module.open_doc_b64(&params, &testing::silent()).await.expect("open");

        assert_eq!(std::fs::read(&path).expect("read"), b"fresh");
    }

    // -- openDocBinaryinUrl --------------------------------------------------

    #[tokio::test]
    async fn streamed_download_progress_and_bytes() {
        let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
        let server = TestServer::chunked(payload.clone(), 8).await;
        let h = harness(MockBridge::default());
        let progress = RecordingProgress::default();
        let params = vec![
            FileInfo::remote(server.url("report"))
                .with_file_name("report")
                .with_file_type("pdf"),
        ];

        h.module
            .open_doc_binary_in_url(&params, &progress)
            .await
            .expect("open");

        let path = h.module.context().temp_dir().join("report.pdf");
        assert_eq!(std::fs::read(&path).expect("read"), payload);
        assert!(!stream_part(&path).exists());

        let values = progress.values();
        assert_eq!(values.last(), Some(&100.0));
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(values[..values.len() - 1].iter().all(|v| *v < 100.0));
    }

    fn stream_part(path: &Path) -> std::path::PathBuf {
        docviewer_core::paths::part_path(path)
    }

    #[tokio::test]
    async fn streamed_cache_hit_skips_network() {
        let server = TestServer::chunked(b"remote".to_vec(), 1).await;
        let h = harness(MockBridge::default());
        let path = h.module.context().temp_dir().join("report.pdf");
        std::fs::write(&path, b"cached").expect("seed");
        let params = vec![
            FileInfo::remote(server.url("report"))
                .with_file_name("report")
                .with_file_type("pdf")
                .with_cache(true),
        ];

        h.module
            .open_doc_binary_in_url(&params, &testing::silent())
            .await
            .expect("open");

        assert_eq!(server.requests(), 0);
        assert_eq!(std::fs::read(&path).expect("read"), b"cached");
        assert_eq!(h.bridge.previews().len(), 1);
    }

    #[tokio::test]
    async fn streamed_cache_miss_downloads() {
        let server = TestServer::chunked(b"remote".to_vec(), 1).await;
        let h = harness(MockBridge::default());
        let params = vec![
            FileInfo::remote(server.url("report"))
                .with_file_name("report")
                .with_file_type("pdf")
                .with_cache(true),
        ];

        h.module
            .open_doc_binary_in_url(&params, &testing::silent())
            .await
            .expect("open");

        assert_eq!(server.requests(), 1);
        assert!(h.bridge.downloads().is_empty());
    }

    #[tokio::test]
    async fn streamed_missing_fields() {
        let h = harness(MockBridge::default());
        let params = vec![FileInfo::remote("https://x/y/report.pdf")];
        let err = h
            .module
            .open_doc_binary_in_url(&params, &testing::silent())
            .await
            .expect_err("invalid");
        assert_eq!(err.to_string(), "Requires parameters: url,fileName,fileType");
        assert_eq!(temp_entries(&h), 0);
    }

    #[tokio::test]
    async fn stalled_stream_times_out_and_leaves_nothing() {
        let server = TestServer::stalling(b"partial".to_vec(), 1024).await;
        let h = harness(MockBridge::default());
        let params = vec![
            FileInfo::remote(server.url("report"))
                .with_file_name("report")
                .with_file_type("pdf"),
        ];

        let err = h
            .module
            .open_doc_binary_in_url(&params, &testing::silent())
            .await
            .expect_err("stall");

        assert!(matches!(err, DocViewerError::TimedOut { .. }));
        assert_eq!(temp_entries(&h), 0);
        assert!(h.bridge.previews().is_empty());
    }

    #[tokio::test]
    async fn unanswered_request_hits_read_timeout_first() {
        let server = TestServer::silent().await;
        let h = harness(MockBridge::default());
        let params = vec![
            FileInfo::remote(server.url("report"))
                .with_file_name("report")
                .with_file_type("pdf"),
        ];

        let err = h
            .module
            .open_doc_binary_in_url(&params, &testing::silent())
            .await
            .expect_err("silent server");

        assert_eq!(err.to_string(), "HTTP read timed out after 1s");
        assert_eq!(temp_entries(&h), 0);
    }

    #[tokio::test]
    async fn streamed_http_error_status() {
        let server = TestServer::status("500 Internal Server Error").await;
        let h = harness(MockBridge::default());
        let params = vec![
            FileInfo::remote(server.url("report"))
                .with_file_name("report")
                .with_file_type("pdf"),
        ];

        let err = h
            .module
            .open_doc_binary_in_url(&params, &testing::silent())
            .await
            .expect_err("500");
        assert!(matches!(err, DocViewerError::Http(_)));
        assert_eq!(temp_entries(&h), 0);
    }

    // -- openDoc -------------------------------------------------------------

    #[tokio::test]
    async fn platform_download_then_preview() {
        let h = harness(MockBridge::default().with_download(b"doc", vec![DownloadEvent::Complete]));
        let params = vec![FileInfo::remote("https://x/y/report").with_file_type("docx")];

        let uri = h.module.open_doc(&params, &testing::silent()).await.expect("open");

        assert!(uri.ends_with("report.docx"));
        let downloads = h.bridge.downloads();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].0, "https://x/y/report");
        assert_eq!(downloads[0].1, h.module.context().temp_dir().join("report.docx"));
    }

    #[tokio::test]
    async fn platform_download_failure_cleans_up() {
        let h = harness(
            MockBridge::default().with_download(b"part", vec![DownloadEvent::Fail("reset".into())]),
        );
        let params = vec![FileInfo::remote("https://x/y/report.pdf")];

        let err = h.module.open_doc(&params, &testing::silent()).await.expect_err("fail");

        assert_eq!(err.to_string(), "download fail:reset");
        assert!(!h.module.context().temp_dir().join("report.pdf").exists());
        assert!(h.bridge.previews().is_empty());
    }

    #[tokio::test]
    async fn platform_download_existing_file_previews() {
        let h = harness(
            MockBridge::default()
                .with_start_error(PlatformError::new(PlatformError::FILE_EXISTS, "exists")),
        );
        let params = vec![FileInfo::remote("https://x/y/report.pdf")];
        std::fs::write(h.module.context().temp_dir().join("report.pdf"), b"old").expect("seed");

        h.module.open_doc(&params, &testing::silent()).await.expect("reuse");
        assert_eq!(h.bridge.previews().len(), 1);
    }

    #[tokio::test]
    async fn open_doc_cache_hit_skips_download() {
        let h = harness(MockBridge::default());
        std::fs::write(h.module.context().temp_dir().join("report.pdf"), b"old").expect("seed");
        let params = vec![FileInfo::remote("https://x/y/report.pdf").with_cache(true)];

        h.module.open_doc(&params, &testing::silent()).await.expect("open");

        assert!(h.bridge.downloads().is_empty());
        assert_eq!(h.bridge.previews().len(), 1);
    }

    #[tokio::test]
    async fn open_doc_requires_url() {
        let h = harness(MockBridge::default());
        let err = h.module.open_doc(&[], &testing::silent()).await.expect_err("empty");
        assert_eq!(err.to_string(), "Requires parameters: url");

        let params = vec![FileInfo::default().with_file_name("a").with_file_type("pdf")];
        let err = h.module.open_doc(&params, &testing::silent()).await.expect_err("no url");
        assert_eq!(err.to_string(), "Requires parameters: url");
        assert!(h.bridge.downloads().is_empty());
    }

    #[tokio::test]
    async fn unresolvable_url_path() {
        let h = harness(MockBridge::default());
        let params = vec![FileInfo::remote("https://x/y/")];
        let err = h.module.open_doc(&params, &testing::silent()).await.expect_err("no path");
        assert!(matches!(err, DocViewerError::NoFilePath));
    }

    #[tokio::test]
    async fn silent_download_hits_operation_deadline() {
        let h = harness(MockBridge::default().with_hanging_download());
        let params = vec![FileInfo::remote("https://x/y/report.pdf")];

        let err = h.module.open_doc(&params, &testing::silent()).await.expect_err("deadline");

        assert_eq!(err.to_string(), "openDoc timed out after 3s");
    }

    #[tokio::test]
    async fn deadline_mid_download_does_not_leave_a_cached_file() {
        let server = TestServer::stalling(b"PARTIAL".to_vec(), 1024).await;
        let config = ViewerConfig {
            read_timeout_secs: 10,
            operation_timeout_secs: 1,
            ..ViewerConfig::default()
        };
        let files = tempfile::tempdir().expect("tempdir");
        let ctx = ModuleContext::create(files.path(), config.clone()).expect("ctx");
        let bridge = Arc::new(ServiceBridge::new(&config));
        let module = DocViewerModule::new(ctx, bridge.clone()).expect("module");
        let dest = module.context().temp_dir().join("report.pdf");

        let params = vec![FileInfo::remote(server.url("report.pdf"))];
        let err = module.open_doc(&params, &testing::silent()).await.expect_err("deadline");
        assert_eq!(err.to_string(), "openDoc timed out after 1s");

        // The aborted transfer is torn down on the next scheduler turn.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!dest.exists());
        assert!(!stream_part(&dest).exists());

        // A retry goes back to the network instead of previewing a stub.
        let retry = vec![FileInfo::remote(server.url("report.pdf")).with_cache(true)];
        let err = module.open_doc(&retry, &testing::silent()).await.expect_err("stalls again");
        assert!(matches!(err, DocViewerError::TimedOut { .. }));
        assert_eq!(server.requests(), 2);
        assert!(bridge.previews().is_empty());
    }

    // -- share ---------------------------------------------------------------

    #[tokio::test]
    async fn share_defaults_to_write_permission() {
        let h = harness(MockBridge::default());
        h.module
            .share_preview("file:///data/docViewerTemp/a.pdf", None)
            .await
            .expect("share");
        h.module
            .share_preview("file:///data/docViewerTemp/a.pdf", Some(false))
            .await
            .expect("share");

        let shares = h.bridge.shares();
        assert!(shares[0].2.write);
        assert!(!shares[1].2.write);
    }
}
