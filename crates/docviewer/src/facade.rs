// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fire-and-forget facade used by host adapters. Each call spawns the request
// on the current runtime and reports through a single-use `Callback`.

use std::sync::Arc;

use tracing::warn;

use docviewer_core::error::{DocViewerError, Result};
use docviewer_core::{FileInfo, NoProgress, OpenOutcome, ProgressSink, to_callback_args};

use crate::flow::EntryPoint;
use crate::module::DocViewerModule;

/// Completion handle for one request. Consumed when the outcome is
/// delivered, so it can fire at most once.
pub struct Callback {
    on_done: Box<dyn FnOnce(OpenOutcome) + Send>,
    progress: Arc<dyn ProgressSink>,
}

impl Callback {
    pub fn new(on_done: impl FnOnce(OpenOutcome) + Send + 'static) -> Self {
        Self {
            on_done: Box::new(on_done),
            progress: Arc::new(NoProgress),
        }
    }

    /// Adapter for callers that expect `(error, result)` arguments.
    pub fn legacy(on_done: impl FnOnce(String, Option<String>) + Send + 'static) -> Self {
        Self::new(move |outcome| {
            let (error, result) = to_callback_args(&outcome);
            on_done(error, result)
        })
    }

    /// Route download progress for this request to `progress`.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    fn complete(self, outcome: OpenOutcome) {
        (self.on_done)(outcome)
    }
}

/// Scripting-facing entry points. `native` is `None` when the host has no
/// native module registered; every call then fails fast.
#[derive(Clone, Default)]
pub struct DocViewers {
    native: Option<Arc<DocViewerModule>>,
}

impl DocViewers {
    pub fn new(native: Option<Arc<DocViewerModule>>) -> Self {
        Self { native }
    }

    pub fn open_doc(&self, params: Vec<FileInfo>, callback: Callback) {
        self.spawn(EntryPoint::OpenDoc, params, callback);
    }

    pub fn open_doc_binary_in_url(&self, params: Vec<FileInfo>, callback: Callback) {
        self.spawn(EntryPoint::OpenDocBinaryInUrl, params, callback);
    }

    pub fn open_doc_b64(&self, params: Vec<FileInfo>, callback: Callback) {
        self.spawn(EntryPoint::OpenDocB64, params, callback);
    }

    pub async fn share_preview(&self, uri: &str, write: Option<bool>) -> Result<()> {
        let module = self.native.as_ref().ok_or(DocViewerError::ModuleUnavailable)?;
        module.share_preview(uri, write).await
    }

    fn spawn(&self, entry: EntryPoint, params: Vec<FileInfo>, callback: Callback) {
        let Some(module) = self.native.clone() else {
            warn!(entry = entry.name(), "no native module registered");
            callback.complete(Err(DocViewerError::ModuleUnavailable));
            return;
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                callback.complete(Err(DocViewerError::Bridge(format!("no async runtime: {e}"))));
                return;
            }
        };
        runtime.spawn(async move {
            let progress = Arc::clone(&callback.progress);
            let outcome = module.run(entry, &params, progress.as_ref()).await;
            callback.complete(outcome);
        });
    }
}
