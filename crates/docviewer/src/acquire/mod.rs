// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Acquisition strategies: the ways a request's file is materialised at its
// resolved path.

pub mod inline;
pub mod manager;
pub mod stream;

/// How a missing file gets produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Decode an inline base64 payload and write it.
    Base64,
    /// Stream an HTTP GET to disk, reporting progress.
    StreamedHttp,
    /// Hand the URL to the platform download service.
    PlatformDownload,
}
