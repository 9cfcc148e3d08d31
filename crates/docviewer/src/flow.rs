// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-request state machine.
//
//   Received → Validating → {CacheCheck | Acquiring} → Acquired
//            → Dispatching → {Done | Failed}
//
// Which acquisition strategy runs on a cache miss (or without caching) is a
// property of the entry point alone, so the whole fallback policy lives in
// `EntryPoint::strategy` and `Phase::next`.

use docviewer_core::error::{DocViewerError, Result};
use docviewer_core::FileInfo;
use tracing::{debug, error};

use crate::acquire::Strategy;

/// The three public open operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// `openDoc`: remote URL, platform download service.
    OpenDoc,
    /// `openDocBinaryinUrl`: remote URL, streamed HTTP download.
    OpenDocBinaryInUrl,
    /// `openDocb64`: inline base64 payload.
    OpenDocB64,
}

impl EntryPoint {
    /// Name used in logs and timeout messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenDoc => "openDoc",
            Self::OpenDocBinaryInUrl => "openDocBinaryinUrl",
            Self::OpenDocB64 => "openDocb64",
        }
    }

    /// Strategy that produces the file when it is not (or may not be) cached.
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::OpenDoc => Strategy::PlatformDownload,
            Self::OpenDocBinaryInUrl => Strategy::StreamedHttp,
            Self::OpenDocB64 => Strategy::Base64,
        }
    }

    /// Check the first request entry carries the fields this entry point
    /// needs. Only `fileParams[0]` is ever consulted.
    pub fn validate<'a>(&self, params: &'a [FileInfo]) -> Result<&'a FileInfo> {
        let (required, ok): (&'static str, fn(&FileInfo) -> bool) = match self {
            Self::OpenDoc => ("url", |i: &FileInfo| i.url().is_some()),
            Self::OpenDocBinaryInUrl => ("url,fileName,fileType", |i: &FileInfo| {
                i.url().is_some() && i.file_name().is_some() && i.file_type().is_some()
            }),
            Self::OpenDocB64 => ("base64, fileName, fileType", |i: &FileInfo| {
                i.base64().is_some() && i.file_name().is_some() && i.file_type().is_some()
            }),
        };
        params
            .first()
            .filter(|info| ok(info))
            .ok_or(DocViewerError::MissingParameters(required))
    }
}

/// Where a request currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Validating,
    CacheCheck,
    Acquiring(Strategy),
    Acquired,
    Dispatching,
    Done,
    Failed,
}

/// Something that happened to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Begin,
    Valid { cache: bool },
    CacheHit,
    CacheMiss,
    Produced,
    Dispatch,
    Dispatched,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Transition for `event`, or `None` when the event is not legal here.
    pub fn next(self, entry: EntryPoint, event: Event) -> Option<Phase> {
        use Event as E;
        use Phase as P;

        let next = match (self, event) {
            (p, E::Failed) if !p.is_terminal() => P::Failed,
            (P::Received, E::Begin) => P::Validating,
            (P::Validating, E::Valid { cache: true }) => P::CacheCheck,
            (P::Validating, E::Valid { cache: false }) => P::Acquiring(entry.strategy()),
            (P::CacheCheck, E::CacheHit) => P::Acquired,
            (P::CacheCheck, E::CacheMiss) => P::Acquiring(entry.strategy()),
            (P::Acquiring(_), E::Produced) => P::Acquired,
            (P::Acquired, E::Dispatch) => P::Dispatching,
            (P::Dispatching, E::Dispatched) => P::Done,
            _ => return None,
        };
        Some(next)
    }
}

/// A request's position in the state machine, with transition logging.
#[derive(Debug)]
pub struct Flow {
    entry: EntryPoint,
    phase: Phase,
}

impl Flow {
    pub fn new(entry: EntryPoint) -> Self {
        Self {
            entry,
            phase: Phase::Received,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Apply `event`. An illegal event is a programming error: it is logged
    /// and the request is failed.
    pub fn advance(&mut self, event: Event) -> Phase {
        let from = self.phase;
        self.phase = match from.next(self.entry, event) {
            Some(to) => to,
            None => {
                error!(entry = self.entry.name(), ?from, ?event, "illegal request transition");
                Phase::Failed
            }
        };
        debug!(entry = self.entry.name(), ?from, to = ?self.phase, "request transition");
        self.phase
    }

    /// Pass `result` through, failing the flow on `Err`.
    pub fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.advance(Event::Failed);
        }
        result
    }
}
