// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocViewer: the native viewer module. Turns a `FileInfo` request into a
// local file (cached, decoded from base64, streamed over HTTP, or fetched by
// the platform download service) and hands it to the host previewer through
// `docviewer-bridge`.

pub mod acquire;
pub mod cache;
pub mod context;
pub mod dispatch;
pub mod facade;
pub mod flow;
pub mod module;

#[cfg(test)]
pub(crate) mod testing;

pub use context::ModuleContext;
pub use dispatch::Dispatcher;
pub use facade::{Callback, DocViewers};
pub use flow::{EntryPoint, Event, Phase};
pub use module::DocViewerModule;
