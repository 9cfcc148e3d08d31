// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocViewer command line entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Args, Parser, Subcommand};
use tokio::sync::oneshot;

use docviewer::{Callback, DocViewerModule, DocViewers, ModuleContext};
use docviewer_core::config::{ViewerConfig, default_files_dir};
use docviewer_core::error::{DocViewerError, Result};
use docviewer_core::{FileInfo, OpenOutcome, Progress};

#[derive(Parser, Debug)]
#[command(name = "docviewer")]
#[command(about = "Open documents in the system previewer", long_about = None)]
struct Cli {
    /// Files directory holding `docviewer.json` and the temp directory.
    #[arg(long, global = true)]
    files_dir: Option<PathBuf>,

    /// Print the outcome as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download through the platform download service, then preview.
    Open {
        url: String,
        #[command(flatten)]
        target: Target,
    },
    /// Stream the document over HTTP, then preview.
    Binary {
        url: String,
        #[command(flatten)]
        target: Target,
    },
    /// Encode a local file as base64 and open it from the payload.
    B64 {
        file: PathBuf,
        #[command(flatten)]
        target: Target,
    },
    /// Offer a local file to other apps.
    Share {
        file: PathBuf,
        /// Grant read access only.
        #[arg(long)]
        read_only: bool,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// File name inside the temp directory (without extension).
    #[arg(long)]
    name: Option<String>,
    /// Extension appended to the file name.
    #[arg(long = "type")]
    file_type: Option<String>,
    /// Reuse a previously fetched file with the same name.
    #[arg(long)]
    cache: bool,
}

impl Target {
    fn apply(self, mut info: FileInfo) -> FileInfo {
        info.file_name = self.name.or(info.file_name);
        info.file_type = self.file_type.or(info.file_type);
        info.cache = Some(self.cache);
        info
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let outcome = run(cli).await;
    report(&outcome, json);
    if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(cli: Cli) -> OpenOutcome {
    let files_dir = cli.files_dir.unwrap_or_else(default_files_dir);
    let config = ViewerConfig::load_or_default(&files_dir);
    let ctx = ModuleContext::create(&files_dir, config.clone())?;
    let bridge = docviewer_bridge::platform_bridge(&config)?;
    tracing::info!(platform = bridge.platform_name(), "DocViewer starting");

    let module = DocViewerModule::new(ctx, Arc::clone(&bridge))?;
    let viewers = DocViewers::new(Some(Arc::new(module)));

    match cli.command {
        Command::Open { url, target } => {
            let params = vec![target.apply(FileInfo::remote(url))];
            request(|cb| viewers.open_doc(params, cb)).await
        }
        Command::Binary { url, target } => {
            let params = vec![target.apply(FileInfo::remote(url))];
            request(|cb| viewers.open_doc_binary_in_url(params, cb)).await
        }
        Command::B64 { file, target } => {
            let params = vec![target.apply(inline_file(&file).await?)];
            request(|cb| viewers.open_doc_b64(params, cb)).await
        }
        Command::Share { file, read_only } => {
            let path = std::fs::canonicalize(&file)?;
            let uri = bridge
                .file_uri(&path)
                .map_err(|e| DocViewerError::Bridge(e.to_string()))?;
            viewers.share_preview(&uri, Some(!read_only)).await?;
            Ok(uri)
        }
    }
}

/// Read `file` into an inline request named after it.
async fn inline_file(file: &std::path::Path) -> Result<FileInfo> {
    let bytes = tokio::fs::read(file).await?;
    let stem = file.file_stem().map(|s| s.to_string_lossy().into_owned());
    let ext = file.extension().map(|s| s.to_string_lossy().into_owned());
    Ok(FileInfo {
        base64: Some(STANDARD.encode(bytes)),
        file_name: stem,
        file_type: ext,
        ..FileInfo::default()
    })
}

/// Issue one facade call and wait for its completion.
async fn request(issue: impl FnOnce(Callback)) -> OpenOutcome {
    let (tx, rx) = oneshot::channel();
    let progress = |p: Progress| eprint!("\rprogress: {:>5.1}%", p.progress);
    issue(
        Callback::new(move |outcome| {
            let _ = tx.send(outcome);
        })
        .with_progress(Arc::new(progress)),
    );
    rx.await
        .unwrap_or_else(|_| Err(DocViewerError::Bridge("request dropped without outcome".into())))
}

fn report(outcome: &OpenOutcome, json: bool) {
    if json {
        let value = match outcome {
            Ok(uri) => serde_json::json!({ "uri": uri }),
            Err(e) => serde_json::json!({
                "error": e.to_string(),
                "kind": format!("{:?}", e.kind()),
            }),
        };
        println!("{value}");
        return;
    }
    match outcome {
        Ok(uri) => println!("opened {uri}"),
        Err(e) => eprintln!("error: {e}"),
    }
}
