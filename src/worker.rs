//! Background batches.
//!
//! A scan or a sort runs as a single blocking task so the caller stays
//! responsive. Each processed file sends one `Progress` tick, and the
//! `CancelToken` is checked between files.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::Result;
use crate::library::catalog::Resolver;
use crate::library::models::ClassificationResult;
use crate::library::scanner::Scanner;
use crate::sort::{SortAction, SortExecutor, SortOutcome};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub path: PathBuf,
}

/// Scan `input_root` off-thread. A cancelled scan returns what it classified so far.
pub fn spawn_scan<R>(
    scanner: Arc<Scanner>,
    resolver: Arc<R>,
    input_root: PathBuf,
    recurse: bool,
    progress: mpsc::UnboundedSender<Progress>,
    cancel: CancelToken,
) -> JoinHandle<Result<Vec<ClassificationResult>>>
where
    R: Resolver + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || {
        let files = scanner.collect_files(&input_root, recurse)?;
        let total = files.len();
        let mut results = Vec::new();

        for (i, file) in files.into_iter().enumerate() {
            if cancel.is_cancelled() {
                info!(done = i, total, "Scan cancelled");
                break;
            }
            if let Some(result) = scanner.classify_file(&file, resolver.as_ref()) {
                results.push(result);
            }
            // Receiver may have gone away; the batch still finishes
            let _ = progress.send(Progress {
                done: i + 1,
                total,
                path: file,
            });
        }

        Ok(results)
    })
}

pub fn spawn_sort(
    executor: Arc<SortExecutor>,
    results: Vec<ClassificationResult>,
    action: SortAction,
    progress: mpsc::UnboundedSender<Progress>,
    cancel: CancelToken,
) -> JoinHandle<Vec<SortOutcome>> {
    tokio::task::spawn_blocking(move || {
        let total = results.len();
        executor.execute_with(&results, action, &cancel, |done, outcome| {
            let _ = progress.send(Progress {
                done,
                total,
                path: outcome.source.clone(),
            });
        })
    })
}
