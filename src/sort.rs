//! Applying a sort action (rename, move or copy) to classified files.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::format::Formatter;
use crate::library::models::ClassificationResult;
use crate::worker::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAction {
    /// Change only the file name, leaving it in its directory
    Rename,
    Move,
    Copy,
}

impl SortAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortAction::Rename => "rename",
            SortAction::Move => "move",
            SortAction::Copy => "copy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortStatus {
    Done,
    /// Dry run: what would have happened
    Planned,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SortOutcome {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub status: SortStatus,
}

impl SortOutcome {
    fn new(source: &Path, destination: Option<PathBuf>, status: SortStatus) -> Self {
        Self {
            source: source.to_path_buf(),
            destination,
            status,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, SortStatus::Failed(_))
    }
}

#[derive(Debug)]
pub struct SortExecutor {
    formatter: Formatter,
    output_root: PathBuf,
    /// Upper bound for empty-directory cleanup; never removed itself
    input_root: PathBuf,
    delete_empty_dirs: bool,
    dry_run: bool,
}

impl SortExecutor {
    pub fn new(formatter: Formatter, input_root: PathBuf, output_root: PathBuf) -> Self {
        Self {
            formatter,
            output_root,
            input_root,
            delete_empty_dirs: false,
            dry_run: false,
        }
    }

    pub fn delete_empty_dirs(mut self, enabled: bool) -> Self {
        self.delete_empty_dirs = enabled;
        self
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn execute(&self, results: &[ClassificationResult], action: SortAction) -> Vec<SortOutcome> {
        self.execute_with(results, action, &CancelToken::new(), |_, _| {})
    }

    /// Process every result in order. One failure never stops the rest; a cancel does.
    pub fn execute_with(
        &self,
        results: &[ClassificationResult],
        action: SortAction,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(usize, &SortOutcome),
    ) -> Vec<SortOutcome> {
        let mut claimed = HashSet::new();
        let mut outcomes = Vec::with_capacity(results.len());

        for (i, result) in results.iter().enumerate() {
            let outcome = if cancel.is_cancelled() {
                SortOutcome::new(
                    &result.source_file,
                    None,
                    SortStatus::Skipped(Error::Cancelled.to_string()),
                )
            } else {
                self.execute_one(result, action, &mut claimed)
            };
            on_progress(i + 1, &outcome);
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        info!(
            action = action.as_str(),
            total = outcomes.len(),
            failed,
            dry_run = self.dry_run,
            "Sort finished"
        );
        outcomes
    }

    fn execute_one(
        &self,
        result: &ClassificationResult,
        action: SortAction,
        claimed: &mut HashSet<PathBuf>,
    ) -> SortOutcome {
        let source = result.source_file.as_path();

        if result.is_incomplete() {
            warn!(source = %source.display(), "Refusing to sort unresolved file");
            return SortOutcome::new(
                source,
                None,
                SortStatus::Skipped(Error::IncompleteResult(source.to_path_buf()).to_string()),
            );
        }
        if !result.checked {
            debug!(source = %source.display(), "Skipping unchecked file");
            return SortOutcome::new(source, None, SortStatus::Skipped("not checked".into()));
        }

        let destination = match action {
            SortAction::Rename => self.formatter.renamed(result),
            SortAction::Move | SortAction::Copy => {
                self.formatter.destination(result, &self.output_root)
            }
        };
        let destination = match destination {
            Ok(d) => d,
            Err(e) => {
                error!(source = %source.display(), error = %e, "Could not compute destination");
                return SortOutcome::new(source, None, SortStatus::Failed(e.to_string()));
            }
        };

        if destination == source {
            return SortOutcome::new(
                source,
                Some(destination),
                SortStatus::Skipped("already in place".into()),
            );
        }

        let applied = if !claimed.insert(destination.clone()) {
            Err(Error::DestinationExists(destination.clone()))
        } else if self.dry_run {
            check_free(&destination)
        } else {
            self.apply(source, &destination, action)
        };

        match applied {
            Ok(()) if self.dry_run => {
                SortOutcome::new(source, Some(destination), SortStatus::Planned)
            }
            Ok(()) => {
                info!(
                    action = action.as_str(),
                    source = %source.display(),
                    destination = %destination.display(),
                    "Sorted file"
                );
                SortOutcome::new(source, Some(destination), SortStatus::Done)
            }
            Err(e) => {
                error!(
                    action = action.as_str(),
                    source = %source.display(),
                    destination = %destination.display(),
                    error = %e,
                    "Sort action failed"
                );
                SortOutcome::new(source, Some(destination), SortStatus::Failed(e.to_string()))
            }
        }
    }

    fn apply(&self, source: &Path, destination: &Path, action: SortAction) -> Result<()> {
        check_free(destination)?;

        match action {
            SortAction::Rename => fs::rename(source, destination)?,
            SortAction::Move => {
                create_parent(destination)?;
                move_file(source, destination)?;
                if self.delete_empty_dirs {
                    if let Some(dir) = source.parent() {
                        remove_empty_dirs(dir, &self.input_root);
                    }
                }
            }
            SortAction::Copy => {
                create_parent(destination)?;
                fs::copy(source, destination)?;
            }
        }
        Ok(())
    }
}

fn check_free(destination: &Path) -> Result<()> {
    if destination.exists() {
        return Err(Error::DestinationExists(destination.to_path_buf()));
    }
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Rename, falling back to copy and delete across filesystems
fn move_file(source: &Path, destination: &Path) -> Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(source = %source.display(), "Cross-device move, copying instead");
            fs::copy(source, destination)?;
            fs::remove_file(source)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete `start` and its parents while they are empty, stopping below `input_root`.
///
/// The root itself is never removed, and nothing outside it is touched.
/// Returns how many directories were deleted.
pub fn remove_empty_dirs(start: &Path, input_root: &Path) -> usize {
    let (Ok(root), Ok(start)) = (input_root.canonicalize(), start.canonicalize()) else {
        return 0;
    };

    let candidates: Vec<&Path> = start
        .ancestors()
        .take_while(|dir| *dir != root && dir.starts_with(&root))
        .collect();

    let mut removed = 0;
    for dir in candidates {
        let is_empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            break;
        }
        if let Err(e) = fs::remove_dir(dir) {
            warn!(dir = %dir.display(), error = %e, "Could not remove empty directory");
            break;
        }
        debug!(dir = %dir.display(), "Removed empty directory");
        removed += 1;
    }
    removed
}
