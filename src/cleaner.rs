//! Safe, deepest-first deletion of subscription directories.

use crate::error::WorkshopError;
use crate::scanner::Subscription;
use crate::workshop::WorkshopPaths;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A single path that could not be removed.
#[derive(Debug)]
pub struct RemovalFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// What happened while deleting one subscription tree.
#[derive(Debug, Default)]
pub struct DeletionReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<RemovalFailure>,
    /// Links found in the tree. Unlinked, never followed.
    pub symlinks: Vec<PathBuf>,
}

impl DeletionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct CleanResult {
    pub deleted: Vec<Subscription>,
    pub partial: Vec<(Subscription, DeletionReport)>,
    pub failed: Vec<(Subscription, WorkshopError)>,
}

impl CleanResult {
    pub fn total_cleaned(&self) -> u64 {
        self.deleted.iter().map(|s| s.details.size).sum()
    }
}

/// Deletes each subscription in turn. A refusal or failure on one never
/// stops the rest.
///
/// `on_start` runs before a subscription is touched, `on_done` once it has
/// been deleted, partially deleted or refused.
pub fn clean<S, D>(
    subs: Vec<Subscription>,
    paths: &WorkshopPaths,
    mut on_start: S,
    mut on_done: D,
) -> CleanResult
where
    S: FnMut(&Subscription),
    D: FnMut(&Subscription),
{
    let mut deleted = Vec::new();
    let mut partial = Vec::new();
    let mut failed = Vec::new();

    for sub in subs {
        on_start(&sub);
        let outcome = delete_subscription(&sub, paths);
        on_done(&sub);
        match outcome {
            Ok(report) if report.is_complete() => deleted.push(sub),
            Ok(report) => partial.push((sub, report)),
            Err(e) => {
                tracing::warn!(path = %sub.path.display(), error = %e, "subscription not deleted");
                failed.push((sub, e));
            }
        }
    }

    CleanResult {
        deleted,
        partial,
        failed,
    }
}

/// Deletes one subscription directory after checking it sits below the
/// workshop content root.
pub fn delete_subscription(
    sub: &Subscription,
    paths: &WorkshopPaths,
) -> Result<DeletionReport, WorkshopError> {
    check_scope(&sub.path, paths)?;
    let report = delete_tree(&sub.path)?;

    if report.is_complete() {
        tracing::info!(
            path = %sub.path.display(),
            title = %sub.details.title,
            removed = report.removed.len(),
            symlinks = report.symlinks.len(),
            "deleted subscription"
        );
    }
    Ok(report)
}

/// Refuses any path that does not resolve strictly below the workshop
/// content folder, `<steam root>/<marker>`.
fn check_scope(target: &Path, paths: &WorkshopPaths) -> Result<(), WorkshopError> {
    let refuse = |reason: String| WorkshopError::SafetyCheck {
        path: target.to_path_buf(),
        reason,
    };

    // Resolved as a whole so a relocated `steamapps` link still matches.
    let content_root = fs::canonicalize(paths.content_root()).map_err(|e| {
        refuse(format!(
            "failed to resolve workshop content folder {}: {e}",
            paths.content_root().display()
        ))
    })?;

    // Resolve the parent only so a symlinked subscription folder is judged
    // by where the link lives, not where it points.
    let name = target
        .file_name()
        .ok_or_else(|| refuse("path has no final component".to_string()))?;
    let parent = target
        .parent()
        .ok_or_else(|| refuse("path has no parent".to_string()))?;
    let parent = fs::canonicalize(parent)
        .map_err(|e| refuse(format!("failed to resolve path: {e}")))?;
    let resolved = parent.join(name);

    if !resolved.starts_with(&content_root) || resolved == content_root {
        return Err(refuse(format!(
            "not inside workshop content folder {}",
            content_root.display()
        )));
    }

    Ok(())
}

/// Removes `target` and everything below it.
pub fn delete_tree(target: &Path) -> Result<DeletionReport, WorkshopError> {
    delete_tree_with(target, remove_entry)
}

fn remove_entry(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

/// Walks `target` once top-down, then removes the collected paths in
/// reverse so every child goes before its parent.
///
/// A walk failure aborts before anything is removed. A removal failure is
/// recorded and the remaining paths are still attempted.
pub(crate) fn delete_tree_with<F>(target: &Path, mut remove: F) -> Result<DeletionReport, WorkshopError>
where
    F: FnMut(&Path, bool) -> io::Result<()>,
{
    let mut report = DeletionReport::default();
    let mut collected: Vec<(PathBuf, bool)> = Vec::new();

    for entry in WalkDir::new(target)
        .follow_links(false)
        .follow_root_links(false)
    {
        let entry = entry.map_err(|e| WorkshopError::traversal(target, e))?;
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            tracing::warn!(path = %entry.path().display(), "not following symlink");
            report.symlinks.push(entry.path().to_path_buf());
        }
        collected.push((entry.into_path(), file_type.is_dir()));
    }

    for (path, is_dir) in collected.into_iter().rev() {
        match remove(&path, is_dir) {
            Ok(()) => report.removed.push(path),
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "failed to remove");
                report.failures.push(RemovalFailure { path, error });
            }
        }
    }

    Ok(report)
}
