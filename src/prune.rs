//! Workspace pruning: reset a generated source tree before regeneration.
//!
//! Two-phase sweep. Phase one deletes every file whose name does not end in
//! the descriptor extension (case-insensitive), so the project descriptor is
//! the only survivor. Phase two removes the directories the file sweep left
//! empty, children before parents.
//!
//! Pruning never fails: a missing directory is a warning, a file or
//! directory that cannot be deleted is logged and skipped, and anything
//! unexpected in either sweep is caught at the top and swallowed. Cleanup is
//! best effort; the generator overwrites whatever remains.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

/// Delete everything under `dir` except files ending in `keep_extension`,
/// then remove the subdirectories left empty, deepest first.
pub fn clean_generated_tree(dir: &Path, keep_extension: &str) {
    if !dir.is_dir() {
        warn!(path = %dir.display(), "Directory does not exist, nothing to prune");
        return;
    }

    if let Err(e) = sweep(dir, keep_extension) {
        error!(
            error = ?e,
            path = %dir.display(),
            "Unexpected failure while pruning directory"
        );
    }
}

fn sweep(dir: &Path, keep_extension: &str) -> io::Result<()> {
    let keep_suffix = keep_extension.to_lowercase();

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    collect(dir, &mut files, &mut dirs)?;

    for file in &files {
        if keeps_descriptor(file, &keep_suffix) {
            continue;
        }
        match fs::remove_file(file) {
            Ok(()) => info!(path = %file.display(), "Deleted file"),
            Err(e) => error!(error = ?e, path = %file.display(), "Failed to delete file"),
        }
    }

    // Children always have more components than their parent, so sorting by
    // component count descending processes them first and a chain of nested
    // empty directories collapses in a single pass.
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

    for subdir in &dirs {
        match is_empty(subdir) {
            Ok(true) => match fs::remove_dir(subdir) {
                Ok(()) => info!(path = %subdir.display(), "Deleted empty directory"),
                Err(e) => {
                    error!(error = ?e, path = %subdir.display(), "Failed to delete directory")
                }
            },
            Ok(false) => {}
            Err(e) => error!(error = ?e, path = %subdir.display(), "Failed to inspect directory"),
        }
    }

    Ok(())
}

/// Recursively gather all files and subdirectories under `dir`. The root
/// itself is not a deletion candidate.
fn collect(dir: &Path, files: &mut Vec<PathBuf>, dirs: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path.clone());
            collect(&path, files, dirs)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn keeps_descriptor(file: &Path, keep_suffix: &str) -> bool {
    file.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase().ends_with(keep_suffix))
        .unwrap_or(false)
}

fn is_empty(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}
