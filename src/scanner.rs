//! Dotfile discovery: walks a subtree looking for registration files.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use crate::DOTFILE;

/// Find registration files under `start`.
///
/// Non-recursive mode looks at `start` and its immediate children only, so
/// it returns at most the one registration file at the project root.
/// Recursive mode collects every registration file anywhere in the subtree.
///
/// A non-existent `start` yields an empty result, and walk failures on
/// individual entries are skipped the same way — a tracked project may have
/// been deleted since it was last indexed.
#[must_use]
pub fn scan(start: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(start);
    // The files we want are dotfiles and frequently gitignored, so every
    // standard filter works against us.
    builder.standard_filters(false);
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut found = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(start = %start.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_some_and(|ft| ft.is_file()) && entry.file_name() == DOTFILE {
            found.push(entry.into_path());
        }
    }
    debug!(start = %start.display(), recursive, count = found.len(), "scan complete");
    found
}
