// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating and relocating the package the tool produced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Where to look for a produced package
pub struct ArtifactSearch<'a> {
    pub root: &'a Path,
    /// File name suffix identifying a package, e.g. `.difypkg`
    pub extension: &'a str,
    /// Subtrees never searched (uploaded inputs, already relocated outputs)
    pub exclude: &'a [&'a Path],
    /// Ignore files last modified before this instant
    pub modified_since: Option<SystemTime>,
}

impl ArtifactSearch<'_> {
    /// Most recently modified matching file, if any.
    ///
    /// Unreadable directories and entries are skipped rather than failing
    /// the search.
    pub fn find(&self) -> Option<PathBuf> {
        let walker = WalkDir::new(self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.exclude.iter().any(|ex| e.path().starts_with(ex)));

        let mut best: Option<(SystemTime, PathBuf)> = None;
        for entry in walker.filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(self.extension));
            if !matches {
                continue;
            }
            let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
                continue;
            };
            if self.modified_since.is_some_and(|since| modified < since) {
                continue;
            }
            if best.as_ref().map_or(true, |(t, _)| modified > *t) {
                best = Some((modified, entry.into_path()));
            }
        }
        best.map(|(_, path)| path)
    }
}

/// Move `artifact` into `output_dir`, keeping its file name.
///
/// Falls back to copy-then-remove when a rename is not possible (for
/// example across filesystems).
pub fn relocate(artifact: &Path, output_dir: &Path) -> io::Result<PathBuf> {
    let file_name = artifact.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "artifact path has no file name")
    })?;
    fs::create_dir_all(output_dir)?;
    let dest = output_dir.join(file_name);

    if fs::rename(artifact, &dest).is_err() {
        fs::copy(artifact, &dest)?;
        fs::remove_file(artifact)?;
    }
    Ok(dest)
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
