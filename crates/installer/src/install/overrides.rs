//! Merge of a pack's overrides tree into the installation
//!
//! Existing destination files always win, so running the merge twice leaves
//! the tree exactly as the first run did. Per-entry failures are recorded in
//! the report instead of stopping the walk.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Copied { bytes: u64 },
    CreatedDirectory,
    /// Destination already present, left untouched
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEntry {
    /// Path relative to the overrides root
    pub path: PathBuf,
    pub outcome: MergeOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub entries: Vec<MergeEntry>,
}

impl MergeReport {
    fn record(&mut self, path: PathBuf, outcome: MergeOutcome) {
        if let MergeOutcome::Failed { error } = &outcome {
            warn!("Could not merge override {}: {}", path.display(), error);
        }
        self.entries.push(MergeEntry { path, outcome });
    }

    pub fn copied(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Copied { .. }))
    }

    pub fn created_directories(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::CreatedDirectory))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Skipped))
    }

    pub fn failures(&self) -> impl Iterator<Item = &MergeEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, MergeOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&MergeOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Copy everything under `source_root` into `dest_root` at the same relative paths
pub fn merge_overrides(source_root: &Path, dest_root: &Path) -> MergeReport {
    let mut report = MergeReport::default();

    if !source_root.is_dir() {
        warn!("Overrides directory {} does not exist, nothing to merge", source_root.display());
        return report;
    }
    if let Err(e) = std::fs::create_dir_all(dest_root) {
        report.record(PathBuf::new(), MergeOutcome::Failed { error: e.to_string() });
        return report;
    }

    for entry in WalkDir::new(source_root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .and_then(|p| p.strip_prefix(source_root).ok())
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                report.record(path, MergeOutcome::Failed { error: e.to_string() });
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(source_root) else {
            continue;
        };
        let target = dest_root.join(relative);

        let outcome = if entry.file_type().is_dir() {
            merge_directory(&target)
        } else {
            merge_file(entry.path(), &target)
        };
        debug!("{} -> {:?}", relative.display(), outcome);
        report.record(relative.to_path_buf(), outcome);
    }

    report
}

fn merge_directory(target: &Path) -> MergeOutcome {
    if target.is_dir() {
        return MergeOutcome::Skipped;
    }
    match std::fs::create_dir_all(target) {
        Ok(()) => MergeOutcome::CreatedDirectory,
        Err(e) => MergeOutcome::Failed { error: e.to_string() },
    }
}

fn merge_file(source: &Path, target: &Path) -> MergeOutcome {
    match copy_new(source, target) {
        Ok(bytes) => MergeOutcome::Copied { bytes },
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => MergeOutcome::Skipped,
        Err(e) => MergeOutcome::Failed { error: e.to_string() },
    }
}

/// Copy `source` to `target`, refusing to replace an existing file
fn copy_new(source: &Path, target: &Path) -> io::Result<u64> {
    let mut input = File::open(source)?;
    let mut output = OpenOptions::new().write(true).create_new(true).open(target)?;

    match io::copy(&mut input, &mut output) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(output);
            // leave nothing half-written behind so a rerun retries the copy
            let _ = std::fs::remove_file(target);
            Err(e)
        }
    }
}
