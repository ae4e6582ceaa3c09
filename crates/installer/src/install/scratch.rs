//! Scratch space for downloaded pack archives
//!
//! One root per process, created on first use and reused by every run. Pack
//! directories handed out are remembered so the shell can remove them when
//! the process exits.

use once_cell::sync::{Lazy, OnceCell};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::downloader::core::{FileOperation, PackError, Result};

/// Directory name of the default root inside the system temp dir
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "modpack_dl_temp";

static GLOBAL: Lazy<Arc<ScratchSpace>> =
    Lazy::new(|| Arc::new(ScratchSpace::new(std::env::temp_dir().join(DEFAULT_SCRATCH_DIR_NAME))));

#[derive(Debug)]
pub struct ScratchSpace {
    root: PathBuf,
    created: OnceCell<()>,
    handed_out: Mutex<Vec<PathBuf>>,
}

impl ScratchSpace {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            created: OnceCell::new(),
            handed_out: Mutex::new(Vec::new()),
        }
    }

    /// The process-wide scratch space under the system temp dir
    pub fn global() -> Arc<ScratchSpace> {
        GLOBAL.clone()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_root(&self) -> Result<&Path> {
        self.created.get_or_try_init(|| {
            std::fs::create_dir_all(&self.root)
                .map_err(|e| PackError::file_system(&self.root, FileOperation::CreateDir, e))?;
            info!("Temp directory is {}", self.root.display());
            Ok::<(), PackError>(())
        })?;
        Ok(&self.root)
    }

    /// Directory reserved for `pack_name`, created if needed
    pub fn pack_dir(&self, pack_name: &str) -> Result<PathBuf> {
        if pack_name.is_empty() || pack_name == "." || pack_name == ".." || pack_name.contains(['/', '\\']) {
            return Err(PackError::FilenamePatternMismatch {
                url: pack_name.to_string(),
                reason: "pack name cannot be used as a directory name".to_string(),
            });
        }

        let dir = self.ensure_root()?.join(pack_name);
        std::fs::create_dir_all(&dir).map_err(|e| PackError::file_system(&dir, FileOperation::CreateDir, e))?;

        if let Ok(mut handed_out) = self.handed_out.lock() {
            if !handed_out.contains(&dir) {
                handed_out.push(dir.clone());
            }
        }
        Ok(dir)
    }

    /// Remove every pack directory handed out so far; failures are only logged
    pub fn cleanup(&self) -> usize {
        let dirs = match self.handed_out.lock() {
            Ok(mut handed_out) => std::mem::take(&mut *handed_out),
            Err(_) => return 0,
        };

        let mut removed = 0;
        for dir in dirs {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {
                    debug!("Removed scratch dir {}", dir.display());
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove scratch dir {}: {}", dir.display(), e),
            }
        }
        removed
    }

    /// Guard that runs [`ScratchSpace::cleanup`] when dropped
    pub fn cleanup_guard(self: &Arc<Self>) -> ScratchCleanupGuard {
        ScratchCleanupGuard { space: self.clone() }
    }
}

/// Held by the shell for the lifetime of the process
#[derive(Debug)]
pub struct ScratchCleanupGuard {
    space: Arc<ScratchSpace>,
}

impl Drop for ScratchCleanupGuard {
    fn drop(&mut self) {
        self.space.cleanup();
    }
}
