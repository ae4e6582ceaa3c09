//! Installation module
//!
//! Everything that touches the local tree around the mod downloads: the
//! scratch space and archive extraction, the overrides merge and the
//! optional launcher config.

pub mod archive;
pub mod launcher_config;
pub mod overrides;
pub mod scratch;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use archive::{archive_file_name, extract_archive, ArchiveFetcher};
pub use launcher_config::{emit_launcher_config, render_launcher_config, LAUNCHER_CONFIG_FILE_NAME};
pub use overrides::{merge_overrides, MergeEntry, MergeOutcome, MergeReport};
pub use scratch::{ScratchCleanupGuard, ScratchSpace, DEFAULT_SCRATCH_DIR_NAME};
