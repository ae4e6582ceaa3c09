//! Pack manifest parsing
//!
//! A pack archive carries a `manifest.json` naming the target game version,
//! its mod loaders, the files to fetch (by numeric project and file id) and
//! the overrides directory to merge into the installation.

pub mod model;
pub mod parser;

// Re-export main types
pub use model::{FileEntry, Manifest, MinecraftTarget, Modloader, FORGE_PREFIX, UNKNOWN_FORGE_VERSION};
pub use parser::{load_manifest, parse_manifest, MANIFEST_FILE_NAME};
