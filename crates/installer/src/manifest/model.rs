//! Pack manifest data model
//!
//! Field names follow the JSON document; everything except `files` may be
//! absent and then takes its empty/zero value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Forge loader ids look like `forge-14.23.5.2768`
pub const FORGE_PREFIX: &str = "forge-";

/// Reported when no Forge loader is listed
pub const UNKNOWN_FORGE_VERSION: &str = "Unknown";

/// Authoritative description of a pack; immutable once parsed
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(rename = "minecraft", default)]
    pub minecraft: MinecraftTarget,

    #[serde(rename = "manifestType", default)]
    pub manifest_type: String,

    #[serde(rename = "manifestVersion", default, deserialize_with = "string_or_number")]
    pub manifest_version: String,

    #[serde(rename = "name", default)]
    pub name: String,

    #[serde(rename = "version", default)]
    pub version: String,

    #[serde(rename = "author", default)]
    pub author: String,

    #[serde(rename = "projectID", default)]
    pub project_id: u32,

    /// Download order is document order
    #[serde(rename = "files")]
    pub files: Vec<FileEntry>,

    /// Archive-relative directory merged into the installation
    #[serde(rename = "overrides", default)]
    pub overrides: String,
}

impl Manifest {
    /// Version of the first `forge-` loader, or [`UNKNOWN_FORGE_VERSION`]
    pub fn forge_version(&self) -> &str {
        self.minecraft
            .mod_loaders
            .iter()
            .find_map(|loader| loader.id.strip_prefix(FORGE_PREFIX))
            .unwrap_or(UNKNOWN_FORGE_VERSION)
    }

    /// `"<name> <version>"` as shown to users and launchers
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

/// Target game version and its loaders
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MinecraftTarget {
    #[serde(rename = "version", default)]
    pub version: String,

    #[serde(rename = "modLoaders", default)]
    pub mod_loaders: Vec<Modloader>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Modloader {
    #[serde(rename = "id", default)]
    pub id: String,

    #[serde(rename = "primary", default)]
    pub primary: bool,
}

/// One required file, addressed by project and file id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileEntry {
    #[serde(rename = "projectID", default)]
    pub project_id: u32,

    #[serde(rename = "fileID", default)]
    pub file_id: u32,

    /// Informational only; optional entries are downloaded too
    #[serde(rename = "required", default)]
    pub required: bool,
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.file_id)
    }
}

/// Pack tools write `manifestVersion` both as `1` and as `"1"`
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_with_loaders(ids: &[&str]) -> Manifest {
        Manifest {
            minecraft: MinecraftTarget {
                version: "1.12.2".to_string(),
                mod_loaders: ids
                    .iter()
                    .map(|id| Modloader { id: id.to_string(), primary: true })
                    .collect(),
            },
            manifest_type: String::new(),
            manifest_version: String::new(),
            name: "Pack".to_string(),
            version: "1.0".to_string(),
            author: String::new(),
            project_id: 0,
            files: Vec::new(),
            overrides: String::new(),
        }
    }

    #[test]
    fn forge_version_strips_prefix() {
        let manifest = manifest_with_loaders(&["forge-14.23.5.2768"]);
        assert_eq!(manifest.forge_version(), "14.23.5.2768");
    }

    #[test]
    fn forge_version_unknown_without_loaders() {
        assert_eq!(manifest_with_loaders(&[]).forge_version(), "Unknown");
    }

    #[test]
    fn forge_version_skips_other_loaders() {
        let manifest = manifest_with_loaders(&["fabric-0.14.0", "forge-36.2.39"]);
        assert_eq!(manifest.forge_version(), "36.2.39");
    }

    #[test]
    fn file_entry_displays_ids() {
        let entry = FileEntry { project_id: 100, file_id: 200, required: true };
        assert_eq!(entry.to_string(), "100/200");
    }
}
