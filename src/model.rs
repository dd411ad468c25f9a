use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use std::collections::{BTreeMap, HashMap};
use std::{fs, path::Path};

use crate::error::ModgetError;

/// One search result from the mod repository
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModSummary {
    pub id: u32,
    pub name: String,
    ///Short URL key for the mod, e.g. `jei`
    pub slug: String,
    pub summary: String,
    pub primary_language: String,
}

/// One downloadable build of a mod
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModFile {
    pub download_url: String,
    ///Minecraft versions this build supports
    pub game_versions: Vec<String>,
    ///Upload time, used to pick the newest build out of a set
    pub uploaded: DateTime<Utc>,
    pub dependencies: Vec<FileDependency>,
}

impl ModFile {
    /// The local file name for this build, taken from the last segment of the download URL
    pub fn file_name(&self) -> &str {
        self.download_url
            .rsplit('/')
            .next()
            .unwrap_or(&self.download_url)
    }

    /// Whether this build lists `version` as a supported Minecraft version
    ///
    /// Exact membership only, no version range logic
    pub fn supports(&self, version: impl AsRef<str>) -> bool {
        self.game_versions.iter().any(|v| v == version.as_ref())
    }
}

/// A pointer from one mod file to another addon it depends on
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDependency {
    pub addon_id: u32,
    pub kind: DependencyKind,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    EmbeddedLibrary,
    Optional,
    Required,
    Tool,
    Incompatible,
    Include,
    Unknown,
}

// mc_mods.json

/// Represents a `mc_mods.json` manifest for one version directory
///
/// Only ever read by this crate; producing the file is left to whatever
/// populated the directory.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ModsManifest {
    ///Installed mods keyed by display name
    #[serde(default)]
    pub mods: BTreeMap<String, ManifestEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ManifestEntry {
    pub file: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub _extra: HashMap<String, Value>,
}

impl ModsManifest {
    pub const FILE_NAME: &'static str = "mc_mods.json";

    /// Load the manifest from `dir`, if it exists
    ///
    /// # Errors
    /// * `MissingManifest` if `dir` has no `mc_mods.json`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ModgetError> {
        let path = dir.as_ref().join(Self::FILE_NAME);
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&raw)?)
        } else {
            Err(ModgetError::MissingManifest(path))
        }
    }
}
