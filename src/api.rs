use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::ModgetError,
    model::{DependencyKind, FileDependency, ModFile, ModSummary},
};

const BASE_URL: &str = "https://addons-ecs.forgesvc.net/api/v2";
///CurseForge game id for Minecraft
const GAME_ID_MINECRAFT: &str = "432";
///CurseForge section id for mods (as opposed to modpacks, worlds, ...)
const SECTION_MODS: &str = "6";
///Sort search results by popularity
const SORT_POPULARITY: &str = "5";

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct AddonSearchHit {
    id: u32,
    name: String,
    slug: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    primary_language: Option<String>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct AddonFile {
    download_url: String,
    file_date: DateTime<Utc>,
    #[serde(default)]
    game_version: Vec<String>,
    #[serde(default)]
    dependencies: Vec<AddonDependency>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct AddonDependency {
    addon_id: u32,
    #[serde(rename = "type")]
    kind: u32,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

/// Search the mod section for `filter`, restricted to builds for `game_version`
///
/// Results come back in the repository's popularity order.
/// # Errors
/// * IO errors
/// * Unexpected response format from CurseForge
pub fn search_mods(filter: &str, game_version: &str) -> Result<Vec<ModSummary>, ModgetError> {
    let raw = ureq::get(&format!("{BASE_URL}/addon/search"))
        .query("gameId", GAME_ID_MINECRAFT)
        .query("sectionId", SECTION_MODS)
        .query("sort", SORT_POPULARITY)
        .query("searchFilter", filter)
        .query("gameVersion", game_version)
        .set("accept", "application/json")
        .call()?;
    let parsed: Vec<AddonSearchHit> = serde_json::from_str(&raw.into_string()?)?;

    Ok(map_search(&parsed))
}

/// List every file published for an addon
/// # Errors
/// * IO errors
/// * Unexpected response format from CurseForge
pub fn get_mod_files(addon_id: u32) -> Result<Vec<ModFile>, ModgetError> {
    let raw = ureq::get(&format!("{BASE_URL}/addon/{addon_id}/files"))
        .set("accept", "application/json")
        .call()?;
    let parsed: Vec<AddonFile> = serde_json::from_str(&raw.into_string()?)?;

    Ok(map_files(&parsed))
}

/// Download `url` to `dest`, truncating any file already there
///
/// Returns the number of bytes written.
/// # Errors
/// * `DownloadError` tagged with `url` for transport failures, bad statuses,
///   and write failures
pub fn download_file(url: &str, dest: impl AsRef<Path>) -> Result<u64, ModgetError> {
    let dest = dest.as_ref();
    debug!("Starting download from {}", url);
    let res = ureq::get(url)
        .call()
        .map_err(|e| ModgetError::download(url, e.into()))?;

    let mut reader = res.into_reader();
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dest)
        .map_err(|e| ModgetError::download(url, e.into()))?;
    let written =
        io::copy(&mut reader, &mut file).map_err(|e| ModgetError::download(url, e.into()))?;
    debug!("Finished download to {}", dest.display());

    Ok(written)
}

fn map_search(res: &[AddonSearchHit]) -> Vec<ModSummary> {
    res.iter()
        .map(|e| ModSummary {
            id: e.id,
            name: e.name.clone(),
            slug: e.slug.clone(),
            summary: e.summary.clone(),
            primary_language: e
                .primary_language
                .clone()
                .unwrap_or_else(|| "enUS".to_string()),
        })
        .collect()
}

fn map_files(res: &[AddonFile]) -> Vec<ModFile> {
    res.iter()
        .map(|e| ModFile {
            download_url: e.download_url.clone(),
            game_versions: e.game_version.clone(),
            uploaded: e.file_date,
            dependencies: e
                .dependencies
                .iter()
                .map(|d| FileDependency {
                    addon_id: d.addon_id,
                    kind: map_dependency_kind(d.kind),
                })
                .collect(),
        })
        .collect()
}

fn map_dependency_kind(kind: u32) -> DependencyKind {
    match kind {
        1 => DependencyKind::EmbeddedLibrary,
        2 => DependencyKind::Optional,
        3 => DependencyKind::Required,
        4 => DependencyKind::Tool,
        5 => DependencyKind::Incompatible,
        6 => DependencyKind::Include,
        _ => DependencyKind::Unknown,
    }
}

/// The remote side of an install: file listings, dependency groups, and byte
/// transfer. Split out so the installer can run against a double in tests.
#[cfg_attr(test, mockall::automock)]
pub trait ModRepository {
    /// Every file published for the addon with `addon_id`
    fn mod_files(&self, addon_id: u32) -> Result<Vec<ModFile>, ModgetError>;
    /// One group of candidate files per required dependency of `file`
    fn dependency_groups(&self, file: &ModFile) -> Result<Vec<Vec<ModFile>>, ModgetError>;
    /// Fetch `url` into `dest`, overwriting
    fn download_to(&self, url: &str, dest: &Path) -> Result<u64, ModgetError>;
}

/// `ModRepository` backed by the CurseForge addon API
#[derive(Clone, Copy, Debug, Default)]
pub struct CurseClient;

impl ModRepository for CurseClient {
    fn mod_files(&self, addon_id: u32) -> Result<Vec<ModFile>, ModgetError> {
        get_mod_files(addon_id)
    }

    fn dependency_groups(&self, file: &ModFile) -> Result<Vec<Vec<ModFile>>, ModgetError> {
        Ok(collect_dependency_groups(file, get_mod_files))
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64, ModgetError> {
        download_file(url, dest)
    }
}

/// One group of candidate files per required dependency of `file`, fetched
/// through `lookup`
///
/// A failing lookup only loses its own group: the failure is logged and the
/// remaining dependencies still resolve.
fn collect_dependency_groups<F>(file: &ModFile, mut lookup: F) -> Vec<Vec<ModFile>>
where
    F: FnMut(u32) -> Result<Vec<ModFile>, ModgetError>,
{
    let mut groups = vec![];
    for dep in file
        .dependencies
        .iter()
        .filter(|d| d.kind == DependencyKind::Required)
    {
        match lookup(dep.addon_id) {
            Ok(group) => groups.push(group),
            Err(e) => warn!(
                "Couldn't list files for dependency {} of {}: {}",
                dep.addon_id,
                file.file_name(),
                e
            ),
        }
    }
    groups
}
