//! Asset-catalog `Contents.json` synchronization.
//!
//! Xcode asset catalogs keep a `Contents.json` next to the images of every
//! image set, listing each file with its device idiom and pixel scale:
//!
//! ```json
//! {
//!   "images": [
//!     { "idiom": "iphone", "filename": "icon-60@2x.png", "scale": "2x" },
//!     { "idiom": "iphone", "filename": "icon-60@3x.png", "scale": "3x" }
//!   ],
//!   "info": { "version": 1, "author": "xcode" }
//! }
//! ```
//!
//! [`ContentsUpdater`] collects the directories that need such a file while
//! images are generated, plus explicit metadata for individual files, and
//! rewrites every collected `Contents.json` in one [`ContentsUpdater::run`]
//! at the end.
//!
//! ## Merge rules
//!
//! - Only non-hidden files with a catalog extension
//!   ([`CATALOG_EXTENSIONS`]) are listed, sorted by file name.
//! - Entries are matched by `filename`. A matched entry keeps any extra keys
//!   it has; its `idiom` and `scale` are overwritten with the file's override
//!   or the default `universal`/`2x`.
//! - Entries for files that are no longer in the directory are dropped.
//! - Top-level keys other than `images` are preserved.
//!
//! Running the update twice on an unchanged directory writes identical bytes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Manifest file name inside each catalog directory.
pub const CONTENTS_FILE_NAME: &str = "Contents.json";

/// Extensions (lowercase, without dot) that get a manifest entry.
pub const CATALOG_EXTENSIONS: &[&str] = &["jpeg", "jpg", "pdf", "png", "tiff"];

#[derive(Error, Debug)]
pub enum ContentsError {
    #[error("IO error in {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Could not serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid file override path: {:?}", .0)]
    InvalidOverride(PathBuf),
}

/// Device class of a catalog entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Idiom {
    Iphone,
    Ipad,
    #[default]
    Universal,
}

impl Idiom {
    pub fn as_str(self) -> &'static str {
        match self {
            Idiom::Iphone => "iphone",
            Idiom::Ipad => "ipad",
            Idiom::Universal => "universal",
        }
    }
}

impl fmt::Display for Idiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Idiom {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iphone" => Ok(Idiom::Iphone),
            "ipad" => Ok(Idiom::Ipad),
            "universal" => Ok(Idiom::Universal),
            other => Err(format!("unknown idiom {other:?}")),
        }
    }
}

/// Pixel density of a catalog entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    #[serde(rename = "1x")]
    X1,
    #[default]
    #[serde(rename = "2x")]
    X2,
    #[serde(rename = "3x")]
    X3,
}

impl Scale {
    pub fn as_str(self) -> &'static str {
        match self {
            Scale::X1 => "1x",
            Scale::X2 => "2x",
            Scale::X3 => "3x",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1x" => Ok(Scale::X1),
            "2x" => Ok(Scale::X2),
            "3x" => Ok(Scale::X3),
            other => Err(format!("unknown scale {other:?}")),
        }
    }
}

/// Idiom and scale for one file. Defaults to `universal`/`2x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EntryMeta {
    pub idiom: Idiom,
    pub scale: Scale,
}

/// One `images` entry.
///
/// `idiom` and `scale` stay strings so existing entries written by other tools
/// (e.g. `"mac"`) still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentsEntry {
    #[serde(default)]
    pub idiom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default)]
    pub scale: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentsEntry {
    fn new(filename: &str, meta: EntryMeta) -> Self {
        let mut entry = Self {
            filename: Some(filename.to_string()),
            ..Self::default()
        };
        entry.apply(meta);
        entry
    }

    fn apply(&mut self, meta: EntryMeta) {
        self.idiom = meta.idiom.to_string();
        self.scale = meta.scale.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentsInfo {
    pub version: u64,
    pub author: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ContentsInfo {
    fn default() -> Self {
        Self {
            version: 1,
            author: "xcode".to_string(),
            extra: Map::new(),
        }
    }
}

/// A whole `Contents.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentsDocument {
    #[serde(default)]
    pub images: Vec<ContentsEntry>,
    #[serde(default)]
    pub info: ContentsInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentsDocument {
    /// Rebuild `images` from the catalog files present in the directory.
    pub fn merge_files<'a, F>(&mut self, files: impl IntoIterator<Item = &'a str>, meta_for: F)
    where
        F: Fn(&str) -> EntryMeta,
    {
        let mut previous = std::mem::take(&mut self.images);
        for file in files {
            let meta = meta_for(file);
            let entry = match previous
                .iter()
                .position(|e| e.filename.as_deref() == Some(file))
            {
                Some(pos) => {
                    let mut existing = previous.remove(pos);
                    existing.apply(meta);
                    existing
                }
                None => ContentsEntry::new(file, meta),
            };
            self.images.push(entry);
        }
    }
}

/// Outcome of [`ContentsUpdater::run`].
#[derive(Debug, Default)]
pub struct SyncSummary {
    /// Directories whose `Contents.json` was written.
    pub updated: Vec<PathBuf>,
    /// Directories left untouched, with the reason.
    pub failed: Vec<(PathBuf, ContentsError)>,
}

impl SyncSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registry of catalog directories and per-file metadata overrides.
#[derive(Debug, Default)]
pub struct ContentsUpdater {
    directories: Vec<PathBuf>,
    overrides: HashMap<PathBuf, EntryMeta>,
}

impl ContentsUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory for the final update. Adding it again is a no-op.
    pub fn add_directory(&mut self, directory: impl Into<PathBuf>) {
        let directory = directory.into();
        if !self.directories.contains(&directory) {
            self.directories.push(directory);
        }
    }

    /// Record explicit metadata for one file, keyed by its absolute path.
    pub fn add_file_override(
        &mut self,
        file: impl Into<PathBuf>,
        meta: EntryMeta,
    ) -> Result<(), ContentsError> {
        let file = file.into();
        if file.as_os_str().is_empty() || !file.is_absolute() {
            tracing::warn!(path = ?file, "ignoring Contents.json override without absolute path");
            return Err(ContentsError::InvalidOverride(file));
        }
        self.overrides.insert(file, meta);
        Ok(())
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    pub fn override_for(&self, file: &Path) -> Option<EntryMeta> {
        self.overrides.get(file).copied()
    }

    /// Update every registered directory. Failures are logged and collected;
    /// they never stop the other directories.
    pub fn run(&self) -> SyncSummary {
        let mut summary = SyncSummary::default();
        for directory in &self.directories {
            match self.update_directory(directory) {
                Ok(()) => summary.updated.push(directory.clone()),
                Err(err) => {
                    tracing::error!(directory = %directory.display(), "{err}");
                    summary.failed.push((directory.clone(), err));
                }
            }
        }
        summary
    }

    /// Rewrite `Contents.json` in one directory.
    pub fn update_directory(&self, directory: &Path) -> Result<(), ContentsError> {
        let path = directory.join(CONTENTS_FILE_NAME);
        let mut document = load_document(&path)?;
        let files = catalog_files(directory)?;

        document.merge_files(files.iter().map(String::as_str), |file| {
            self.override_for(&directory.join(file)).unwrap_or_default()
        });

        let mut json =
            serde_json::to_string_pretty(&document).map_err(|source| ContentsError::Serialize {
                path: path.clone(),
                source,
            })?;
        json.push('\n');
        fs::write(&path, json).map_err(|source| ContentsError::Io { path, source })
    }
}

/// Existing document, or the default skeleton when there is none.
fn load_document(path: &Path) -> Result<ContentsDocument, ContentsError> {
    if !path.exists() {
        return Ok(ContentsDocument::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ContentsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ContentsError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn is_catalog_file(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CATALOG_EXTENSIONS.contains(&e))
}

/// Catalog file names in `directory`, sorted.
fn catalog_files(directory: &Path) -> Result<Vec<String>, ContentsError> {
    let io_err = |source| ContentsError::Io {
        path: directory.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) if is_catalog_file(name) => files.push(name.to_string()),
            _ => {}
        }
    }
    files.sort();
    Ok(files)
}
