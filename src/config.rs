//! Configuration document loading.
//!
//! The configuration is a single document, `appig.json` by default, living in
//! the configuration directory. Source paths in rules are resolved against
//! that directory.
//!
//! ```json
//! {
//!   "options": { "rootPath": "out", "createContentsJson": true },
//!   "rules": {
//!     "ios:icon":   { "sourceFile": "icon.png", "images": [ ... ] },
//!     "ios:splash": { "sourceFiles": ["a.png", "b.png"], "images": [ ... ] }
//!   }
//! }
//! ```
//!
//! A TOML document with the same shape is accepted when the file ends in
//! `.toml`. Key order is preserved in both formats: the order of `rules` is the
//! order they run in.
//!
//! Rule fields are deliberately lenient. Missing strings load as empty and
//! missing lists load as empty, so problems show up as validation violations
//! (see [`crate::validation`]) instead of load failures. A rule whose value
//! cannot be read at all loads as [`Rule::default`], which never validates.

use crate::contents::{EntryMeta, Idiom, Scale};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up when no configuration file is given.
pub const DEFAULT_CONFIG_FILE: &str = "appig.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("No directory given")]
    NoDirectory,
    #[error("No such directory: {}", .0.display())]
    NoSuchDirectory(PathBuf),
    #[error("The path: {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("No such file: {}", .0.display())]
    NoSuchFile(PathBuf),
    #[error("The path: {} is not a file", .0.display())]
    NotAFile(PathBuf),
}

/// Generator-level options from the `options` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Root for all target paths. Relative values are resolved against the
    /// working directory.
    pub root_path: Option<PathBuf>,
    /// Write a `Contents.json` into every output directory, using
    /// `universal`/`2x` unless a rule or image says otherwise.
    pub create_contents_json: bool,
}

/// Requested `Contents.json` metadata, as written in the document.
///
/// Kept as raw strings so that a typo is a validation violation rather than a
/// load error. [`ContentsConfig::meta`] gives the typed form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentsConfig {
    pub idiom: String,
    pub scale: String,
}

impl ContentsConfig {
    pub fn new(idiom: Idiom, scale: Scale) -> Self {
        Self {
            idiom: idiom.to_string(),
            scale: scale.to_string(),
        }
    }

    /// Typed metadata, or `None` when either value is outside its enumeration.
    pub fn meta(&self) -> Option<EntryMeta> {
        Some(EntryMeta {
            idiom: self.idiom.parse().ok()?,
            scale: self.scale.parse().ok()?,
        })
    }
}

/// Whether a composed overlay is drawn over or under the generated image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Top,
    Below,
}

/// A second image composited onto the generated one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposeOptions {
    /// Overlay path, relative to the directory of the rule's source image.
    pub compose_image: String,
    pub top_or_below: Placement,
    /// Overlay size as `WxH`.
    pub size: Option<String>,
    pub offset_x: Option<i64>,
    pub offset_y: Option<i64>,
}

/// One output image of a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageSpec {
    pub file_name: String,
    pub target_path: String,
    /// Output size as `WxH`.
    pub size: String,
    /// Stretch to `size` instead of center-cropping to its aspect ratio.
    pub no_crop: bool,
    pub colorize: Option<String>,
    pub fill_color: Option<String>,
    pub compose: Option<ComposeOptions>,
    /// Literal replacements applied to the target path, in document order.
    /// Entries whose value is not a string are ignored.
    pub replace_in_target_name: Map<String, Value>,
    pub create_contents_json: Option<ContentsConfig>,
}

/// A named mapping from source image(s) to output images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rule {
    /// Falls back to the rule's key in the document.
    pub name: String,
    pub source_file: String,
    /// When non-empty, every image is generated once per entry.
    pub source_files: Vec<String>,
    pub images: Vec<ImageSpec>,
    pub create_contents_json: Option<ContentsConfig>,
}

impl Rule {
    /// Human-readable label for diagnostics.
    pub fn label(&self) -> &str {
        if !self.source_file.is_empty() {
            &self.source_file
        } else if let Some(first) = self.source_files.first() {
            first
        } else if !self.name.is_empty() {
            &self.name
        } else {
            "(unnamed rule)"
        }
    }

    pub fn has_many_sources(&self) -> bool {
        !self.source_files.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    options: Value,
    #[serde(default)]
    rules: Value,
}

/// A loaded configuration document.
#[derive(Debug, Clone)]
pub struct Configuration {
    directory: PathBuf,
    path: Option<PathBuf>,
    options: GeneratorConfig,
    rules: Map<String, Value>,
}

impl Configuration {
    /// Locate and load the configuration document.
    ///
    /// `directory` is resolved against the working directory when relative.
    /// Without `file_name`, [`DEFAULT_CONFIG_FILE`] is used. A name without a
    /// `.json`/`.toml` extension that does not exist on disk is retried with
    /// `.json` and then `.toml` appended.
    pub fn load(directory: &Path, file_name: Option<&str>) -> Result<Self, ConfigError> {
        let path = locate(directory, file_name)?;
        let content = fs::read_to_string(&path)?;
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::NotAFile(path.clone()))?;

        let mut config = if is_toml(&path) {
            Self::from_toml_str(&directory, &content)?
        } else {
            Self::from_json_str(&directory, &content)?
        };
        tracing::debug!(path = %path.display(), rules = config.rules.len(), "loaded configuration");
        config.path = Some(path);
        Ok(config)
    }

    pub fn from_json_str(directory: &Path, content: &str) -> Result<Self, ConfigError> {
        let raw: RawDocument = serde_json::from_str(content)?;
        Ok(Self::from_raw(directory, raw))
    }

    pub fn from_toml_str(directory: &Path, content: &str) -> Result<Self, ConfigError> {
        let value: toml::Value = toml::from_str(content)?;
        let raw: RawDocument = serde_json::from_value(serde_json::to_value(value)?)?;
        Ok(Self::from_raw(directory, raw))
    }

    fn from_raw(directory: &Path, raw: RawDocument) -> Self {
        let options = match raw.options {
            Value::Null => GeneratorConfig::default(),
            value => serde_json::from_value(value).unwrap_or_else(|err| {
                tracing::warn!("ignoring malformed options: {err}");
                GeneratorConfig::default()
            }),
        };
        let rules = match raw.rules {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                tracing::warn!("`rules` is not a table, no rules loaded");
                Map::new()
            }
        };
        Self {
            directory: directory.to_path_buf(),
            path: None,
            options,
            rules,
        }
    }

    /// Directory that relative source paths are joined onto.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The document this configuration was read from, if it came from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn generator_config(&self) -> &GeneratorConfig {
        &self.options
    }

    /// Rule keys in document order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// The rule stored under `name`, or the default (invalid) rule.
    pub fn config_for_rule(&self, name: &str) -> Rule {
        if name.is_empty() {
            return Rule::default();
        }
        self.rules
            .get(name)
            .map(|value| parse_rule(name, value))
            .unwrap_or_default()
    }

    /// All rules whose key starts with `prefix`, in document order.
    ///
    /// An empty (or all-whitespace) prefix matches nothing.
    pub fn config_for_generic_rules(&self, prefix: &str) -> Vec<Rule> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.rules
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| parse_rule(key, value))
            .collect()
    }

    /// Every rule, in document order.
    pub fn config_for_all_rules(&self) -> Vec<Rule> {
        self.rules
            .iter()
            .map(|(key, value)| parse_rule(key, value))
            .collect()
    }
}

fn parse_rule(key: &str, value: &Value) -> Rule {
    if !value.is_object() {
        tracing::warn!(rule = key, "rule is not a table");
        return Rule::default();
    }
    match Rule::deserialize(value) {
        Ok(mut rule) => {
            if rule.name.is_empty() {
                rule.name = key.to_string();
            }
            rule
        }
        Err(err) => {
            tracing::warn!(rule = key, "cannot read rule: {err}");
            Rule::default()
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

fn has_config_extension(name: &str) -> bool {
    name.ends_with(".json") || name.ends_with(".toml")
}

/// Resolve the configuration directory and file name to an existing file.
fn locate(directory: &Path, file_name: Option<&str>) -> Result<PathBuf, ConfigError> {
    if directory.as_os_str().is_empty() {
        return Err(ConfigError::NoDirectory);
    }
    let directory = if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        std::env::current_dir()?.join(directory)
    };
    if !directory.exists() {
        return Err(ConfigError::NoSuchDirectory(directory));
    }
    if !directory.is_dir() {
        return Err(ConfigError::NotADirectory(directory));
    }

    let file_name = file_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_CONFIG_FILE);
    let mut path = directory.join(file_name);

    if !has_config_extension(file_name) && !path.exists() {
        for ext in ["json", "toml"] {
            let candidate = directory.join(format!("{file_name}.{ext}"));
            if candidate.exists() {
                path = candidate;
                break;
            }
        }
    }

    if !path.exists() {
        return Err(ConfigError::NoSuchFile(path));
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path));
    }
    Ok(path)
}
