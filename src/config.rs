//! Pipeline configuration.
//!
//! Stored as a JSON object on disk, every key optional:
//! ```json
//! {
//!   "source_path": "dados/156_2024.csv",
//!   "delimiter": ";",
//!   "encoding": "latin1",
//!   "target_year": 2024
//! }
//! ```
//! Environment variables `EMLURB_SOURCE_PATH` and `EMLURB_TARGET_YEAR`
//! override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET_YEAR: i32 = 2024;

/// Character encoding of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEncoding {
    #[default]
    #[serde(alias = "latin-1", alias = "iso-8859-1")]
    Latin1,
    #[serde(alias = "utf-8")]
    Utf8,
}

impl SourceEncoding {
    pub fn name(self) -> &'static str {
        match self {
            SourceEncoding::Latin1 => "ISO-8859-1",
            SourceEncoding::Utf8 => "UTF-8",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_path: PathBuf,
    #[serde(deserialize_with = "ascii_delimiter")]
    pub delimiter: u8,
    pub encoding: SourceEncoding,
    pub target_year: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("dados/156_2024.csv"),
            delimiter: b';',
            encoding: SourceEncoding::Latin1,
            target_year: DEFAULT_TARGET_YEAR,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Applies `EMLURB_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup("EMLURB_SOURCE_PATH") {
            self.source_path = PathBuf::from(path);
        }
        if let Some(year) = lookup("EMLURB_TARGET_YEAR") {
            self.target_year = year
                .trim()
                .parse()
                .with_context(|| format!("EMLURB_TARGET_YEAR is not a year: `{year}`"))?;
        }
        Ok(self)
    }
}

fn ascii_delimiter<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(serde::de::Error::custom(format!(
            "delimiter must be a single ASCII character, got `{s}`"
        ))),
    }
}
