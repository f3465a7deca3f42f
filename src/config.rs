use serde::Deserialize;

use std::path::{Path, PathBuf};
use std::thread;

use crate::errors::*;
use crate::patterns::*;
use crate::pool::FailurePolicy;

/// Settings for one counting run.
///
/// Every field has a default, so a YAML config file only needs the fields it changes:
/// ```yaml
/// patterns:
///   - "****CG****"
///   - "**CG**"
/// seq_dir: seq
/// workers: 8
/// failure_policy: abort
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub patterns: Vec<String>,
    pub anchor: String,
    pub seq_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Input files are `seq_dir/*.{extension}`.
    pub extension: String,
    pub workers: usize,
    pub max_wildcards: usize,
    pub failure_policy: FailurePolicy,
    pub motif_breakdown: bool,
    pub compress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            anchor: DEFAULT_ANCHOR.to_owned(),
            seq_dir: PathBuf::from("seq"),
            out_dir: PathBuf::from("sequin_results"),
            extension: "fasta".to_owned(),
            workers: default_workers(),
            max_wildcards: DEFAULT_MAX_WILDCARDS,
            failure_policy: FailurePolicy::default(),
            motif_breakdown: false,
            compress: false,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &[u8]) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(yaml)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::Config {
            file: path.to_owned(),
            source: Box::new(e),
        })?;
        Self::from_yaml(&bytes).map_err(|e| Error::Config {
            file: path.to_owned(),
            source: Box::new(e),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.patterns.is_empty() {
            return Err(Error::InvalidConfig("no patterns given".to_owned()));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfig(
                "number of workers must be greater than zero".to_owned(),
            ));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(Error::InvalidConfig("file extension is empty".to_owned()));
        }
        check_anchor(&self.anchor)
    }
}

pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
