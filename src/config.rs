use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::Color;

const DEFAULT_CONFIG_PATH: &str = concat!(crate::prog_name!(), ".config");
const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_millis(50);

/// Names the directory holding reference images. Required.
pub const REFERENCE_DIR_VAR: &str = "SNAPSHOT_REFERENCE_IMAGES";
/// Overrides where failed/diff images are written.
pub const SCRATCH_DIR_VAR: &str = "SNAPSHOT_SCRATCH_DIR";
/// Overrides the config file location.
pub const CONFIG_PATH_VAR: &str = "VIEWSNAP_CONFIG";

mod params;

#[derive(Default, Deserialize, Debug)]
pub struct Config {
    #[serde(skip)]
    reference_dir: Option<PathBuf>,
    scratch_dir: Option<PathBuf>,
    settle_timeout: Option<String>,

    compare: Option<Compare>,
    diff: Option<Diff>,
}

#[derive(Deserialize, Debug)]
struct Compare {
    fuzzy: Option<bool>,
    channel_tolerance: Option<u8>,
    max_differing_pixels: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct Diff {
    mismatch_color: Option<Color>,
    missing_color: Option<Color>,
    dim_matching: Option<bool>,
}

fn config_path() -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix(crate::prog_name!())
        .map_err(|e| log::warn!("failed to get xdg dirs: {}", e))
        .ok()?
        .find_config_file(DEFAULT_CONFIG_PATH)
}

impl Config {
    /// Reads the config file at `path`, or at the default xdg location when
    /// `path` is `None`. A missing default file yields the default config.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match path.or_else(config_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path, source })?;
        content.parse()
    }

    /// Loads the config file and applies the process environment. The
    /// reference directory must be set through [`REFERENCE_DIR_VAR`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Self::path_from_env())?.with_env()
    }

    /// Config file location given through [`CONFIG_PATH_VAR`], if any.
    pub fn path_from_env() -> Option<PathBuf> {
        std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from)
    }

    /// Applies the directories given through the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.apply_env(|name| std::env::var_os(name))
    }

    fn apply_env(mut self, var: impl Fn(&str) -> Option<OsString>) -> Result<Self, ConfigError> {
        let reference_dir = var(REFERENCE_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .ok_or(ConfigError::MissingReferenceDir)?;
        self.reference_dir = Some(reference_dir.into());

        if let Some(scratch_dir) = var(SCRATCH_DIR_VAR).filter(|dir| !dir.is_empty()) {
            self.scratch_dir = Some(scratch_dir.into());
        }
        Ok(self)
    }

    pub fn with_reference_dir(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            reference_dir: Some(dir.into()),
            ..self
        }
    }

    pub fn with_scratch_dir(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: Some(dir.into()),
            ..self
        }
    }

    pub fn reference_dir(&self) -> Result<&Path, ConfigError> {
        self.reference_dir
            .as_deref()
            .ok_or(ConfigError::MissingReferenceDir)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn settle_timeout(&self) -> Result<Duration, ConfigError> {
        match &self.settle_timeout {
            Some(value) => humantime::parse_duration(value).map_err(|source| {
                ConfigError::InvalidDuration {
                    value: value.clone(),
                    source,
                }
            }),
            None => Ok(DEFAULT_SETTLE_TIMEOUT),
        }
    }

    pub fn param<T>(&self) -> T
    where
        T: for<'a> From<&'a Self>,
    {
        self.into()
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
