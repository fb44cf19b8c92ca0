use std::path::PathBuf;

use thiserror::Error;

use crate::compare::LayoutMismatch;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("cannot capture an image with zero {axis} (requested {width}x{height})")]
    EmptyDimension {
        axis: &'static str,
        width: u32,
        height: u32,
    },
    #[error("pixel data of {len} bytes does not fit {height} rows of {bytes_per_row} bytes for a {width}px wide {format:?} image")]
    InvalidLayout {
        width: u32,
        height: u32,
        bytes_per_row: usize,
        format: crate::PixelFormat,
        len: usize,
    },
    /// The reference could not be loaded. `reason` is `None` when the file
    /// does not exist, otherwise it says why reading or decoding failed.
    #[error("cannot load reference image {path:?}{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    ReferenceMissing {
        path: PathBuf,
        reason: Option<String>,
    },
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("cannot encode image: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("i/o error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reference was produced with incompatible rendering settings: {0}")]
    IncompatibleLayout(#[from] LayoutMismatch),
    #[error("renderer failed: {0}")]
    Render(String),
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Set the {} environment variable to point to the reference image directory.",
        crate::config::REFERENCE_DIR_VAR
    )]
    MissingReferenceDir,
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid duration {value:?}: {source}")]
    InvalidDuration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },
}
