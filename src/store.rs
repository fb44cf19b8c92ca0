use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::artifact::{self, ArtifactKind, SnapshotIdentity};
use crate::error::SnapshotError;
use crate::pixel_buffer::PixelBuffer;

#[derive(Clone, Debug)]
pub struct Params {
    pub reference_dir: PathBuf,
    pub scratch_dir: PathBuf,
}

/// Reads and writes snapshots as PNG files.
///
/// Reference images go under the reference directory, failed/diff images
/// under the scratch directory.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    params: Params,
}

impl SnapshotStore {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn reference_dir(&self) -> &Path {
        &self.params.reference_dir
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.params.scratch_dir
    }

    pub fn path_for(&self, identity: &SnapshotIdentity, kind: ArtifactKind, scale: u16) -> PathBuf {
        let base_dir = match kind {
            ArtifactKind::Reference => &self.params.reference_dir,
            ArtifactKind::Failed | ArtifactKind::Diff => &self.params.scratch_dir,
        };
        artifact::compute(identity, kind, scale, base_dir)
    }

    /// Encodes `buffer` into `path`, overwriting it. Parent directories are
    /// created on every call.
    pub fn write(&self, buffer: &PixelBuffer, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SnapshotError::io(parent, e))?;
        }

        let encoded = buffer.to_encoded_bytes()?;
        fs::write(path, encoded).map_err(|e| SnapshotError::io(path, e))?;
        log::debug!("wrote {:?} to {:?}", buffer, path);
        Ok(())
    }

    /// Loads the image at `path`. Anything that keeps it from being loaded,
    /// whether absent, unreadable or undecodable, is `ReferenceMissing`.
    pub fn read(&self, path: &Path) -> Result<PixelBuffer, SnapshotError> {
        let missing = |reason: Option<String>| SnapshotError::ReferenceMissing {
            path: path.to_owned(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => missing(None),
            _ => missing(Some(e.to_string())),
        })?;

        let buffer = PixelBuffer::from_encoded_bytes(&bytes).map_err(|e| match e {
            SnapshotError::Decode(reason) => missing(Some(reason)),
            e => e,
        })?;
        log::debug!("loaded {:?} from {:?}", buffer, path);
        Ok(buffer)
    }
}
