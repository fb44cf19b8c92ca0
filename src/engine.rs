use std::convert::TryFrom;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use crate::artifact::{ArtifactKind, SnapshotIdentity};
use crate::case::SnapshotTestCase;
use crate::compare::{self, Comparator, DiffParams, Verdict};
use crate::config::Config;
use crate::error::{ConfigError, SnapshotError};
use crate::pixel_buffer::PixelBuffer;
use crate::render::{Renderer, Size};
use crate::report::{Reporter, SourceLocation};
use crate::store::{self, SnapshotStore};

/// Whether a snapshot call (re)writes the reference or checks against it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    Record,
    #[default]
    Verify,
}

#[derive(Clone, Debug)]
pub struct Params {
    pub store: store::Params,
    pub compare: compare::Params,
    pub diff: DiffParams,
    pub settle_timeout: Duration,
}

#[derive(Debug)]
pub enum Outcome {
    /// The reference was written. Never counts as a pass.
    Recorded { path: PathBuf },
    Matched,
    Failed(Failure),
}

#[derive(Debug)]
pub struct Failure {
    pub verdict: Verdict,
    pub message: String,
    pub reference: PathBuf,
    pub failed: Option<PathBuf>,
    pub diff: Option<PathBuf>,
}

impl Outcome {
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::Recorded { .. } => None,
            Self::Matched => Some(Verdict::Match),
            Self::Failed(failure) => Some(failure.verdict),
        }
    }

    /// Message to fail the test with, if any. Recording always fails so that
    /// a test is never considered verified by a run that wrote its reference.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Recorded { path } => Some(format!(
                "Recorded new reference image at \"{}\". Switch the test to verify mode to compare against it.",
                path.display()
            )),
            Self::Matched => None,
            Self::Failed(failure) => Some(failure.message.clone()),
        }
    }
}

/// Runs one snapshot through record or verify. Holds no state between calls,
/// so calls for distinct identities are independent of each other.
#[derive(Clone, Debug)]
pub struct SnapshotEngine {
    store: SnapshotStore,
    comparator: Comparator,
    diff: DiffParams,
    settle_timeout: Duration,
}

impl SnapshotEngine {
    pub fn new(params: Params) -> Self {
        Self {
            store: SnapshotStore::new(params.store),
            comparator: Comparator::new(params.compare),
            diff: params.diff,
            settle_timeout: params.settle_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Params::try_from(config).map(Self::new)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_config(&Config::from_env()?)
    }

    /// Like [`SnapshotEngine::from_env`], but terminates the process with a
    /// descriptive message when the environment is not set up.
    pub fn from_env_or_exit() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            log::error!("{}", e);
            eprintln!("{}: {}", crate::prog_name!(), e);
            std::process::exit(2)
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    /// Renders `element` and records or verifies it, as the test case's mode says.
    pub fn snapshot<R>(
        &self,
        test_case: &dyn SnapshotTestCase,
        renderer: &mut R,
        element: &R::Element,
        size: Size,
        identifier: &str,
    ) -> Result<Outcome, SnapshotError>
    where
        R: Renderer + ?Sized,
    {
        renderer.settle(self.settle_timeout);
        let candidate = PixelBuffer::from_render(renderer, element, size)?;
        let identity = test_case.identity(identifier);
        self.snapshot_buffer(
            &identity,
            test_case.snapshot_mode(),
            candidate,
            renderer.scale_factor(),
        )
    }

    /// Records or verifies an already captured buffer.
    pub fn snapshot_buffer(
        &self,
        identity: &SnapshotIdentity,
        mode: Mode,
        candidate: PixelBuffer,
        scale: u16,
    ) -> Result<Outcome, SnapshotError> {
        match mode {
            Mode::Record => self.record(identity, &candidate, scale),
            Mode::Verify => self.verify(identity, candidate, scale),
        }
    }

    pub fn record(
        &self,
        identity: &SnapshotIdentity,
        candidate: &PixelBuffer,
        scale: u16,
    ) -> Result<Outcome, SnapshotError> {
        let path = self.store.path_for(identity, ArtifactKind::Reference, scale);
        self.store.write(candidate, &path)?;
        log::info!("recorded reference image for {} at {:?}", identity, path);
        Ok(Outcome::Recorded { path })
    }

    pub fn verify(
        &self,
        identity: &SnapshotIdentity,
        candidate: PixelBuffer,
        scale: u16,
    ) -> Result<Outcome, SnapshotError> {
        // Decoded references are always tightly packed.
        let candidate = candidate.into_packed();
        let reference_path = self.store.path_for(identity, ArtifactKind::Reference, scale);

        let reference = match self.store.read(&reference_path) {
            Ok(reference) => reference,
            Err(SnapshotError::ReferenceMissing { path, reason }) => {
                let mut message = match reason {
                    None => format!(
                        "Unable to load reference image \"{}\": this snapshot was never recorded. \
                         Run the test in record mode to create it.",
                        path.display()
                    ),
                    Some(reason) => format!(
                        "Unable to load reference image \"{}\" ({}). \
                         Run the test in record mode to re-create it.",
                        path.display(),
                        reason
                    ),
                };
                let failed =
                    self.write_artifact(identity, ArtifactKind::Failed, scale, &candidate, &mut message);
                return Ok(Outcome::Failed(Failure {
                    verdict: Verdict::ReferenceMissing,
                    message,
                    reference: path,
                    failed,
                    diff: None,
                }));
            }
            Err(e) => return Err(e),
        };

        let verdict = self.comparator.compare(&candidate, &reference)?;
        if verdict.is_match() {
            log::debug!("{} matches {:?}", identity, reference_path);
            return Ok(Outcome::Matched);
        }
        log::warn!("{} does not match {:?}: {:?}", identity, reference_path, verdict);

        let mut message = describe(verdict, &candidate, &reference);
        let failed =
            self.write_artifact(identity, ArtifactKind::Failed, scale, &candidate, &mut message);
        let diff = match compare::diff_image(&candidate, &reference, &self.diff) {
            Ok(diff) => self.write_artifact(identity, ArtifactKind::Diff, scale, &diff, &mut message),
            Err(e) => {
                note_artifact_error(&mut message, ArtifactKind::Diff, &e);
                None
            }
        };

        let _ = write!(message, "\n  reference: {}", reference_path.display());
        for (kind, path) in [(ArtifactKind::Failed, &failed), (ArtifactKind::Diff, &diff)] {
            if let Some(path) = path {
                let _ = write!(message, "\n  {}: {}", kind.name(), path.display());
            }
        }
        if let Some(failed) = &failed {
            let _ = write!(
                message,
                "\nTo compare side by side run:\n  ksdiff '{}' '{}'",
                reference_path.display(),
                failed.display()
            );
        }

        Ok(Outcome::Failed(Failure {
            verdict,
            message,
            reference: reference_path,
            failed,
            diff,
        }))
    }

    /// Snapshots `element` and hands the result to `reporter`, attributed to
    /// the caller's source location.
    ///
    /// # Panics
    ///
    /// When the reference was recorded with an incompatible memory layout,
    /// which means the test environment itself is misconfigured.
    #[track_caller]
    pub fn assert_snapshot<R, P>(
        &self,
        test_case: &dyn SnapshotTestCase,
        renderer: &mut R,
        element: &R::Element,
        size: Size,
        identifier: &str,
        reporter: &mut P,
    ) where
        R: Renderer + ?Sized,
        P: Reporter + ?Sized,
    {
        let location = SourceLocation::caller();
        let result = self.snapshot(test_case, renderer, element, size, identifier);
        report(result, reporter, location);
    }

    /// [`SnapshotEngine::assert_snapshot`] for an already captured buffer.
    #[track_caller]
    pub fn assert_buffer<P>(
        &self,
        test_case: &dyn SnapshotTestCase,
        candidate: PixelBuffer,
        scale: u16,
        identifier: &str,
        reporter: &mut P,
    ) where
        P: Reporter + ?Sized,
    {
        let location = SourceLocation::caller();
        let identity = test_case.identity(identifier);
        let result = self.snapshot_buffer(&identity, test_case.snapshot_mode(), candidate, scale);
        report(result, reporter, location);
    }

    fn write_artifact(
        &self,
        identity: &SnapshotIdentity,
        kind: ArtifactKind,
        scale: u16,
        buffer: &PixelBuffer,
        message: &mut String,
    ) -> Option<PathBuf> {
        let path = self.store.path_for(identity, kind, scale);
        match self.store.write(buffer, &path) {
            Ok(()) => Some(path),
            Err(e) => {
                note_artifact_error(message, kind, &e);
                None
            }
        }
    }
}

fn report<P>(result: Result<Outcome, SnapshotError>, reporter: &mut P, location: SourceLocation)
where
    P: Reporter + ?Sized,
{
    match result {
        Ok(outcome) => match outcome.failure_message() {
            Some(message) => reporter.report_failure(&message, location),
            None => reporter.report_success(),
        },
        Err(e @ SnapshotError::IncompatibleLayout(_)) => panic!("{}: {}", location, e),
        Err(e) => reporter.report_failure(&e.to_string(), location),
    }
}

fn note_artifact_error(message: &mut String, kind: ArtifactKind, e: &SnapshotError) {
    log::warn!("failed to write {} image: {}", kind.name(), e);
    let _ = write!(message, "\n  could not write {} image: {}", kind.name(), e);
}

fn describe(verdict: Verdict, candidate: &PixelBuffer, reference: &PixelBuffer) -> String {
    match verdict {
        Verdict::FormatMismatch => format!(
            "Pixel format does not match reference: expected {:?}, got {:?}",
            reference.format(),
            candidate.format()
        ),
        Verdict::DimensionMismatch => format!(
            "Image size does not match reference: expected {}, got {}",
            reference.size(),
            candidate.size()
        ),
        _ => format!(
            "Image data does not match reference: {} of {} pixels differ",
            compare::differing_pixels(candidate, reference, 0),
            u64::from(candidate.width()) * u64::from(candidate.height())
        ),
    }
}
