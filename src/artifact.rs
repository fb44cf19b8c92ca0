use std::fmt;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "png";

/// Names a single snapshot: the test suite, the test inside it, and an
/// identifier telling apart several snapshots taken by the same test.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SnapshotIdentity {
    pub test_case_name: String,
    pub test_method_name: String,
    pub identifier: String,
}

impl SnapshotIdentity {
    pub fn new(
        test_case_name: impl Into<String>,
        test_method_name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            test_case_name: test_case_name.into(),
            test_method_name: test_method_name.into(),
            identifier: identifier.into(),
        }
    }

    pub fn path(&self, kind: ArtifactKind, scale: u16, base_dir: impl AsRef<Path>) -> PathBuf {
        compute(self, kind, scale, base_dir)
    }
}

impl fmt::Display for SnapshotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}-{}",
            self.test_case_name, self.test_method_name, self.identifier
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Reference,
    Failed,
    Diff,
}

impl ArtifactKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Failed => "failed",
            Self::Diff => "diff",
        }
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reference" => Ok(Self::Reference),
            "failed" => Ok(Self::Failed),
            "diff" => Ok(Self::Diff),
            _ => Err(format!(
                "unknown artifact kind `{}`, expected one of: reference, failed, diff",
                s
            )),
        }
    }
}

/// Resolves where the `kind` artifact of `identity` lives under `base_dir`:
/// `<base_dir>/<case>/<method>-<identifier>[%<kind>][@<scale>x].png`.
///
/// Reference artifacts never carry the kind suffix.
pub fn compute(
    identity: &SnapshotIdentity,
    kind: ArtifactKind,
    scale: u16,
    base_dir: impl AsRef<Path>,
) -> PathBuf {
    base_dir
        .as_ref()
        .join(&identity.test_case_name)
        .join(file_name(identity, kind, scale))
}

fn file_name(identity: &SnapshotIdentity, kind: ArtifactKind, scale: u16) -> String {
    let kind_suffix = match kind {
        ArtifactKind::Reference => String::new(),
        kind => format!("%{}", kind.name()),
    };
    let scale_suffix = if scale == 1 {
        String::new()
    } else {
        format!("@{}x", scale)
    };

    format!(
        "{}-{}{}{}.{}",
        identity.test_method_name, identity.identifier, kind_suffix, scale_suffix, EXTENSION
    )
}
