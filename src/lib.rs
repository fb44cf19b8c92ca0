pub use artifact::{ArtifactKind, SnapshotIdentity};
pub use case::{SnapshotTestCase, TestCase};
pub use color::Color;
pub use compare::{Comparator, LayoutMismatch, Verdict};
pub use config::Config;
pub use engine::{Mode, Outcome, SnapshotEngine};
pub use error::{ConfigError, SnapshotError};
pub use pixel_buffer::{PixelBuffer, PixelFormat};
pub use render::{Renderer, Size};
pub use report::{CollectingReporter, PanicReporter, Reporter, SourceLocation};
pub use store::SnapshotStore;

mod color;
mod error;

pub mod artifact;
pub mod case;
pub mod compare;
pub mod config;
pub mod engine;
pub mod pixel_buffer;
pub mod render;
pub mod report;
pub mod store;

#[macro_export]
macro_rules! prog_name {
    () => {
        "viewsnap"
    };
}

/// Returns a token naming the host platform, e.g. `linux` or `macos`.
///
/// Meant to be used as (part of) a snapshot identifier when rendering output
/// legitimately differs between platforms, for example because of system fonts.
pub fn platform_identifier() -> &'static str {
    std::env::consts::OS
}
