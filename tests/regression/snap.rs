use std::time::Duration;

use tempfile::TempDir;
use viewsnap::{
    Config, Mode, PixelBuffer, PixelFormat, Renderer, SnapshotEngine, SnapshotError, Size,
    TestCase,
};

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];

/// Paints every element as a single solid premultiplied RGBA color.
pub struct SolidRenderer {
    pub scale: u16,
    pub settled: Option<Duration>,
    /// Extra bytes appended to every row, like GPU readbacks aligned to a stride.
    pub row_padding: usize,
}

impl SolidRenderer {
    pub fn new() -> Self {
        Self {
            scale: 1,
            settled: None,
            row_padding: 0,
        }
    }
}

impl Renderer for SolidRenderer {
    type Element = [u8; 4];

    fn scale_factor(&self) -> u16 {
        self.scale
    }

    fn settle(&mut self, timeout: Duration) {
        self.settled = Some(timeout);
    }

    fn render(&mut self, color: &[u8; 4], size: Size) -> Result<PixelBuffer, SnapshotError> {
        let Size { width, height } = size.scaled(self.scale);
        let bytes_per_row = width as usize * 4 + self.row_padding;
        let mut data = Vec::with_capacity(bytes_per_row * height as usize);
        for _ in 0..height {
            for _ in 0..width {
                data.extend_from_slice(color);
            }
            data.resize(data.len() + self.row_padding, 0xee);
        }
        PixelBuffer::with_stride(
            width,
            height,
            bytes_per_row,
            PixelFormat::Rgba8Premultiplied,
            data,
        )
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub engine: SnapshotEngine,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config("")
    }

    pub fn with_config(toml: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = toml
            .parse::<Config>()
            .expect("invalid test config")
            .with_reference_dir(dir.path().join("ref"))
            .with_scratch_dir(dir.path().join("tmp"));
        let engine = SnapshotEngine::from_config(&config).expect("engine config");
        Self { dir, engine }
    }

    pub fn ref_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("ref")
    }

    pub fn tmp_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("tmp")
    }
}

pub fn case_x(mode: Mode) -> TestCase {
    TestCase::new("CaseX", "test_button", mode)
}
