use std::time::Duration;

use crate::error::SnapshotError;
use crate::pixel_buffer::PixelBuffer;

/// Logical size of an element, before the device scale factor is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Size in device pixels, saturating at `u32::MAX`.
    pub const fn scaled(self, scale: u16) -> Self {
        Self {
            width: self.width.saturating_mul(scale as u32),
            height: self.height.saturating_mul(scale as u32),
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Bridge to the UI toolkit that owns the actual drawing.
pub trait Renderer {
    type Element: ?Sized;

    /// Device pixel density multiplier. Rendered buffers are expected to be
    /// `size.scaled(scale_factor())` pixels large.
    fn scale_factor(&self) -> u16 {
        1
    }

    /// Gives the toolkit a chance to settle layout before capture, blocking
    /// for at most `timeout`.
    fn settle(&mut self, _timeout: Duration) {}

    /// Draws `element` at `size`. Never called with an empty size.
    fn render(&mut self, element: &Self::Element, size: Size)
        -> Result<PixelBuffer, SnapshotError>;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    type Element = R::Element;

    fn scale_factor(&self) -> u16 {
        (**self).scale_factor()
    }

    fn settle(&mut self, timeout: Duration) {
        (**self).settle(timeout)
    }

    fn render(
        &mut self,
        element: &Self::Element,
        size: Size,
    ) -> Result<PixelBuffer, SnapshotError> {
        (**self).render(element, size)
    }
}
