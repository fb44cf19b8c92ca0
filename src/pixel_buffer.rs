use std::borrow::Cow;
use std::fmt;

use crate::error::SnapshotError;
use crate::render::{Renderer, Size};

mod png_codec;

/// Channel layout and alpha convention of a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit RGBA, straight (unassociated) alpha.
    Rgba8,
    /// 8-bit RGBA with color channels premultiplied by alpha. This is what most
    /// software rasterizers hand out.
    Rgba8Premultiplied,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8 | Self::Rgba8Premultiplied => 32,
            Self::Rgb8 => 24,
            Self::Gray8 => 8,
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        self.bits_per_pixel() as usize / 8
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Rgba8 => "rgba8",
            Self::Rgba8Premultiplied => "rgba8-premultiplied",
            Self::Rgb8 => "rgb8",
            Self::Gray8 => "gray8",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        [
            Self::Rgba8,
            Self::Rgba8Premultiplied,
            Self::Rgb8,
            Self::Gray8,
        ]
        .into_iter()
        .find(|f| f.tag() == tag)
    }
}

/// An immutable in-memory bitmap.
///
/// Rows may carry trailing padding (`bytes_per_row` can exceed
/// `width * bytes_per_pixel`), but the buffer always holds exactly
/// `bytes_per_row * height` bytes and both dimensions are non-zero.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bytes_per_row: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps tightly packed pixel rows.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, SnapshotError> {
        let bytes_per_row = (width as usize).saturating_mul(format.bytes_per_pixel());
        Self::with_stride(width, height, bytes_per_row, format, data)
    }

    pub fn with_stride(
        width: u32,
        height: u32,
        bytes_per_row: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, SnapshotError> {
        check_dimensions(Size::new(width, height))?;

        let min_row = (width as usize).saturating_mul(format.bytes_per_pixel());
        let expected_len = bytes_per_row.checked_mul(height as usize);
        if bytes_per_row < min_row || expected_len != Some(data.len()) {
            return Err(SnapshotError::InvalidLayout {
                width,
                height,
                bytes_per_row,
                format,
                len: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bytes_per_row,
            format,
            data,
        })
    }

    /// Creates a buffer filled with a single pixel value, which must be
    /// `format.bytes_per_pixel()` long.
    pub fn filled(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixel: &[u8],
    ) -> Result<Self, SnapshotError> {
        let pixels = (width as usize).checked_mul(height as usize);
        match pixels.and_then(|n| n.checked_mul(pixel.len())) {
            Some(_) if pixel.len() == format.bytes_per_pixel() => {
                Self::new(width, height, format, pixel.repeat(pixels.unwrap_or_default()))
            }
            len => Err(SnapshotError::InvalidLayout {
                width,
                height,
                bytes_per_row: (width as usize).saturating_mul(pixel.len()),
                format,
                len: len.unwrap_or(usize::MAX),
            }),
        }
    }

    /// Wraps a software-rasterizer surface of premultiplied `0xAARRGGBB` words.
    pub fn from_premultiplied_argb(
        width: u32,
        height: u32,
        buffer: &[u32],
    ) -> Result<Self, SnapshotError> {
        let mut rgba = Vec::with_capacity(buffer.len() * 4);
        for &px in buffer {
            let [a, r, g, b] = px.to_be_bytes();
            rgba.extend_from_slice(&[r, g, b, a]);
        }
        Self::new(width, height, PixelFormat::Rgba8Premultiplied, rgba)
    }

    /// Captures `element` through `renderer`.
    ///
    /// A zero-area `size` is rejected before the renderer is ever invoked.
    pub fn from_render<R>(
        renderer: &mut R,
        element: &R::Element,
        size: Size,
    ) -> Result<Self, SnapshotError>
    where
        R: Renderer + ?Sized,
    {
        check_dimensions(size)?;
        let buffer = renderer.render(element, size)?;
        log::debug!(
            "rendered {}x{} element into {:?}",
            size.width,
            size.height,
            buffer
        );
        Ok(buffer)
    }

    pub fn from_encoded_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        png_codec::decode(bytes).map_err(SnapshotError::Decode)
    }

    /// PNG encoding of the buffer. Encoding the same buffer always yields the same bytes.
    pub fn to_encoded_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(png_codec::encode(self)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.format.bits_per_pixel()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_packed(&self) -> bool {
        self.bytes_per_row == self.packed_row_len()
    }

    /// Pixel rows without any trailing padding.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let row_len = self.packed_row_len();
        self.data
            .chunks_exact(self.bytes_per_row)
            .map(move |row| &row[..row_len])
    }

    pub fn packed_data(&self) -> Cow<'_, [u8]> {
        if self.is_packed() {
            Cow::Borrowed(&self.data)
        } else {
            Cow::Owned(self.rows().flatten().copied().collect())
        }
    }

    /// Drops row padding, if any.
    pub fn into_packed(self) -> Self {
        if self.is_packed() {
            return self;
        }
        let data = self.packed_data().into_owned();
        Self {
            bytes_per_row: self.packed_row_len(),
            data,
            ..self
        }
    }

    /// Straight-alpha RGBA value of the pixel at (`x`, `y`), whatever the
    /// underlying format. Returns `None` outside of the buffer.
    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.bytes_per_row + x as usize * bpp;
        let px = &self.data[offset..offset + bpp];

        Some(match self.format {
            PixelFormat::Rgba8 => [px[0], px[1], px[2], px[3]],
            PixelFormat::Rgba8Premultiplied => unpremultiply([px[0], px[1], px[2], px[3]]),
            PixelFormat::Rgb8 => [px[0], px[1], px[2], 0xff],
            PixelFormat::Gray8 => [px[0], px[0], px[0], 0xff],
        })
    }

    fn packed_row_len(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes_per_row", &self.bytes_per_row)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

pub(crate) fn check_dimensions(size: Size) -> Result<(), SnapshotError> {
    let Size { width, height } = size;
    let axis = match (width, height) {
        (0, _) => "width",
        (_, 0) => "height",
        _ => return Ok(()),
    };
    Err(SnapshotError::EmptyDimension {
        axis,
        width,
        height,
    })
}

fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let a16 = u16::from(a);
    let channel = |c: u8| ((u16::from(c) * 255 + a16 / 2) / a16).min(255) as u8;
    [channel(r), channel(g), channel(b), a]
}
