use crate::error::SnapshotError;
use crate::pixel_buffer::{PixelBuffer, PixelFormat};
use crate::Color;

#[derive(Clone, Debug)]
pub struct Params {
    pub mismatch_color: Color,
    /// Color for pixels covered by only one of the two images.
    pub missing_color: Color,
    /// Render matching pixels as dimmed grayscale instead of as-is.
    pub dim_matching: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            mismatch_color: Color::from_rgba(0xff, 0, 0, 0xff),
            missing_color: Color::from_rgba(0xff, 0, 0xff, 0xff),
            dim_matching: true,
        }
    }
}

/// Builds a straight-alpha RGBA image highlighting where `candidate` and
/// `reference` differ. The result covers the union of both images, so
/// differently sized or formatted buffers still produce something useful.
pub fn diff_image(
    candidate: &PixelBuffer,
    reference: &PixelBuffer,
    params: &Params,
) -> Result<PixelBuffer, SnapshotError> {
    let width = candidate.width().max(reference.width());
    let height = candidate.height().max(reference.height());

    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let px = match (candidate.pixel_rgba(x, y), reference.pixel_rgba(x, y)) {
                (Some(c), Some(r)) if c == r => matching_pixel(r, params),
                (Some(_), Some(_)) => params.mismatch_color.to_rgba(),
                _ => params.missing_color.to_rgba(),
            };
            data.extend_from_slice(&px);
        }
    }

    PixelBuffer::new(width, height, PixelFormat::Rgba8, data)
}

fn matching_pixel(px: [u8; 4], params: &Params) -> [u8; 4] {
    if !params.dim_matching {
        return px;
    }
    let gray = ((u16::from(px[0]) + u16::from(px[1]) + u16::from(px[2])) / 3 / 3) as u8;
    [gray, gray, gray, 0xff]
}
