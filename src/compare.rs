use thiserror::Error;

use crate::pixel_buffer::{PixelBuffer, PixelFormat};

pub use diff::{diff_image, Params as DiffParams};

mod diff;

/// Outcome of checking a candidate against its reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Match,
    Mismatch,
    ReferenceMissing,
    DimensionMismatch,
    FormatMismatch,
}

impl Verdict {
    pub fn is_match(self) -> bool {
        self == Self::Match
    }
}

/// Same format and size but different memory layout. Only happens when the
/// reference was produced with different rendering settings, so it is a
/// configuration problem rather than a test failure.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error(
    "bytes-per-row {candidate_bytes_per_row} != {reference_bytes_per_row} \
     or bits-per-pixel {candidate_bits_per_pixel} != {reference_bits_per_pixel}"
)]
pub struct LayoutMismatch {
    pub candidate_bytes_per_row: usize,
    pub reference_bytes_per_row: usize,
    pub candidate_bits_per_pixel: u32,
    pub reference_bits_per_pixel: u32,
}

/// Tolerance applied to premultiplied RGBA buffers that are not byte-identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuzzyPolicy {
    /// Largest per-channel difference still treated as equal.
    pub channel_tolerance: u8,
    /// How many pixels may exceed `channel_tolerance` before it is a mismatch.
    pub max_differing_pixels: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Params {
    /// `None` means exact matching only.
    pub fuzzy: Option<FuzzyPolicy>,
}

#[derive(Clone, Debug, Default)]
pub struct Comparator {
    params: Params,
}

impl Comparator {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn exact() -> Self {
        Self::default()
    }

    pub fn fuzzy(&self) -> Option<FuzzyPolicy> {
        self.params.fuzzy
    }

    /// Classifies `candidate` against `reference`.
    ///
    /// Checks run in order and the first failing one decides: pixel format,
    /// dimensions, memory layout (an error), raw bytes, then the fuzzy policy
    /// when one is configured and the data is premultiplied RGBA.
    pub fn compare(
        &self,
        candidate: &PixelBuffer,
        reference: &PixelBuffer,
    ) -> Result<Verdict, LayoutMismatch> {
        if candidate.format() != reference.format() {
            return Ok(Verdict::FormatMismatch);
        }
        if candidate.size() != reference.size() {
            return Ok(Verdict::DimensionMismatch);
        }
        if candidate.bytes_per_row() != reference.bytes_per_row()
            || candidate.bits_per_pixel() != reference.bits_per_pixel()
        {
            return Err(LayoutMismatch {
                candidate_bytes_per_row: candidate.bytes_per_row(),
                reference_bytes_per_row: reference.bytes_per_row(),
                candidate_bits_per_pixel: candidate.bits_per_pixel(),
                reference_bits_per_pixel: reference.bits_per_pixel(),
            });
        }

        if candidate.rows().eq(reference.rows()) {
            return Ok(Verdict::Match);
        }

        match self.params.fuzzy {
            Some(policy) if candidate.format() == PixelFormat::Rgba8Premultiplied => {
                let differing = differing_pixels(candidate, reference, policy.channel_tolerance);
                log::debug!(
                    "fuzzy comparison: {} pixels beyond tolerance {} (allowed {})",
                    differing,
                    policy.channel_tolerance,
                    policy.max_differing_pixels
                );
                if differing <= policy.max_differing_pixels {
                    Ok(Verdict::Match)
                } else {
                    Ok(Verdict::Mismatch)
                }
            }
            _ => Ok(Verdict::Mismatch),
        }
    }
}

/// Counts pixels where any channel differs by more than `tolerance`.
/// Both buffers must share format and size.
pub fn differing_pixels(a: &PixelBuffer, b: &PixelBuffer, tolerance: u8) -> u64 {
    let bpp = a.format().bytes_per_pixel();
    a.rows()
        .zip(b.rows())
        .flat_map(|(ra, rb)| ra.chunks_exact(bpp).zip(rb.chunks_exact(bpp)))
        .filter(|(pa, pb)| pa.iter().zip(pb.iter()).any(|(ca, cb)| ca.abs_diff(*cb) > tolerance))
        .count() as u64
}
