//! Raw frame to packed RGB conversion
//!
//! RAW8 frames are demosaiced per 2x2 RGGB cell: every pixel of a cell gets
//! the cell's red, the mean of its two greens and its blue. Rows are repacked
//! without stride padding.

use contracts::{ContractError, FrameDims, PixelConverter, PixelFormat, RawFrame};

/// Converter for every format the simulated sensors stream
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbConverter;

impl RgbConverter {
    pub fn new() -> Self {
        Self
    }

    fn check_geometry(raw: &RawFrame) -> Result<(), ContractError> {
        if raw.width == 0 || raw.height == 0 {
            return Err(ContractError::conversion(format!(
                "empty frame {}x{}",
                raw.width, raw.height
            )));
        }
        let min_stride = raw.width as u64 * raw.format.bytes_per_pixel() as u64;
        if (raw.stride as u64) < min_stride {
            return Err(ContractError::conversion(format!(
                "stride {} shorter than row of {min_stride} bytes",
                raw.stride
            )));
        }
        if raw.data.len() < raw.expected_len() {
            return Err(ContractError::conversion(format!(
                "truncated frame #{}: {} of {} bytes",
                raw.sequence,
                raw.data.len(),
                raw.expected_len()
            )));
        }
        Ok(())
    }
}

impl PixelConverter for RgbConverter {
    fn convert_into(&self, raw: &RawFrame, out: &mut Vec<u8>) -> Result<FrameDims, ContractError> {
        Self::check_geometry(raw)?;

        let dims = FrameDims::rgb(raw.width, raw.height);
        out.clear();
        out.reserve(dims.byte_len());

        let width = raw.width as usize;
        let height = raw.height as usize;
        let stride = raw.stride as usize;
        let data = &raw.data[..];

        match raw.format {
            PixelFormat::Rgb8 => {
                for row in data.chunks_exact(stride).take(height) {
                    out.extend_from_slice(&row[..width * 3]);
                }
            }
            PixelFormat::Mono8 => {
                for row in data.chunks_exact(stride).take(height) {
                    for &v in &row[..width] {
                        out.extend_from_slice(&[v, v, v]);
                    }
                }
            }
            PixelFormat::Raw8 => {
                let at = |x: usize, y: usize| data[y.min(height - 1) * stride + x.min(width - 1)];
                for y in 0..height {
                    let cy = y & !1;
                    for x in 0..width {
                        let cx = x & !1;
                        let r = at(cx, cy);
                        let g = ((at(cx + 1, cy) as u16 + at(cx, cy + 1) as u16) / 2) as u8;
                        let b = at(cx + 1, cy + 1);
                        out.extend_from_slice(&[r, g, b]);
                    }
                }
            }
        }

        Ok(dims)
    }
}
