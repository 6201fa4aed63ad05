//! Uncompressed 24-bit bitmap encoding
//!
//! Layout: BITMAPFILEHEADER (14 bytes) + BITMAPINFOHEADER (40 bytes) followed
//! by exactly `width * height * 3` pixel bytes, BGR, bottom row first. Rows
//! are not padded, matching the surface readback. Widths that are a multiple
//! of four produce files any decoder accepts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{RecorderError, Result};
use crate::pipeline::RecordingJob;

/// Bytes in front of the pixel payload
pub const BITMAP_HEADER_LEN: usize = 54;

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
const BITS_PER_PIXEL: u16 = 24;
const BI_RGB: u32 = 0;

/// Header fields of a written bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
    pub file_size: u32,
    pub pixel_offset: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
}

impl BitmapHeader {
    /// Header for a `width` x `height` 24-bit image
    pub fn for_image(width: u32, height: u32) -> Self {
        let image_size = width * height * 3;
        Self {
            file_size: FILE_HEADER_LEN + INFO_HEADER_LEN + image_size,
            pixel_offset: FILE_HEADER_LEN + INFO_HEADER_LEN,
            width: width as i32,
            height: height as i32,
            planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            compression: BI_RGB,
            image_size,
        }
    }

    pub fn put(&self, buf: &mut impl BufMut) {
        // BITMAPFILEHEADER
        buf.put_slice(b"BM");
        buf.put_u32_le(self.file_size);
        buf.put_u16_le(0);
        buf.put_u16_le(0);
        buf.put_u32_le(self.pixel_offset);

        // BITMAPINFOHEADER
        buf.put_u32_le(INFO_HEADER_LEN);
        buf.put_i32_le(self.width);
        buf.put_i32_le(self.height);
        buf.put_u16_le(self.planes);
        buf.put_u16_le(self.bits_per_pixel);
        buf.put_u32_le(self.compression);
        buf.put_u32_le(self.image_size);
        buf.put_i32_le(0); // x pixels per metre
        buf.put_i32_le(0); // y pixels per metre
        buf.put_u32_le(0); // palette colours used
        buf.put_u32_le(0); // important colours
    }

    /// Read the headers back from the start of a file
    pub fn parse(mut data: &[u8]) -> Option<Self> {
        if data.len() < BITMAP_HEADER_LEN || &data[..2] != b"BM" {
            return None;
        }
        data.advance(2);
        let file_size = data.get_u32_le();
        data.advance(4);
        let pixel_offset = data.get_u32_le();
        if data.get_u32_le() != INFO_HEADER_LEN {
            return None;
        }
        let width = data.get_i32_le();
        let height = data.get_i32_le();
        let planes = data.get_u16_le();
        let bits_per_pixel = data.get_u16_le();
        let compression = data.get_u32_le();
        let image_size = data.get_u32_le();
        Some(Self {
            file_size,
            pixel_offset,
            width,
            height,
            planes,
            bits_per_pixel,
            compression,
            image_size,
        })
    }
}

/// Encode a complete bitmap file in memory
pub fn encode(width: u32, height: u32, bgr_bottom_up: &[u8]) -> Result<Bytes> {
    let expected = width as usize * height as usize * 3;
    if bgr_bottom_up.len() != expected {
        return Err(RecorderError::PixelCount {
            width,
            height,
            expected,
            actual: bgr_bottom_up.len(),
        });
    }
    let mut buf = BytesMut::with_capacity(BITMAP_HEADER_LEN + expected);
    BitmapHeader::for_image(width, height).put(&mut buf);
    buf.put_slice(bgr_bottom_up);
    Ok(buf.freeze())
}

/// Something that persists one recording job; runs on a blocking thread
pub trait FrameWriter: Send + Sync + 'static {
    /// Write the job, returning the number of bytes written
    fn write(&self, job: &RecordingJob) -> Result<u64>;
}

/// Writes jobs as bitmap files
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapWriter;

impl FrameWriter for BitmapWriter {
    fn write(&self, job: &RecordingJob) -> Result<u64> {
        let encoded = encode(job.width, job.height, &job.pixels)?;
        write_file(&job.path, &encoded)?;
        Ok(encoded.len() as u64)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| RecorderError::io(path, e))?;
    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(|e| RecorderError::io(path, e))
}
