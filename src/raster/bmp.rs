//! 8-bit grayscale BMP encoding
//!
//! Layout: 14-byte file header, 40-byte BITMAPINFOHEADER, a 256-entry gray
//! palette, then bottom-up rows padded to a multiple of 4 bytes.

use bytes::{BufMut, Bytes, BytesMut};

use super::FrameEncoder;
use crate::types::Geometry;
use crate::{Result, StreamError};

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
const PALETTE_LEN: u32 = 256 * 4;
const PIXEL_OFFSET: u32 = FILE_HEADER_LEN + INFO_HEADER_LEN + PALETTE_LEN;
const BITS_PER_PIXEL: u16 = 8;

/// Encodes grayscale rasters as uncompressed palette BMP files
#[derive(Debug, Clone, Copy, Default)]
pub struct BmpEncoder;

impl FrameEncoder for BmpEncoder {
    fn encode(&self, pixels: &[u8], geometry: Geometry) -> Result<Bytes> {
        if pixels.len() != geometry.pixel_count() {
            return Err(StreamError::encode(
                geometry,
                format!("expected {} samples, got {}", geometry.pixel_count(), pixels.len()),
            ));
        }
        if geometry.width == 0 || geometry.height == 0 {
            return Err(StreamError::encode(geometry, "empty raster"));
        }

        let width = i32::try_from(geometry.width)
            .map_err(|_| StreamError::encode(geometry, "width exceeds BMP limits"))?;
        let height = i32::try_from(geometry.height)
            .map_err(|_| StreamError::encode(geometry, "height exceeds BMP limits"))?;

        let stride = row_stride(geometry.width);
        let image_len = u32::try_from(stride * u64::from(geometry.height))
            .ok()
            .filter(|len| len.checked_add(PIXEL_OFFSET).is_some())
            .ok_or_else(|| StreamError::encode(geometry, "image exceeds BMP size limit"))?;
        let file_len = image_len + PIXEL_OFFSET;

        let mut out = BytesMut::with_capacity(file_len as usize);

        // BITMAPFILEHEADER
        out.put_slice(b"BM");
        out.put_u32_le(file_len);
        out.put_u32_le(0);
        out.put_u32_le(PIXEL_OFFSET);

        // BITMAPINFOHEADER
        out.put_u32_le(INFO_HEADER_LEN);
        out.put_i32_le(width);
        out.put_i32_le(height);
        out.put_u16_le(1);
        out.put_u16_le(BITS_PER_PIXEL);
        out.put_u32_le(0);
        out.put_u32_le(image_len);
        out.put_i32_le(0);
        out.put_i32_le(0);
        out.put_u32_le(256);
        out.put_u32_le(0);

        for level in 0..=255u8 {
            out.put_slice(&[level, level, level, 0]);
        }

        let row_len = geometry.width as usize;
        let padding = stride as usize - row_len;
        for row in pixels.chunks_exact(row_len).rev() {
            out.put_slice(row);
            out.put_bytes(0, padding);
        }

        Ok(out.freeze())
    }
}

fn row_stride(width: u32) -> u64 {
    (u64::from(width) + 3) & !3
}

/// Read the geometry back out of an encoded BMP header
pub fn read_bmp_geometry(data: &[u8]) -> Option<Geometry> {
    if data.len() < (FILE_HEADER_LEN + INFO_HEADER_LEN) as usize || &data[..2] != b"BM" {
        return None;
    }
    let width = i32::from_le_bytes(data[18..22].try_into().ok()?);
    let height = i32::from_le_bytes(data[22..26].try_into().ok()?);
    Some(Geometry::new(u32::try_from(width).ok()?, height.unsigned_abs()))
}
