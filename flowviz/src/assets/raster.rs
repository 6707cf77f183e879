use std::sync::Arc;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{FlowvizError, FlowvizResult};

/// Only binary pixel maps are supported.
const PPM_MAGIC: &[u8] = b"P6";
const MAX_SAMPLE_VALUE: u32 = 255;

/// Decoded frame in straight RGBA8, row-major, tightly packed.
///
/// Alpha is always 255 for rasters produced by [`decode_ppm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Wrap an RGBA8 buffer. Fails unless `pixels.len() == width * height * 4` and both
    /// dimensions are non-zero.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> FlowvizResult<Self> {
        if width == 0 || height == 0 {
            return Err(FlowvizError::validation(
                "raster width and height must be > 0",
            ));
        }
        let expected = rgba_len(width, height)
            .ok_or_else(|| FlowvizError::validation("raster dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(FlowvizError::validation(format!(
                "raster byte length {} does not match {width}x{height} rgba8 ({expected})",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Color at integer pixel `(x, y)`, `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[i..i + 4];
        Some(Rgba8::new(px[0], px[1], px[2], px[3]))
    }
}

fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(4)
}

/// Decode a binary pixel map (`P6 width height maxval` + raw RGB bytes) into RGBA8.
///
/// The header is four whitespace-delimited ASCII tokens; exactly one whitespace byte separates
/// the last token from the raster. Output alpha is synthesized as 255.
pub fn decode_ppm(bytes: &[u8]) -> FlowvizResult<RasterImage> {
    let header = read_header(bytes)?;

    if header.magic != PPM_MAGIC {
        return Err(FlowvizError::image_format(
            0,
            format!(
                "unsupported magic '{}', only binary P6 rasters are supported",
                String::from_utf8_lossy(header.magic)
            ),
        ));
    }

    let width = parse_dimension(header.width, header.width_offset, "width")?;
    let height = parse_dimension(header.height, header.height_offset, "height")?;
    let maxval = parse_u32(header.maxval, header.maxval_offset, "max sample value")?;
    if maxval > MAX_SAMPLE_VALUE {
        return Err(FlowvizError::image_format(
            header.maxval_offset,
            format!("bit depth of image must be no more than 8 (max sample value {maxval})"),
        ));
    }

    let raster = &bytes[header.raster_offset..];
    let needed = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| FlowvizError::image_format(header.width_offset, "dimensions overflow"))?;
    if raster.len() < needed {
        return Err(FlowvizError::image_format(
            bytes.len(),
            format!(
                "raster truncated: expected {needed} bytes for {width}x{height}, found {}",
                raster.len()
            ),
        ));
    }
    if raster.len() > needed {
        tracing::debug!(
            extra = raster.len() - needed,
            "ignoring trailing bytes after raster"
        );
    }

    let mut rgba = Vec::with_capacity(needed / 3 * 4);
    for px in raster[..needed].chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }

    RasterImage::new(width, height, rgba)
}

struct PpmHeader<'a> {
    magic: &'a [u8],
    width: &'a [u8],
    width_offset: usize,
    height: &'a [u8],
    height_offset: usize,
    maxval: &'a [u8],
    maxval_offset: usize,
    raster_offset: usize,
}

fn read_header(bytes: &[u8]) -> FlowvizResult<PpmHeader<'_>> {
    let mut tokens: [(&[u8], usize); 4] = [(&[], 0); 4];
    let mut pos = 0usize;

    for (n, slot) in tokens.iter_mut().enumerate() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if start == pos {
            return Err(FlowvizError::image_format(
                pos,
                format!("header truncated: found {n} of 4 tokens"),
            ));
        }
        if pos == bytes.len() {
            return Err(FlowvizError::image_format(
                pos,
                "header token is not followed by whitespace",
            ));
        }
        *slot = (&bytes[start..pos], start);
        // The delimiter after each token belongs to the header.
        pos += 1;
    }

    Ok(PpmHeader {
        magic: tokens[0].0,
        width: tokens[1].0,
        width_offset: tokens[1].1,
        height: tokens[2].0,
        height_offset: tokens[2].1,
        maxval: tokens[3].0,
        maxval_offset: tokens[3].1,
        raster_offset: pos,
    })
}

fn parse_u32(token: &[u8], offset: usize, what: &str) -> FlowvizResult<u32> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| {
            FlowvizError::image_format(
                offset,
                format!(
                    "{what} is not a non-negative integer: '{}'",
                    String::from_utf8_lossy(token)
                ),
            )
        })
}

fn parse_dimension(token: &[u8], offset: usize, what: &str) -> FlowvizResult<u32> {
    let v = parse_u32(token, offset, what)?;
    if v == 0 {
        return Err(FlowvizError::image_format(
            offset,
            format!("{what} must be > 0"),
        ));
    }
    Ok(v)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/raster.rs"]
mod tests;
