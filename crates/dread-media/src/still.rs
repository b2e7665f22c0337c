//! Locally rendered still frames.

use std::io::Cursor;
use std::path::Path;

use dread_models::Resolution;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

use crate::error::MediaResult;
use crate::fs_utils::write_atomic;

/// Near-black so the zoom and subtitles still read as a deliberate frame.
const BLANK_FRAME_COLOUR: Rgb<u8> = Rgb([12, 10, 14]);

/// Encode a solid frame of `resolution` as PNG.
pub fn blank_frame_png(resolution: Resolution) -> MediaResult<Vec<u8>> {
    let frame = RgbImage::from_pixel(resolution.width, resolution.height, BLANK_FRAME_COLOUR);
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(frame).write_to(&mut bytes, ImageOutputFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Write a solid PNG frame to `path`.
pub async fn write_blank_frame(path: impl AsRef<Path>, resolution: Resolution) -> MediaResult<()> {
    let bytes = blank_frame_png(resolution)?;
    write_atomic(path, &bytes).await
}
