//! Cropping a full frame down to a selection.

use image::GenericImageView;

use crate::error::{Result, SnipError};
use crate::frame::{Artifact, FullFrame};
use crate::geometry::SelectionRect;

/// Crops `frame` to `selection` and re-encodes the region as PNG.
///
/// The selection is in viewport pixels while the frame is at device
/// resolution, so both corners are scaled by `device_pixel_ratio` (clamped
/// to at least 1.0), rounded, then clamped to the frame bounds. Pixels are
/// copied as-is, nothing is resampled.
///
/// # Errors
///
/// - [`SnipError::Decode`] when the frame bytes are not a valid image
/// - [`SnipError::Crop`] when no pixels remain after clamping
pub fn crop_frame(
    frame: &FullFrame,
    selection: &SelectionRect,
    device_pixel_ratio: f64,
) -> Result<Artifact> {
    let img = image::load_from_memory(&frame.png)
        .map_err(|e| SnipError::decode(format!("full frame for {} did not decode: {e}", frame.tab)))?;
    let (img_width, img_height) = img.dimensions();

    let scale = device_pixel_ratio.max(1.0);
    let left = (selection.x as f64 * scale).round();
    let top = (selection.y as f64 * scale).round();
    let right = ((selection.x as f64 + selection.width as f64) * scale).round();
    let bottom = ((selection.y as f64 + selection.height as f64) * scale).round();

    let x = left.min(img_width as f64) as u32;
    let y = top.min(img_height as f64) as u32;
    let x2 = right.min(img_width as f64) as u32;
    let y2 = bottom.min(img_height as f64) as u32;

    if x2 <= x || y2 <= y {
        return Err(SnipError::crop(format!(
            "selection {selection} at scale {scale} leaves nothing of the {img_width}x{img_height} frame"
        )));
    }

    let region = img.crop_imm(x, y, x2 - x, y2 - y);
    let mut png = Vec::new();
    region.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;

    Ok(Artifact::new(png, x2 - x, y2 - y))
}
