//! Convenience helpers for loading images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::Image;
use crate::load_type::LoadType;
use crate::util::{CostError, CostResult};
use std::path::Path;

/// Creates an image from a grayscale image buffer.
pub fn image_from_gray(img: &image::GrayImage) -> CostResult<Image> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    Image::from_gray(img.as_raw().clone(), width, height)
}

/// Creates an image from an RGB image buffer, keeping the color plane.
pub fn image_from_rgb(img: &image::RgbImage) -> CostResult<Image> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    Image::from_rgb(img.as_raw().clone(), width, height)
}

/// Loads an image from disk and prepares the representations in `load`.
///
/// Color is decoded only when `load` asks for it.
pub fn load_image<P: AsRef<Path>>(path: P, load: LoadType) -> CostResult<Image> {
    let img = image::open(path).map_err(|err| CostError::ImageIo {
        reason: err.to_string(),
    })?;
    let mut out = if load.contains(crate::Representation::Color) {
        image_from_rgb(&img.to_rgb8())?
    } else {
        image_from_gray(&img.to_luma8())?
    };
    out.prepare(load);
    Ok(out)
}
